// Controller
use numpy::{PyReadonlyArray1, PyReadwriteArray1};
use pyo3::prelude::*;

use crate::engine::config::MultiplierConfig;
use crate::engine::error::EngineError;
use crate::engine::kernels::add_scalar_in_place;
use crate::engine::multiplier::ParallelMultiplier;
use crate::engine::partition::RemainderPolicy;
use crate::engine::verify::verify_uniform;

fn to_py_err(err: EngineError) -> PyErr {
    if err.is_precondition() {
        PyErr::new::<pyo3::exceptions::PyValueError, _>(err.to_string())
    } else {
        PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(err.to_string())
    }
}

/// Python handle on a `ParallelMultiplier` working over int64 numpy arrays.
#[pyclass]
pub struct MultiplierController {
    engine: ParallelMultiplier,
}

#[pymethods]
impl MultiplierController {
    #[new]
    #[pyo3(signature = (worker_count, truncate_remainder = false, threads = None))]
    pub fn new(
        worker_count: usize,
        truncate_remainder: bool,
        threads: Option<usize>,
    ) -> PyResult<Self> {
        let remainder = if truncate_remainder {
            RemainderPolicy::Truncate
        } else {
            RemainderPolicy::AbsorbIntoLast
        };
        let config = MultiplierConfig {
            worker_count,
            threads,
            remainder,
        };
        let engine = ParallelMultiplier::new(config).map_err(to_py_err)?;
        Ok(Self { engine })
    }

    #[getter]
    pub fn worker_count(&self) -> usize {
        self.engine.config().worker_count
    }

    /// Multiplies `accumulator` by `multiplier` in place.
    /// Returns `(stride, covered)`.
    pub fn multiply(
        &self,
        py: Python<'_>,
        mut accumulator: PyReadwriteArray1<'_, i64>,
        multiplier: PyReadonlyArray1<'_, i64>,
    ) -> PyResult<(usize, usize)> {
        let acc = accumulator.as_slice_mut()?;
        let mult = multiplier.as_slice()?;

        // Workers never touch Python objects
        let report = py
            .allow_threads(|| self.engine.multiply_in_place(acc, mult))
            .map_err(to_py_err)?;
        Ok((report.stride, report.covered))
    }

    #[staticmethod]
    pub fn add_scalar(mut vector: PyReadwriteArray1<'_, i64>, value: i64) -> PyResult<()> {
        add_scalar_in_place(vector.as_slice_mut()?, value);
        Ok(())
    }

    /// Returns `(mismatches, first offending indices)`.
    #[staticmethod]
    pub fn verify(
        values: PyReadonlyArray1<'_, i64>,
        expected: i64,
    ) -> PyResult<(usize, Vec<usize>)> {
        let report = verify_uniform(values.as_slice()?, expected);
        Ok((report.mismatches, report.offending))
    }
}
