//! Element-wise vector multiply split across a fixed number of workers.
//!
//! The accumulator is cut into disjoint contiguous partitions of
//! `length / worker_count` elements, one pool task multiplies each partition
//! in place, and the caller waits for one completion signal per task.

pub mod engine;

pub use engine::config::{MultiplierConfig, ScenarioConfig};
pub use engine::error::{EngineError, Result};
pub use engine::kernels::{add_scalar_in_place, multiply_slice, Element};
pub use engine::multiplier::{multiply_in_place, MultiplyReport, ParallelMultiplier};
pub use engine::partition::{Partition, PartitionPlan, RemainderPolicy};
pub use engine::scenario::{run_scenario, run_scenario_with_deadline, ScenarioOutcome};
pub use engine::verify::{verify_uniform, verify_with, VerificationReport, MAX_REPORTED_INDICES};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module definition
#[cfg(feature = "python")]
#[pymodule]
fn pvmult(_py: Python, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<engine::controller::MultiplierController>()?;
    Ok(())
}
