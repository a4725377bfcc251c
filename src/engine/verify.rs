// Result Verification
use rayon::prelude::*;

use crate::engine::error::{EngineError, Result};
use crate::engine::kernels::Element;

/// Offending indices kept in a report; the count is always exact.
pub const MAX_REPORTED_INDICES: usize = 16;

/// Outcome of scanning a vector once against its expected values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub checked: usize,
    pub mismatches: usize,
    /// Lowest offending indices, ascending, at most `MAX_REPORTED_INDICES`.
    pub offending: Vec<usize>,
}

impl VerificationReport {
    pub fn is_success(&self) -> bool {
        self.mismatches == 0
    }

    pub fn into_result(self) -> Result<()> {
        if self.is_success() {
            return Ok(());
        }
        Err(EngineError::VerificationFailure {
            mismatches: self.mismatches,
            checked: self.checked,
            offending: self.offending,
        })
    }
}

/// Checks every element equals `expected`.
pub fn verify_uniform<T: Element>(values: &[T], expected: T) -> VerificationReport {
    verify_with(values, |_| expected)
}

/// Checks `values[i] == expected(i)` for every index.
pub fn verify_with<T, F>(values: &[T], expected: F) -> VerificationReport
where
    T: Element,
    F: Fn(usize) -> T + Sync,
{
    let mut offending: Vec<usize> = values
        .par_iter()
        .enumerate()
        .filter(|&(i, value)| *value != expected(i))
        .map(|(i, _)| i)
        .collect();

    // Indexed parallel collect preserves order
    let mismatches = offending.len();
    offending.truncate(MAX_REPORTED_INDICES);

    VerificationReport {
        checked: values.len(),
        mismatches,
        offending,
    }
}
