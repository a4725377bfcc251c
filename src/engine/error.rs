// Engine Errors
use std::time::Duration;

use thiserror::Error;

/// Errors raised by the partition planner, the multiplier and the verifier.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Worker count is zero or larger than the vector length.
    #[error("invalid partition config: {worker_count} workers for length {length}")]
    InvalidPartitionConfig { length: usize, worker_count: usize },

    /// Accumulator and multiplier differ in length.
    #[error("length mismatch: accumulator has {accumulator} elements, multiplier has {multiplier}")]
    LengthMismatch { accumulator: usize, multiplier: usize },

    /// Post-condition check failed for one or more indices.
    #[error("verification failed: {mismatches} of {checked} elements wrong (first offending indices: {offending:?})")]
    VerificationFailure {
        mismatches: usize,
        checked: usize,
        offending: Vec<usize>,
    },

    /// A worker panicked while multiplying its partition.
    #[error("worker {worker} failed: {message}")]
    WorkerFault { worker: usize, message: String },

    /// A worker dropped its completion signal without reporting.
    #[error("worker {worker} exited without signalling completion")]
    WorkerLost { worker: usize },

    /// The background dispatch job ended without handing the buffers back.
    #[error("dispatch job exited before returning its buffers")]
    DispatchLost,

    #[error("workers did not complete within {deadline:?}")]
    DeadlineExceeded { deadline: Duration },

    /// An ndarray view is not laid out contiguously.
    #[error("{operand} array is not contiguous")]
    NonContiguous { operand: &'static str },

    #[error("failed to build worker pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),
}

impl EngineError {
    pub fn invalid_partition(length: usize, worker_count: usize) -> Self {
        Self::InvalidPartitionConfig {
            length,
            worker_count,
        }
    }

    pub fn length_mismatch(accumulator: usize, multiplier: usize) -> Self {
        Self::LengthMismatch {
            accumulator,
            multiplier,
        }
    }

    /// True for errors caused by caller input rather than by execution.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::InvalidPartitionConfig { .. }
                | Self::LengthMismatch { .. }
                | Self::NonContiguous { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
