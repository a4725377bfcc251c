// Partition Planner
use std::ops::Range;

use bitvec::prelude::*;
use tracing::{debug, warn};

use crate::engine::error::{EngineError, Result};

/// What happens to the `length mod worker_count` trailing elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemainderPolicy {
    /// Every partition is exactly `stride` long; the tail is never visited.
    Truncate,
    /// The last partition extends to the end of the vector.
    #[default]
    AbsorbIntoLast,
}

/// Half-open index range `[low, high)` owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub worker: usize,
    pub low: usize,
    pub high: usize,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.high - self.low
    }

    pub fn is_empty(&self) -> bool {
        self.low == self.high
    }

    pub fn range(&self) -> Range<usize> {
        self.low..self.high
    }
}

/// The uniform split of `[0, length)` across a fixed number of workers.
#[derive(Debug, Clone)]
pub struct PartitionPlan {
    length: usize,
    stride: usize,
    policy: RemainderPolicy,
    partitions: Vec<Partition>,
}

impl PartitionPlan {
    /// Rejects `worker_count == 0` and `worker_count > length`, which would
    /// otherwise produce a zero stride.
    pub fn new(length: usize, worker_count: usize, policy: RemainderPolicy) -> Result<Self> {
        if worker_count == 0 || worker_count > length {
            return Err(EngineError::invalid_partition(length, worker_count));
        }

        let stride = length / worker_count;
        let mut partitions: Vec<Partition> = (0..worker_count)
            .map(|worker| Partition {
                worker,
                low: worker * stride,
                high: (worker + 1) * stride,
            })
            .collect();

        let remainder = length % worker_count;
        if remainder != 0 {
            match policy {
                RemainderPolicy::AbsorbIntoLast => {
                    if let Some(last) = partitions.last_mut() {
                        last.high = length;
                    }
                }
                RemainderPolicy::Truncate => {
                    warn!(
                        length,
                        worker_count,
                        remainder,
                        "trailing elements are not covered by any partition"
                    );
                }
            }
        }

        debug!(length, worker_count, stride, ?policy, "partition plan built");

        Ok(Self {
            length,
            stride,
            policy,
            partitions,
        })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn policy(&self) -> RemainderPolicy {
        self.policy
    }

    pub fn worker_count(&self) -> usize {
        self.partitions.len()
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    /// Number of indices assigned to some worker.
    pub fn covered(&self) -> usize {
        self.partitions.last().map_or(0, |p| p.high)
    }

    /// Tail range no worker visits (empty unless truncating a remainder).
    pub fn uncovered(&self) -> Range<usize> {
        self.covered()..self.length
    }

    /// Bitmap of covered indices.
    /// BitVec keeps this at one bit per element even for million-entry vectors.
    pub fn coverage(&self) -> BitVec {
        let mut bits = bitvec![usize, Lsb0; 0; self.length];
        for partition in &self.partitions {
            bits[partition.range()].fill(true);
        }
        bits
    }
}
