// Configuration
use crate::engine::partition::RemainderPolicy;

pub const DEFAULT_LENGTH: usize = 1_000_000;
pub const DEFAULT_WORKER_COUNT: usize = 1_000;
pub const DEFAULT_ACCUMULATOR_VALUE: i64 = 6;
pub const DEFAULT_MULTIPLIER_VALUE: i64 = 4;

/// Settings for one `ParallelMultiplier`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiplierConfig {
    /// Number of partitions, one task each.
    pub worker_count: usize,
    /// Pool threads; `None` uses the available parallelism.
    pub threads: Option<usize>,
    pub remainder: RemainderPolicy,
}

impl MultiplierConfig {
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count,
            ..Self::default()
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_remainder(mut self, remainder: RemainderPolicy) -> Self {
        self.remainder = remainder;
        self
    }

    /// Threads the pool is built with: never zero, never more than there are tasks.
    pub fn pool_threads(&self) -> usize {
        let requested = self.threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        });
        requested.clamp(1, self.worker_count.max(1))
    }
}

impl Default for MultiplierConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            threads: None,
            remainder: RemainderPolicy::default(),
        }
    }
}

/// The demonstration run: two constant vectors multiplied and checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioConfig {
    pub length: usize,
    pub worker_count: usize,
    pub threads: Option<usize>,
    pub accumulator_value: i64,
    pub multiplier_value: i64,
    pub remainder: RemainderPolicy,
}

impl ScenarioConfig {
    pub fn multiplier_config(&self) -> MultiplierConfig {
        MultiplierConfig {
            worker_count: self.worker_count,
            threads: self.threads,
            remainder: self.remainder,
        }
    }

    pub fn expected_product(&self) -> i64 {
        self.accumulator_value * self.multiplier_value
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            worker_count: DEFAULT_WORKER_COUNT,
            threads: None,
            accumulator_value: DEFAULT_ACCUMULATOR_VALUE,
            multiplier_value: DEFAULT_MULTIPLIER_VALUE,
            remainder: RemainderPolicy::default(),
        }
    }
}
