// Parallel Strided Multiplier
// Fan-out one task per partition onto a rayon pool, fan-in one signal per task
use std::any::Any;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use ndarray::{ArrayView1, ArrayViewMut1};
use rayon::{ThreadPool, ThreadPoolBuilder};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::engine::config::MultiplierConfig;
use crate::engine::error::{EngineError, Result};
use crate::engine::kernels::{multiply_slice, Element};
use crate::engine::partition::PartitionPlan;

/// Elements processed, or the panic message of a failed worker.
type WorkerOutcome = std::result::Result<usize, String>;

/// Summary of one completed multiply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiplyReport {
    pub worker_count: usize,
    pub stride: usize,
    pub covered: usize,
    /// Indices left untouched; empty unless a remainder was truncated.
    pub uncovered: Range<usize>,
    pub workers_completed: usize,
}

impl MultiplyReport {
    fn new(plan: &PartitionPlan, workers_completed: usize) -> Self {
        Self {
            worker_count: plan.worker_count(),
            stride: plan.stride(),
            covered: plan.covered(),
            uncovered: plan.uncovered(),
            workers_completed,
        }
    }
}

/// Owns a bounded worker pool and multiplies vectors in place with it.
///
/// The pool is reused across calls; partitions and completion signals are
/// created per call.
pub struct ParallelMultiplier {
    config: MultiplierConfig,
    pool: Arc<ThreadPool>,
}

impl ParallelMultiplier {
    pub fn new(config: MultiplierConfig) -> Result<Self> {
        let threads = config.pool_threads();
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("pvmult-worker-{i}"))
            .build()?;

        debug!(threads, worker_count = config.worker_count, "worker pool ready");

        Ok(Self {
            config,
            pool: Arc::new(pool),
        })
    }

    pub fn config(&self) -> &MultiplierConfig {
        &self.config
    }

    /// Plan for a vector of `length`, without running anything.
    pub fn plan(&self, length: usize) -> Result<PartitionPlan> {
        PartitionPlan::new(length, self.config.worker_count, self.config.remainder)
    }

    /// Preconditions are checked before anything is dispatched.
    fn prepare(&self, accumulator: usize, multiplier: usize) -> Result<PartitionPlan> {
        if accumulator != multiplier {
            return Err(EngineError::length_mismatch(accumulator, multiplier));
        }
        self.plan(accumulator)
    }

    /// Replaces every covered `accumulator[i]` with `accumulator[i] * multiplier[i]`.
    ///
    /// Blocks until every worker has signalled. The first worker failure is
    /// returned as an error; other partitions may already hold their product
    /// by then.
    pub fn multiply_in_place<T: Element>(
        &self,
        accumulator: &mut [T],
        multiplier: &[T],
    ) -> Result<MultiplyReport> {
        let plan = self.prepare(accumulator.len(), multiplier.len())?;
        let (signals, receivers) = completion_channels(plan.worker_count());

        fan_out(&self.pool, &plan, accumulator, multiplier, signals);

        // The scope has joined every task, so no receive below can block.
        let mut completed = 0;
        for (worker, mut receiver) in receivers.into_iter().enumerate() {
            let outcome = receiver
                .try_recv()
                .map_err(|_| EngineError::WorkerLost { worker })?;
            check_outcome(worker, outcome)?;
            completed += 1;
        }

        Ok(MultiplyReport::new(&plan, completed))
    }

    /// `multiply_in_place` over ndarray views. Both views must be contiguous.
    pub fn multiply_arrays<T: Element>(
        &self,
        mut accumulator: ArrayViewMut1<'_, T>,
        multiplier: ArrayView1<'_, T>,
    ) -> Result<MultiplyReport> {
        if accumulator.len() != multiplier.len() {
            return Err(EngineError::length_mismatch(
                accumulator.len(),
                multiplier.len(),
            ));
        }
        let multiplier = multiplier.to_slice().ok_or(EngineError::NonContiguous {
            operand: "multiplier",
        })?;
        let accumulator = accumulator
            .as_slice_mut()
            .ok_or(EngineError::NonContiguous {
                operand: "accumulator",
            })?;

        self.multiply_in_place(accumulator, multiplier)
    }

    /// Owned-buffer variant whose wait is bounded by `deadline`.
    ///
    /// The multiply runs as a background pool job. On timeout the job keeps
    /// running to completion and then drops the buffers.
    pub async fn multiply_owned<T: Element + 'static>(
        &self,
        mut accumulator: Vec<T>,
        multiplier: Vec<T>,
        deadline: Duration,
    ) -> Result<(Vec<T>, Vec<T>, MultiplyReport)> {
        let plan = self.prepare(accumulator.len(), multiplier.len())?;
        let (signals, receivers) = completion_channels(plan.worker_count());
        let (buffers_tx, buffers_rx) = oneshot::channel();

        let pool = Arc::clone(&self.pool);
        let job_plan = plan.clone();
        self.pool.spawn(move || {
            fan_out(&pool, &job_plan, &mut accumulator, &multiplier, signals);
            let _ = buffers_tx.send((accumulator, multiplier));
        });

        let fan_in = async move {
            // Signals are taken in completion order so the first fault wins.
            let mut pending: FuturesUnordered<_> = receivers
                .into_iter()
                .enumerate()
                .map(|(worker, receiver)| async move { (worker, receiver.await) })
                .collect();

            let mut completed = 0;
            while let Some((worker, outcome)) = pending.next().await {
                let outcome = outcome.map_err(|_| EngineError::WorkerLost { worker })?;
                check_outcome(worker, outcome)?;
                completed += 1;
            }
            let (accumulator, multiplier) =
                buffers_rx.await.map_err(|_| EngineError::DispatchLost)?;
            Ok::<_, EngineError>((accumulator, multiplier, MultiplyReport::new(&plan, completed)))
        };

        match tokio::time::timeout(deadline, fan_in).await {
            Ok(result) => result,
            Err(_) => {
                warn!(?deadline, "multiply did not finish before the deadline");
                Err(EngineError::DeadlineExceeded { deadline })
            }
        }
    }
}

/// Multiplies with a default-configured pool of `worker_count` partitions.
///
/// Builds and tears down a fresh thread pool on every call. Callers that
/// multiply repeatedly should keep a `ParallelMultiplier` instead.
pub fn multiply_in_place<T: Element>(
    accumulator: &mut [T],
    multiplier: &[T],
    worker_count: usize,
) -> Result<MultiplyReport> {
    ParallelMultiplier::new(MultiplierConfig::new(worker_count))?
        .multiply_in_place(accumulator, multiplier)
}

fn completion_channels(
    workers: usize,
) -> (
    Vec<oneshot::Sender<WorkerOutcome>>,
    Vec<oneshot::Receiver<WorkerOutcome>>,
) {
    (0..workers).map(|_| oneshot::channel()).unzip()
}

/// Spawns one task per partition and returns once all of them have finished.
fn fan_out<T: Element>(
    pool: &ThreadPool,
    plan: &PartitionPlan,
    accumulator: &mut [T],
    multiplier: &[T],
    signals: Vec<oneshot::Sender<WorkerOutcome>>,
) {
    debug!(
        workers = plan.worker_count(),
        stride = plan.stride(),
        "dispatching partitions"
    );

    pool.scope(|scope| {
        // Successive split_at_mut hands each task a disjoint sub-slice.
        let mut rest = accumulator;
        let mut offset = 0;
        for (partition, signal) in plan.partitions().iter().copied().zip(signals) {
            debug_assert_eq!(partition.low, offset);
            let taken = std::mem::take(&mut rest);
            let (chunk, tail) = taken.split_at_mut(partition.len());
            rest = tail;
            offset = partition.high;

            let factors = &multiplier[partition.range()];
            scope.spawn(move |_| {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    multiply_slice(chunk, factors)
                }))
                .map(|()| partition.len())
                .map_err(panic_message);
                // A closed receiver means the coordinator stopped waiting.
                let _ = signal.send(outcome);
            });
        }
    });
}

fn check_outcome(worker: usize, outcome: WorkerOutcome) -> Result<()> {
    outcome.map(|_| ()).map_err(|message| {
        warn!(worker, %message, "worker fault");
        EngineError::WorkerFault { worker, message }
    })
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::partition::RemainderPolicy;
    use ndarray::{s, Array1};

    fn multiplier(workers: usize, remainder: RemainderPolicy) -> ParallelMultiplier {
        ParallelMultiplier::new(
            MultiplierConfig::new(workers)
                .with_threads(2)
                .with_remainder(remainder),
        )
        .unwrap()
    }

    #[test]
    fn test_twelve_by_three() {
        let mut acc = vec![6i64; 12];
        let mult = vec![4i64; 12];
        let report = multiply_in_place(&mut acc, &mult, 3).unwrap();
        assert!(acc.iter().all(|&v| v == 24));
        assert_eq!(report.stride, 4);
        assert_eq!(report.workers_completed, 3);
        assert!(report.uncovered.is_empty());
    }

    #[test]
    fn test_remainder_truncated() {
        let mut acc: Vec<i64> = (1..=10).collect();
        let mult = vec![10i64; 10];
        let report = multiplier(3, RemainderPolicy::Truncate)
            .multiply_in_place(&mut acc, &mult)
            .unwrap();
        assert_eq!(report.stride, 3);
        assert_eq!(report.uncovered, 9..10);
        assert_eq!(&acc[..9], &[10, 20, 30, 40, 50, 60, 70, 80, 90]);
        assert_eq!(acc[9], 10);
    }

    #[test]
    fn test_remainder_absorbed() {
        let mut acc: Vec<i64> = (1..=10).collect();
        let mult = vec![10i64; 10];
        let report = multiplier(3, RemainderPolicy::AbsorbIntoLast)
            .multiply_in_place(&mut acc, &mult)
            .unwrap();
        assert_eq!(report.covered, 10);
        assert_eq!(acc[9], 100);
    }

    #[test]
    fn test_preconditions_fail_before_dispatch() {
        let engine = multiplier(4, RemainderPolicy::default());

        let mut acc = vec![1i64; 3];
        let err = engine.multiply_in_place(&mut acc, &[2, 2, 2]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidPartitionConfig { length: 3, worker_count: 4 }));
        assert_eq!(acc, vec![1, 1, 1]);

        let mut acc = vec![1i64; 8];
        let err = engine.multiply_in_place(&mut acc, &[2; 7]).unwrap_err();
        assert!(matches!(err, EngineError::LengthMismatch { accumulator: 8, multiplier: 7 }));
        assert_eq!(acc, vec![1; 8]);

        let err = multiply_in_place(&mut acc, &[2; 8], 0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidPartitionConfig { worker_count: 0, .. }));
    }

    #[test]
    fn test_pool_reused_across_calls() {
        let engine = multiplier(2, RemainderPolicy::default());
        let mut acc = vec![1i64; 6];
        let mult = vec![3i64; 6];
        engine.multiply_in_place(&mut acc, &mult).unwrap();
        engine.multiply_in_place(&mut acc, &mult).unwrap();
        assert_eq!(acc, vec![9; 6]);
    }

    #[test]
    fn test_multiply_arrays() {
        let engine = multiplier(2, RemainderPolicy::default());
        let mut acc = Array1::from_elem(6, 5i64);
        let mult = Array1::from_elem(6, 7i64);
        engine.multiply_arrays(acc.view_mut(), mult.view()).unwrap();
        assert!(acc.iter().all(|&v| v == 35));
    }

    #[test]
    fn test_multiply_arrays_rejects_strided_view() {
        let engine = multiplier(2, RemainderPolicy::default());
        let mut acc = Array1::from_elem(8, 1i64);
        let mult = Array1::from_elem(4, 2i64);
        let err = engine
            .multiply_arrays(acc.slice_mut(s![..;2]), mult.view())
            .unwrap_err();
        assert!(matches!(err, EngineError::NonContiguous { operand: "accumulator" }));
    }

    #[test]
    fn test_panic_message_extraction() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new(String::from("bang"))), "bang");
        assert_eq!(panic_message(Box::new(7u8)), "worker panicked");
    }

    #[tokio::test]
    async fn test_multiply_owned() {
        let engine = multiplier(3, RemainderPolicy::default());
        let (acc, mult, report) = engine
            .multiply_owned(vec![6i64; 12], vec![4i64; 12], Duration::from_secs(10))
            .await
            .unwrap();
        assert!(acc.iter().all(|&v| v == 24));
        assert_eq!(mult, vec![4; 12]);
        assert_eq!(report.workers_completed, 3);
    }

    #[tokio::test]
    async fn test_multiply_owned_validates_first() {
        let engine = multiplier(3, RemainderPolicy::default());
        let err = engine
            .multiply_owned(vec![1i64; 2], vec![1i64; 2], Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(err.is_precondition());
    }
}
