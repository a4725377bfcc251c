//! Runs one multiply-and-verify scenario.
//!
//! ```bash
//! pvmult --length 1000000 --workers 1000 --remainder truncate
//! ```

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use pvmult::engine::config::{
    DEFAULT_ACCUMULATOR_VALUE, DEFAULT_LENGTH, DEFAULT_MULTIPLIER_VALUE, DEFAULT_WORKER_COUNT,
};
use pvmult::{run_scenario, run_scenario_with_deadline, RemainderPolicy, ScenarioConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Remainder {
    /// Leave the trailing `length % workers` elements untouched.
    Truncate,
    /// Let the last worker take the trailing elements.
    Absorb,
}

impl From<Remainder> for RemainderPolicy {
    fn from(value: Remainder) -> Self {
        match value {
            Remainder::Truncate => RemainderPolicy::Truncate,
            Remainder::Absorb => RemainderPolicy::AbsorbIntoLast,
        }
    }
}

/// Parallel strided vector multiply.
#[derive(Parser, Debug)]
#[command(name = "pvmult")]
#[command(about = "Multiply two constant vectors in parallel and verify the product")]
struct Args {
    /// Vector length.
    #[arg(long, default_value_t = DEFAULT_LENGTH)]
    length: usize,

    /// Number of partitions, one worker task each.
    #[arg(long, default_value_t = DEFAULT_WORKER_COUNT)]
    workers: usize,

    /// Pool threads (defaults to available parallelism).
    #[arg(long)]
    threads: Option<usize>,

    /// Value every accumulator element starts at.
    #[arg(long, default_value_t = DEFAULT_ACCUMULATOR_VALUE, allow_negative_numbers = true)]
    accumulator: i64,

    /// Value every multiplier element starts at.
    #[arg(long, default_value_t = DEFAULT_MULTIPLIER_VALUE, allow_negative_numbers = true)]
    multiplier: i64,

    /// Remainder policy when length is not divisible by workers.
    #[arg(long, value_enum, default_value_t = Remainder::Absorb)]
    remainder: Remainder,

    /// Bound the wait for workers, in milliseconds.
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// Verbose output.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn scenario(&self) -> ScenarioConfig {
        ScenarioConfig {
            length: self.length,
            worker_count: self.workers,
            threads: self.threads,
            accumulator_value: self.accumulator,
            multiplier_value: self.multiplier,
            remainder: self.remainder.into(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = args.scenario();
    let outcome = match args.deadline_ms {
        Some(ms) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()?;
            runtime.block_on(run_scenario_with_deadline(
                &config,
                Duration::from_millis(ms),
            ))?
        }
        None => run_scenario(&config)?,
    };

    println!(
        "DONE! {} elements verified across {} workers (stride {}) in {:?}",
        outcome.verification.checked,
        outcome.multiply.workers_completed,
        outcome.multiply.stride,
        outcome.elapsed
    );
    Ok(())
}
