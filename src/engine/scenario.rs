// Scenario Runner
// Allocate, initialize, multiply, verify
use std::time::{Duration, Instant};

use ndarray::Array1;
use tracing::info;

use crate::engine::config::ScenarioConfig;
use crate::engine::error::{EngineError, Result};
use crate::engine::kernels::add_scalar_in_place;
use crate::engine::multiplier::{MultiplyReport, ParallelMultiplier};
use crate::engine::verify::{verify_uniform, VerificationReport};

#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub multiply: MultiplyReport,
    pub verification: VerificationReport,
    pub elapsed: Duration,
}

/// Builds the two operand vectors for `config`.
fn operands(config: &ScenarioConfig) -> (Vec<i64>, Vec<i64>) {
    let mut accumulator = vec![0i64; config.length];
    let mut multiplier = vec![0i64; config.length];
    add_scalar_in_place(&mut accumulator, config.accumulator_value);
    add_scalar_in_place(&mut multiplier, config.multiplier_value);
    (accumulator, multiplier)
}

/// Runs the scenario to completion. A failed check is returned as
/// `VerificationFailure`.
pub fn run_scenario(config: &ScenarioConfig) -> Result<ScenarioOutcome> {
    let engine = ParallelMultiplier::new(config.multiplier_config())?;
    let (accumulator, multiplier) = operands(config);
    let mut accumulator = Array1::from_vec(accumulator);
    let multiplier = Array1::from_vec(multiplier);

    let started = Instant::now();
    let multiply = engine.multiply_arrays(accumulator.view_mut(), multiplier.view())?;
    let elapsed = started.elapsed();

    let values = accumulator.as_slice().ok_or(EngineError::NonContiguous {
        operand: "accumulator",
    })?;
    finish(config, values, multiply, elapsed)
}

/// Same as `run_scenario`, with the wait for workers bounded by `deadline`.
pub async fn run_scenario_with_deadline(
    config: &ScenarioConfig,
    deadline: Duration,
) -> Result<ScenarioOutcome> {
    let engine = ParallelMultiplier::new(config.multiplier_config())?;
    let (accumulator, multiplier) = operands(config);

    let started = Instant::now();
    let (accumulator, _, multiply) = engine
        .multiply_owned(accumulator, multiplier, deadline)
        .await?;
    let elapsed = started.elapsed();

    finish(config, &accumulator, multiply, elapsed)
}

fn finish(
    config: &ScenarioConfig,
    values: &[i64],
    multiply: MultiplyReport,
    elapsed: Duration,
) -> Result<ScenarioOutcome> {
    let verification = verify_uniform(values, config.expected_product());
    info!(
        length = config.length,
        workers = multiply.workers_completed,
        mismatches = verification.mismatches,
        ?elapsed,
        "scenario finished"
    );
    verification.clone().into_result()?;

    Ok(ScenarioOutcome {
        multiply,
        verification,
        elapsed,
    })
}
