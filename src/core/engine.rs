use rayon::prelude::*;
use tracing::{debug, info};

use super::aggregate::{TrialOutcome, build_result};
use super::error::Result;
use super::returns::ReturnSequenceGenerator;
use super::trial::run_trial;
use super::types::{SimulationConfig, SimulationResult, StrategyVariant};

/// Runs `config.trial_count` independent trials of `config.strategy`.
///
/// Without a seed, one is drawn up front and reported in the result so the run
/// can be replayed.
pub fn run_simulation(config: &SimulationConfig) -> Result<SimulationResult> {
    config.validate()?;
    let seed = resolve_seed(config);
    simulate_strategy(config, config.strategy, seed)
}

/// Evaluates every strategy in `strategies` against the same random draws.
///
/// The generator is rebuilt from the shared base seed for each strategy, so
/// trial `i` sees the identical return sequence under every policy.
pub fn compare_strategies(
    config: &SimulationConfig,
    strategies: &[StrategyVariant],
) -> Result<Vec<SimulationResult>> {
    config.validate()?;
    let seed = resolve_seed(config);

    info!(
        strategies = strategies.len(),
        trials = config.trial_count,
        seed,
        "comparing strategies"
    );

    strategies
        .iter()
        .map(|&strategy| {
            debug!(strategy = strategy.label(), "evaluating strategy");
            simulate_strategy(config, strategy, seed)
        })
        .collect()
}

fn simulate_strategy(
    config: &SimulationConfig,
    strategy: StrategyVariant,
    seed: u64,
) -> Result<SimulationResult> {
    let generator = ReturnSequenceGenerator::new(config, seed)?;

    info!(
        strategy = strategy.label(),
        trials = config.trial_count,
        horizon_months = config.horizon_months,
        bear_months = config.bear_months,
        seed,
        "starting simulation"
    );

    let outcomes: Vec<TrialOutcome> = (0..config.trial_count)
        .into_par_iter()
        .map_init(
            || Vec::with_capacity(config.horizon_months as usize),
            |returns, trial_index| {
                generator.fill(trial_index, returns);
                TrialOutcome::from_trial(run_trial(config, strategy, returns), trial_index)
            },
        )
        .collect();

    let result = build_result(strategy, seed, config.horizon_months, outcomes);
    info!(
        strategy = strategy.label(),
        median = result.median,
        final_contribution = result.final_contribution_reference,
        "simulation finished"
    );
    Ok(result)
}

fn resolve_seed(config: &SimulationConfig) -> u64 {
    config.seed.unwrap_or_else(rand::random)
}
