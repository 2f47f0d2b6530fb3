use super::types::{Observation, SimulationConfig, StrategyVariant, Trial};

/// Folds `strategy` over one realised return sequence.
///
/// The resulting trial has `returns.len() + 1` observations, month 0 first.
pub fn run_trial(config: &SimulationConfig, strategy: StrategyVariant, returns: &[f64]) -> Trial {
    let mut state = strategy.initial_state(config);
    let mut observations = Vec::with_capacity(returns.len() + 1);
    observations.push(Observation {
        month: 0,
        value: state.value,
        contribution: state.contribution,
    });

    for (month, &r) in (1_u32..).zip(returns) {
        state = strategy.step(state, config.monthly_contribution, r);
        observations.push(Observation {
            month,
            value: state.value,
            contribution: state.contribution,
        });
    }

    Trial { observations }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn flat_config(strategy: StrategyVariant) -> SimulationConfig {
        SimulationConfig {
            principal: 100_000.0,
            current_return_pct: 0.0,
            monthly_contribution: 0.0,
            horizon_months: 12,
            bear_months: 0,
            normal_mean_annual: 0.0,
            normal_vol_annual: 0.0,
            bear_mean_annual: 0.0,
            bear_vol_annual: 0.0,
            trial_count: 1,
            strategy,
            seed: Some(1),
        }
    }

    #[test]
    fn flat_market_keeps_value_constant() {
        let cfg = flat_config(StrategyVariant::StopContributing);
        let trial = run_trial(&cfg, cfg.strategy, &[0.0; 12]);

        assert_eq!(trial.observations.len(), 13);
        for (idx, obs) in trial.observations.iter().enumerate() {
            assert_eq!(obs.month as usize, idx);
            assert_eq!(obs.value, 100_000.0);
            assert_eq!(obs.contribution, 100_000.0);
        }
        assert_eq!(trial.final_value(), 100_000.0);
    }

    #[test]
    fn take_profit_month_zero_is_cost_basis() {
        let mut cfg = flat_config(StrategyVariant::TakeProfitHold);
        cfg.current_return_pct = 50.0;
        let trial = run_trial(&cfg, cfg.strategy, &[0.0; 12]);

        assert_eq!(trial.observations[0].value, 100_000.0);
        assert_eq!(trial.final_value(), 100_000.0);

        let held = run_trial(&cfg, StrategyVariant::StopContributing, &[0.0; 12]);
        assert_eq!(held.observations[0].value, 150_000.0);
    }

    #[test]
    fn empty_horizon_yields_single_observation() {
        let cfg = flat_config(StrategyVariant::ContinueContributing);
        let trial = run_trial(&cfg, cfg.strategy, &[]);
        assert_eq!(trial.observations.len(), 1);
        assert_eq!(trial.final_contribution(), 100_000.0);
    }

    #[test]
    fn contributions_compound_with_returns() {
        let mut cfg = flat_config(StrategyVariant::ContinueContributing);
        cfg.principal = 1_000.0;
        cfg.monthly_contribution = 100.0;
        let trial = run_trial(&cfg, cfg.strategy, &[0.1, -0.5]);

        assert!((trial.observations[1].value - 1_210.0).abs() < 1e-9);
        assert!((trial.observations[2].value - 655.0).abs() < 1e-9);
        assert_eq!(trial.final_contribution(), 1_200.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_contribution_trajectory_matches_variant(
            principal in 1u32..1_000_000,
            monthly in 0u32..20_000,
            returns in proptest::collection::vec(-0.3f64..0.3, 0..60)
        ) {
            let mut cfg = flat_config(StrategyVariant::ContinueContributing);
            cfg.principal = principal as f64;
            cfg.monthly_contribution = monthly as f64;

            for variant in StrategyVariant::ALL {
                let trial = run_trial(&cfg, variant, &returns);
                prop_assert_eq!(trial.observations.len(), returns.len() + 1);

                for obs in &trial.observations {
                    let expected = if variant.contributes() {
                        cfg.principal + obs.month as f64 * cfg.monthly_contribution
                    } else {
                        cfg.principal
                    };
                    prop_assert_eq!(obs.contribution, expected);
                }

                for pair in trial.observations.windows(2) {
                    prop_assert!(pair[1].contribution >= pair[0].contribution);
                }
            }
        }
    }
}
