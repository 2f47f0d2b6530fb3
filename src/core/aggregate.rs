use super::types::{
    HISTOGRAM_BINS, Histogram, HistogramBin, PERCENTILE_LEVELS, PercentileSummary,
    SAMPLE_PATH_LIMIT, SimulationResult, StrategyVariant, Trial,
};

/// Final numbers of one trial, plus its full path when it is among the
/// first `SAMPLE_PATH_LIMIT` trials.
#[derive(Debug, Clone)]
pub struct TrialOutcome {
    pub final_value: f64,
    pub final_contribution: f64,
    pub path: Option<Trial>,
}

impl TrialOutcome {
    pub fn from_trial(trial: Trial, trial_index: u32) -> Self {
        let final_value = trial.final_value();
        let final_contribution = trial.final_contribution();
        let keep_path = (trial_index as usize) < SAMPLE_PATH_LIMIT;
        Self {
            final_value,
            final_contribution,
            path: keep_path.then_some(trial),
        }
    }
}

/// Linear interpolation between order statistics. `sorted` must be ascending.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }

    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let rank = (p / 100.0).clamp(0.0, 1.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        sorted[lower]
    } else {
        let w = rank - lower as f64;
        (sorted[lower] + (sorted[upper] - sorted[lower]) * w).min(sorted[upper])
    }
}

pub fn summarize_percentiles(final_values: &[f64]) -> PercentileSummary {
    let sorted = sorted_copy(final_values);
    let [p10, p25, p50, p75, p90] = PERCENTILE_LEVELS.map(|level| percentile(&sorted, level));
    PercentileSummary {
        p10,
        p25,
        p50,
        p75,
        p90,
    }
}

pub fn median(final_values: &[f64]) -> f64 {
    percentile(&sorted_copy(final_values), 50.0)
}

/// Equal-width histogram over `[min, max]`. A degenerate range collapses
/// into a single bin holding every value.
pub fn histogram(values: &[f64], bins: usize) -> Histogram {
    if values.is_empty() || bins == 0 {
        return Histogram { bins: Vec::new() };
    }

    let (min, max) = min_max(values);
    if max <= min {
        return Histogram {
            bins: vec![HistogramBin {
                lower: min,
                upper: max,
                count: values.len() as u32,
            }],
        };
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0_u32; bins];
    for &v in values {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Histogram {
        bins: counts
            .into_iter()
            .enumerate()
            .map(|(idx, count)| HistogramBin {
                lower: min + width * idx as f64,
                upper: if idx + 1 == bins {
                    max
                } else {
                    min + width * (idx + 1) as f64
                },
                count,
            })
            .collect(),
    }
}

/// Builds the caller-facing summary. `outcomes` must be in trial-index order.
pub fn build_result(
    strategy: StrategyVariant,
    seed: u64,
    horizon_months: u32,
    outcomes: Vec<TrialOutcome>,
) -> SimulationResult {
    let trial_count = outcomes.len() as u32;
    // Contribution does not depend on returns, so any trial serves as the baseline.
    let final_contribution_reference = outcomes.last().map_or(0.0, |o| o.final_contribution);

    let mut final_values = Vec::with_capacity(outcomes.len());
    let mut sample_paths = Vec::with_capacity(SAMPLE_PATH_LIMIT.min(outcomes.len()));
    for outcome in outcomes {
        final_values.push(outcome.final_value);
        if let Some(path) = outcome.path {
            sample_paths.push(path);
        }
    }

    let percentiles = summarize_percentiles(&final_values);
    let (min, max) = min_max(&final_values);
    let mean = if final_values.is_empty() {
        0.0
    } else {
        final_values.iter().sum::<f64>() / final_values.len() as f64
    };
    let shortfall_probability = if final_values.is_empty() {
        0.0
    } else {
        final_values
            .iter()
            .filter(|&&v| v < final_contribution_reference)
            .count() as f64
            / final_values.len() as f64
    };

    SimulationResult {
        strategy,
        seed,
        trial_count,
        horizon_months,
        median: percentiles.p50,
        percentiles,
        mean,
        min,
        max,
        final_contribution_reference,
        shortfall_probability,
        histogram: histogram(&final_values, HISTOGRAM_BINS),
        sample_paths,
        final_values,
    }
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

fn min_max(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Observation;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn outcome(final_value: f64, final_contribution: f64) -> TrialOutcome {
        TrialOutcome {
            final_value,
            final_contribution,
            path: None,
        }
    }

    #[test]
    fn percentile_interpolates_between_order_statistics() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_approx(percentile(&sorted, 0.0), 1.0);
        assert_approx(percentile(&sorted, 10.0), 1.4);
        assert_approx(percentile(&sorted, 25.0), 2.0);
        assert_approx(percentile(&sorted, 50.0), 3.0);
        assert_approx(percentile(&sorted, 90.0), 4.6);
        assert_approx(percentile(&sorted, 100.0), 5.0);
    }

    #[test]
    fn single_value_degenerates_every_percentile() {
        let summary = summarize_percentiles(&[123.5]);
        for (_, value) in summary.levels() {
            assert_eq!(value, 123.5);
        }
        assert_eq!(median(&[123.5]), 123.5);
    }

    #[test]
    fn summary_ignores_input_order() {
        let summary = summarize_percentiles(&[40.0, 10.0, 30.0, 20.0]);
        assert_approx(summary.p10, 13.0);
        assert_approx(summary.p50, 25.0);
        assert_approx(summary.p90, 37.0);
    }

    #[test]
    fn histogram_counts_every_value_once() {
        let values: Vec<f64> = (0..100).map(f64::from).collect();
        let hist = histogram(&values, 30);
        assert_eq!(hist.bins.len(), 30);
        assert_eq!(hist.bins.iter().map(|b| b.count).sum::<u32>(), 100);
        assert_eq!(hist.bins[0].lower, 0.0);
        assert_eq!(hist.bins[29].upper, 99.0);
    }

    #[test]
    fn histogram_collapses_constant_values() {
        let hist = histogram(&[5.0; 7], 30);
        assert_eq!(hist.bins.len(), 1);
        assert_eq!(hist.bins[0].count, 7);
    }

    #[test]
    fn build_result_uses_last_trial_contribution_and_keeps_leading_paths() {
        let path = Trial {
            observations: vec![Observation {
                month: 0,
                value: 1.0,
                contribution: 1.0,
            }],
        };
        let mut outcomes: Vec<TrialOutcome> = (0..25)
            .map(|i| TrialOutcome::from_trial(path.clone(), i))
            .collect();
        outcomes.push(outcome(3.0, 9.0));

        let result = build_result(StrategyVariant::StopContributing, 1, 0, outcomes);
        assert_eq!(result.trial_count, 26);
        assert_eq!(result.final_values.len(), 26);
        assert_eq!(result.sample_paths.len(), SAMPLE_PATH_LIMIT);
        assert_eq!(result.final_contribution_reference, 9.0);
        assert_approx(result.shortfall_probability, 1.0);
        assert_eq!(result.min, 1.0);
        assert_eq!(result.max, 3.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_percentiles_are_non_decreasing(
            values in proptest::collection::vec(-1e9f64..1e9, 1..200)
        ) {
            let summary = summarize_percentiles(&values);
            let levels = summary.levels();
            for pair in levels.windows(2) {
                prop_assert!(pair[0].1 <= pair[1].1);
            }

            let (lo, hi) = min_max(&values);
            prop_assert!(summary.p10 >= lo && summary.p90 <= hi);
            prop_assert_eq!(median(&values), summary.p50);
        }
    }
}
