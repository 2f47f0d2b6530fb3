use serde::{Deserialize, Serialize};

use super::error::{ConfigError, Result};
use super::returns::Regime;

/// Number of leading trials kept as full time series in a result.
pub const SAMPLE_PATH_LIMIT: usize = 20;

/// Percentile levels reported for final values, in ascending order.
pub const PERCENTILE_LEVELS: [f64; 5] = [10.0, 25.0, 50.0, 75.0, 90.0];

/// Number of equal-width buckets in the final value histogram.
pub const HISTOGRAM_BINS: usize = 30;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyVariant {
    #[serde(alias = "Continue Holding and Contributing", alias = "continueContributing")]
    ContinueContributing,
    #[serde(alias = "Stop Contributing, Hold Existing", alias = "stopContributing")]
    StopContributing,
    #[serde(alias = "Take Profit, Keep Principal Only", alias = "takeProfitHold")]
    TakeProfitHold,
    #[serde(alias = "Take Profit and Keep Contributing", alias = "takeProfitContribute")]
    TakeProfitContribute,
}

impl StrategyVariant {
    pub const ALL: [StrategyVariant; 4] = [
        StrategyVariant::ContinueContributing,
        StrategyVariant::StopContributing,
        StrategyVariant::TakeProfitHold,
        StrategyVariant::TakeProfitContribute,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StrategyVariant::ContinueContributing => "Continue Holding and Contributing",
            StrategyVariant::StopContributing => "Stop Contributing, Hold Existing",
            StrategyVariant::TakeProfitHold => "Take Profit, Keep Principal Only",
            StrategyVariant::TakeProfitContribute => "Take Profit and Keep Contributing",
        }
    }
}

/// Fully specified input for one engine invocation.
///
/// Percentages are given as percent values (e.g. `6.0` for 6 %), annualised.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub principal: f64,
    pub current_return_pct: f64,
    pub monthly_contribution: f64,
    pub horizon_months: u32,
    pub bear_months: u32,
    pub normal_mean_annual: f64,
    pub normal_vol_annual: f64,
    pub bear_mean_annual: f64,
    pub bear_vol_annual: f64,
    pub trial_count: u32,
    pub strategy: StrategyVariant,
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            principal: 100_000.0,
            current_return_pct: 70.0,
            monthly_contribution: 3_000.0,
            horizon_months: 120,
            bear_months: 36,
            normal_mean_annual: 6.0,
            normal_vol_annual: 12.0,
            bear_mean_annual: -5.0,
            bear_vol_annual: 18.0,
            trial_count: 500,
            strategy: StrategyVariant::ContinueContributing,
            seed: Some(42),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        let floats = [
            ("principal", self.principal),
            ("current_return_pct", self.current_return_pct),
            ("monthly_contribution", self.monthly_contribution),
            ("normal_mean_annual", self.normal_mean_annual),
            ("normal_vol_annual", self.normal_vol_annual),
            ("bear_mean_annual", self.bear_mean_annual),
            ("bear_vol_annual", self.bear_vol_annual),
        ];
        if let Some(&(field, _)) = floats.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::NonFinite { field });
        }

        if self.principal <= 0.0 {
            return Err(ConfigError::NonPositivePrincipal(self.principal));
        }

        let non_negative = [
            ("current_return_pct", self.current_return_pct),
            ("monthly_contribution", self.monthly_contribution),
            ("normal_vol_annual", self.normal_vol_annual),
            ("bear_vol_annual", self.bear_vol_annual),
        ];
        if let Some(&(field, value)) = non_negative.iter().find(|(_, v)| *v < 0.0) {
            return Err(ConfigError::Negative { field, value });
        }

        if self.bear_months > self.horizon_months {
            return Err(ConfigError::BearExceedsHorizon {
                bear_months: self.bear_months,
                horizon_months: self.horizon_months,
            });
        }

        if self.trial_count == 0 {
            return Err(ConfigError::NoTrials);
        }

        Ok(())
    }

    /// Market value of the existing holdings, including unrealised gains.
    pub fn initial_value(&self) -> f64 {
        self.principal * (1.0 + self.current_return_pct / 100.0)
    }

    pub fn cost_basis(&self) -> f64 {
        self.principal
    }

    pub fn normal_months(&self) -> u32 {
        self.horizon_months.saturating_sub(self.bear_months)
    }

    pub fn bear_regime(&self) -> Regime {
        Regime::from_annual_pct(self.bear_mean_annual, self.bear_vol_annual)
    }

    pub fn normal_regime(&self) -> Regime {
        Regime::from_annual_pct(self.normal_mean_annual, self.normal_vol_annual)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub month: u32,
    pub value: f64,
    pub contribution: f64,
}

/// One realised portfolio path, month 0 included.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trial {
    pub observations: Vec<Observation>,
}

impl Trial {
    pub fn final_value(&self) -> f64 {
        self.observations.last().map_or(0.0, |o| o.value)
    }

    pub fn final_contribution(&self) -> f64 {
        self.observations.last().map_or(0.0, |o| o.contribution)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PercentileSummary {
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

impl PercentileSummary {
    /// `(level, value)` pairs in ascending level order.
    pub fn levels(&self) -> [(f64, f64); 5] {
        [
            (PERCENTILE_LEVELS[0], self.p10),
            (PERCENTILE_LEVELS[1], self.p25),
            (PERCENTILE_LEVELS[2], self.p50),
            (PERCENTILE_LEVELS[3], self.p75),
            (PERCENTILE_LEVELS[4], self.p90),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub strategy: StrategyVariant,
    pub seed: u64,
    pub trial_count: u32,
    pub horizon_months: u32,
    pub final_values: Vec<f64>,
    pub percentiles: PercentileSummary,
    pub median: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub final_contribution_reference: f64,
    pub shortfall_probability: f64,
    pub histogram: Histogram,
    pub sample_paths: Vec<Trial>,
}
