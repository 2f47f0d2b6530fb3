mod aggregate;
mod engine;
mod error;
mod returns;
mod strategy;
mod trial;
mod types;

pub use aggregate::{
    TrialOutcome, build_result, histogram, median, percentile, summarize_percentiles,
};
pub use engine::{compare_strategies, run_simulation};
pub use error::{ConfigError, Result};
pub use returns::{Regime, ReturnSequenceGenerator, derive_trial_seed};
pub use strategy::PortfolioState;
pub use trial::run_trial;
pub use types::{
    HISTOGRAM_BINS, Histogram, HistogramBin, Observation, PERCENTILE_LEVELS, PercentileSummary,
    SAMPLE_PATH_LIMIT, SimulationConfig, SimulationResult, StrategyVariant, Trial,
};
