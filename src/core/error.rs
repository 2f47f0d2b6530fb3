use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Rejected simulation input. Raised before any trial runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },

    #[error("principal must be > 0, got {0}")]
    NonPositivePrincipal(f64),

    #[error("{field} must be >= 0, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("bear_months ({bear_months}) must be <= horizon_months ({horizon_months})")]
    BearExceedsHorizon {
        bear_months: u32,
        horizon_months: u32,
    },

    #[error("trial_count must be >= 1")]
    NoTrials,

    #[error("invalid return distribution: {0}")]
    Distribution(String),
}
