use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    ConfigError, SimulationConfig, SimulationResult, StrategyVariant, compare_strategies,
    run_simulation,
};

const MONTHS_PER_YEAR: u32 = 12;
const MAX_HORIZON_MONTHS: u32 = 30 * MONTHS_PER_YEAR;
const MAX_TRIALS: u32 = 100_000;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliStrategy {
    ContinueContributing,
    StopContributing,
    TakeProfitHold,
    TakeProfitContribute,
}

impl From<CliStrategy> for StrategyVariant {
    fn from(value: CliStrategy) -> Self {
        match value {
            CliStrategy::ContinueContributing => StrategyVariant::ContinueContributing,
            CliStrategy::StopContributing => StrategyVariant::StopContributing,
            CliStrategy::TakeProfitHold => StrategyVariant::TakeProfitHold,
            CliStrategy::TakeProfitContribute => StrategyVariant::TakeProfitContribute,
        }
    }
}

impl From<StrategyVariant> for CliStrategy {
    fn from(value: StrategyVariant) -> Self {
        match value {
            StrategyVariant::ContinueContributing => CliStrategy::ContinueContributing,
            StrategyVariant::StopContributing => CliStrategy::StopContributing,
            StrategyVariant::TakeProfitHold => CliStrategy::TakeProfitHold,
            StrategyVariant::TakeProfitContribute => CliStrategy::TakeProfitContribute,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "invest-sim",
    about = "Monte Carlo projection of a portfolio under four contribution / profit-taking strategies"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate one strategy and print the result as JSON
    Simulate(SimulateArgs),
    /// Simulate several strategies against the same random draws
    Compare {
        #[command(flatten)]
        args: SimulateArgs,
        #[arg(
            long,
            value_enum,
            value_delimiter = ',',
            help = "Strategies to compare, comma separated; defaults to all four"
        )]
        strategies: Vec<CliStrategy>,
    },
    /// Serve the JSON API over HTTP
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    #[arg(long, default_value_t = 100_000.0, help = "Total amount invested so far")]
    pub principal: f64,
    #[arg(
        long,
        default_value_t = 70.0,
        help = "Cumulative return achieved so far in percent"
    )]
    pub current_return: f64,
    #[arg(long, default_value_t = 3_000.0)]
    pub monthly_contribution: f64,
    #[arg(long, default_value_t = 10, help = "Simulation period in years")]
    pub years: u32,
    #[arg(
        long,
        default_value_t = 3,
        help = "Bear market years at the beginning of the period"
    )]
    pub bear_years: u32,
    #[arg(long, help = "Simulation period in months; overrides --years")]
    pub horizon_months: Option<u32>,
    #[arg(long, help = "Bear market months; overrides --bear-years")]
    pub bear_months: Option<u32>,
    #[arg(
        long,
        default_value_t = 6.0,
        allow_negative_numbers = true,
        help = "Expected annual return in percent"
    )]
    pub expected_return: f64,
    #[arg(
        long,
        default_value_t = 12.0,
        help = "Expected annual volatility in percent"
    )]
    pub volatility: f64,
    #[arg(
        long,
        default_value_t = -5.0,
        allow_negative_numbers = true,
        help = "Bear market annual return in percent"
    )]
    pub bear_return: f64,
    #[arg(
        long,
        default_value_t = 18.0,
        help = "Bear market annual volatility in percent"
    )]
    pub bear_volatility: f64,
    #[arg(long, default_value_t = 500)]
    pub simulations: u32,
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
    #[arg(long, help = "Ignore --seed and draw a fresh one")]
    pub random_seed: bool,
    #[arg(long, value_enum, default_value_t = CliStrategy::ContinueContributing)]
    pub strategy: CliStrategy,
}

impl Default for SimulateArgs {
    fn default() -> Self {
        let config = SimulationConfig::default();
        Self {
            principal: config.principal,
            current_return: config.current_return_pct,
            monthly_contribution: config.monthly_contribution,
            years: config.horizon_months / MONTHS_PER_YEAR,
            bear_years: config.bear_months / MONTHS_PER_YEAR,
            horizon_months: None,
            bear_months: None,
            expected_return: config.normal_mean_annual,
            volatility: config.normal_vol_annual,
            bear_return: config.bear_mean_annual,
            bear_volatility: config.bear_vol_annual,
            simulations: config.trial_count,
            seed: config.seed.unwrap_or(42),
            random_seed: false,
            strategy: config.strategy.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    principal: Option<f64>,
    current_return: Option<f64>,
    monthly_contribution: Option<f64>,
    years: Option<u32>,
    bear_years: Option<u32>,
    horizon_months: Option<u32>,
    bear_months: Option<u32>,
    expected_return: Option<f64>,
    volatility: Option<f64>,
    bear_return: Option<f64>,
    bear_volatility: Option<f64>,
    simulations: Option<u32>,
    seed: Option<u64>,
    random_seed: Option<bool>,
    strategy: Option<StrategyVariant>,
    strategies: Option<Vec<StrategyVariant>>,
}

#[derive(Debug)]
struct ApiRequest {
    config: SimulationConfig,
    strategies: Vec<StrategyVariant>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareResponse {
    seed: u64,
    results: Vec<SimulationResult>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn build_config(args: &SimulateArgs) -> Result<SimulationConfig, String> {
    let horizon_months = match args.horizon_months {
        Some(months) => months,
        None => args
            .years
            .checked_mul(MONTHS_PER_YEAR)
            .ok_or_else(|| "--years is too large".to_string())?,
    };
    let bear_months = match (args.bear_months, args.horizon_months) {
        (Some(months), _) => months,
        (None, explicit_horizon) => {
            let from_years = args
                .bear_years
                .checked_mul(MONTHS_PER_YEAR)
                .ok_or_else(|| "--bear-years is too large".to_string())?;
            // A horizon given in months shortens the default bear period to fit.
            match explicit_horizon {
                Some(_) => from_years.min(horizon_months),
                None => from_years,
            }
        }
    };

    if horizon_months > MAX_HORIZON_MONTHS {
        return Err(format!(
            "simulation period must be at most {MAX_HORIZON_MONTHS} months"
        ));
    }

    if args.simulations > MAX_TRIALS {
        return Err(format!("--simulations must be <= {MAX_TRIALS}"));
    }

    if bear_months > horizon_months {
        return Err("bear market period must not exceed the simulation period".to_string());
    }

    let config = SimulationConfig {
        principal: args.principal,
        current_return_pct: args.current_return,
        monthly_contribution: args.monthly_contribution,
        horizon_months,
        bear_months,
        normal_mean_annual: args.expected_return,
        normal_vol_annual: args.volatility,
        bear_mean_annual: args.bear_return,
        bear_vol_annual: args.bear_volatility,
        trial_count: args.simulations,
        strategy: args.strategy.into(),
        seed: (!args.random_seed).then_some(args.seed),
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Strategies requested for a comparison; an empty list means all four.
pub fn comparison_set(strategies: &[CliStrategy]) -> Vec<StrategyVariant> {
    if strategies.is_empty() {
        StrategyVariant::ALL.to_vec()
    } else {
        strategies.iter().map(|&s| s.into()).collect()
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/compare", post(compare_post_handler))
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "invest-sim HTTP API listening");

    axum::serve(listener, router()).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let outcome = tokio::task::spawn_blocking(move || run_simulation(&request.config)).await;
    match outcome {
        Ok(Ok(result)) => json_response(StatusCode::OK, result),
        Ok(Err(err)) => config_error_response(&err),
        Err(err) => {
            warn!(error = %err, "simulation task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Simulation failed")
        }
    }
}

async fn compare_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let outcome = tokio::task::spawn_blocking(move || {
        compare_strategies(&request.config, &request.strategies)
    })
    .await;
    match outcome {
        Ok(Ok(results)) => {
            let seed = results.first().map_or(0, |r| r.seed);
            json_response(StatusCode::OK, CompareResponse { seed, results })
        }
        Ok(Err(err)) => config_error_response(&err),
        Err(err) => {
            warn!(error = %err, "comparison task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Simulation failed")
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn config_error_response(err: &ConfigError) -> Response {
    error_response(StatusCode::BAD_REQUEST, &err.to_string())
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: SimulatePayload) -> Result<ApiRequest, String> {
    let mut args = SimulateArgs::default();

    if let Some(v) = payload.principal {
        args.principal = v;
    }
    if let Some(v) = payload.current_return {
        args.current_return = v;
    }
    if let Some(v) = payload.monthly_contribution {
        args.monthly_contribution = v;
    }
    if let Some(v) = payload.years {
        args.years = v;
    }
    if let Some(v) = payload.bear_years {
        args.bear_years = v;
    }
    args.horizon_months = payload.horizon_months;
    args.bear_months = payload.bear_months;
    if let Some(v) = payload.expected_return {
        args.expected_return = v;
    }
    if let Some(v) = payload.volatility {
        args.volatility = v;
    }
    if let Some(v) = payload.bear_return {
        args.bear_return = v;
    }
    if let Some(v) = payload.bear_volatility {
        args.bear_volatility = v;
    }
    if let Some(v) = payload.simulations {
        args.simulations = v;
    }
    if let Some(v) = payload.seed {
        args.seed = v;
    }
    if let Some(v) = payload.random_seed {
        args.random_seed = v;
    }
    if let Some(v) = payload.strategy {
        args.strategy = v.into();
    }

    let config = build_config(&args)?;
    let strategies = match payload.strategies {
        Some(list) if !list.is_empty() => list,
        _ => StrategyVariant::ALL.to_vec(),
    };

    Ok(ApiRequest { config, strategies })
}
