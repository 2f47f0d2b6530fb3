use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use invest_sim::api::{Cli, Command, build_config, comparison_set, run_http_server};
use invest_sim::core::{compare_strategies, run_simulation};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port } => {
            run_http_server(port)
                .await
                .with_context(|| format!("HTTP server on port {port} failed"))?;
        }
        Command::Simulate(args) => {
            let config = build_config(&args).map_err(anyhow::Error::msg)?;
            let result = run_simulation(&config)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Compare { args, strategies } => {
            let config = build_config(&args).map_err(anyhow::Error::msg)?;
            let results = compare_strategies(&config, &comparison_set(&strategies))?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("invest_sim=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
