//! market-pulse: binary entrypoint
//! Loads configuration, runs one aggregation cycle and prints the report as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use market_pulse::behavior;
use market_pulse::config::PulseConfig;
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "market-pulse", version, about = "Compose a price-trend / news-sentiment report")]
struct Cli {
    /// Config file (TOML or JSON). Defaults to $PULSE_CONFIG_PATH, then config/pulse.{toml,json}.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also summarize a customer-behavior CSV (user_id,item_id,timestamp).
    #[arg(long)]
    behavior: Option<PathBuf>,

    /// Single-line JSON instead of pretty output.
    #[arg(long)]
    compact: bool,
}

/// Logs go to stderr so stdout stays valid JSON.
/// RUST_LOG overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("market_pulse=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev so ENV credentials resolve.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(p) => PulseConfig::load_from(p)?,
        None => PulseConfig::load_default()?,
    };

    let report = market_pulse::run_once(&cfg).await?;

    let out = match &cli.behavior {
        Some(path) => {
            let records = behavior::load_records(path)
                .with_context(|| format!("loading behavior data from {}", path.display()))?;
            tracing::info!(rows = records.len(), "behavior data loaded");
            json!({ "report": report, "behavior": behavior::summarize(&records) })
        }
        None => serde_json::to_value(&report).context("serializing report")?,
    };

    let text = if cli.compact {
        serde_json::to_string(&out)?
    } else {
        serde_json::to_string_pretty(&out)?
    };
    println!("{text}");
    Ok(())
}
