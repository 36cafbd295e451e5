use anyhow::Context;
use broker_client::AlpacaClient;
use clap::{Parser, Subcommand};
use configuration::Config;
use engine::RebalanceSession;
use rust_decimal::Decimal;
use std::sync::Arc;
use strategies::WeightedAllocation;
use tracing_subscriber::EnvFilter;

/// The main entry point for the Helmsman rebalancing client.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Pick up APCA_* credentials from a .env file when one is present.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = configuration::load_config(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config))?;
    apply_env_credentials(&mut config);

    match cli.command {
        Commands::Rebalance(args) => handle_rebalance(args, config).await,
        Commands::ClosePositions => handle_close_positions(config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// An automated equity rebalancing client for the Alpaca paper-trading API.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one rebalance cycle toward the configured allocation.
    Rebalance(RebalanceArgs),

    /// Cancel every open order still live on the account.
    ClosePositions,
}

#[derive(Parser)]
struct RebalanceArgs {
    /// Overrides the configured starting buying power for this session.
    #[arg(long)]
    buying_power: Option<Decimal>,
}

/// Fills in gateway credentials from the conventional Alpaca environment
/// variables when the config file leaves them blank.
fn apply_env_credentials(config: &mut Config) {
    if config.gateway.key_id.is_empty() {
        if let Ok(key_id) = std::env::var("APCA_API_KEY_ID") {
            config.gateway.key_id = key_id;
        }
    }
    if config.gateway.secret_key.is_empty() {
        if let Ok(secret_key) = std::env::var("APCA_API_SECRET_KEY") {
            config.gateway.secret_key = secret_key;
        }
    }
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_rebalance(args: RebalanceArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(buying_power) = args.buying_power {
        config.session.buying_power = buying_power;
    }

    let client = AlpacaClient::new(&config.gateway).context("building the Alpaca client")?;
    let target_source = WeightedAllocation::from_config(
        &config.allocation,
        &config.session.symbols,
        config.session.buying_power,
    )?;

    let mut session = RebalanceSession::new(
        Arc::new(client),
        config.session,
        Box::new(target_source),
    );
    let report = session.run().await.context("rebalance session failed")?;

    println!("New Buying Power: ${:.2}", report.buying_power);
    println!(
        "Reconciled {} instrument(s), skipped {}.",
        report.reconciled, report.skipped
    );
    Ok(())
}

async fn handle_close_positions(config: Config) -> anyhow::Result<()> {
    let client = AlpacaClient::new(&config.gateway).context("building the Alpaca client")?;
    let cancelled = engine::cancel_all_orders(&client, config.session.cancel_lookback)
        .await
        .context("cancelling open orders")?;

    println!("Cancelled {cancelled} open order(s).");
    Ok(())
}
