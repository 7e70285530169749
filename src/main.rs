//! Marginswap liquidation monitor.
//!
//! One invocation performs a single pass and exits:
//! 1. Load the scan cursor for the target network
//! 2. Discover candidate accounts from `AccountUpdated` events
//! 3. Evaluate each candidate against the margin contract views
//! 4. Persist the cursor, then submit one batched liquidation
//! 5. Optionally sweep every token through the price sentinel
//!
//! The process exits 0 even when a step fails; failures are logged
//! and the next scheduled run retries from the persisted cursor.

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use marginbot_chain::{read_secret, MarginProvider, TransactionSender};
use marginbot_core::{
    discover, liquidate, CursorStore, LiquidationStrategy, PriceSentinel, Registry, RiskEvaluator,
    RunConfig, MAX_WINDOWS_PER_RUN,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "Run failed");
    }
}

async fn run() -> anyhow::Result<()> {
    let config = RunConfig::from_env()?;
    let registry = Registry::for_network(config.chain_id)?;
    let network = registry.network();

    info!(
        network = network.name,
        chain_id = network.chain_id,
        node_url = %config.node_url,
        "Starting liquidation run"
    );

    let secret = read_secret()?;
    let sender = TransactionSender::new(&secret, &config.node_url, config.chain_id)?;
    let provider = MarginProvider::new(
        &config.node_url,
        network.router,
        network.margin_contract,
        sender,
    );

    let store = CursorStore::new(&config.cursor_file);
    let cursor = store.load(config.chain_id)?;
    info!(
        last_block = cursor.last_block,
        retained = cursor.users.len(),
        "Cursor loaded"
    );

    let outcome = discover(&provider, &cursor, network.log_window, MAX_WINDOWS_PER_RUN).await?;

    let thresholds = config.scaled_thresholds(network.peg_decimals);
    let evaluator = RiskEvaluator::new(
        &provider,
        thresholds.minimum_loan,
        thresholds.retention_floor,
        thresholds.report_threshold,
        network.peg_decimals,
    );
    let evaluation = evaluator.evaluate(&outcome.accounts).await?;

    // Persist before submitting so a crash mid-submission never
    // replays already-scanned windows with a stale account set.
    store.save(
        config.chain_id,
        &marginbot_core::Cursor {
            last_block: outcome.last_block,
            users: evaluation.retained.clone(),
        },
    )?;

    let strategy = LiquidationStrategy::for_network(network)?;
    match liquidate(&provider, &strategy, &evaluation.eligible).await {
        Ok(outcome) => info!(outcome = ?outcome, "Liquidation step complete"),
        Err(e) => warn!(error = %e, "Liquidation submission failed, will retry next run"),
    }

    if let Some(window) = config.price_window {
        let sentinel = PriceSentinel::new(&registry, &provider, &provider, &provider, window);
        for symbol in registry.symbols() {
            match sentinel.check_and_refresh(symbol).await {
                Ok(true) => info!(token = symbol, "Price refresh submitted"),
                Ok(false) => {}
                Err(e) => warn!(token = symbol, error = %e, "Price check failed"),
            }
        }
    }

    info!("Run complete");
    Ok(())
}
