//! Batched liquidation submission.
//!
//! The entry point differs per deployment: most networks liquidate
//! through the primary margin contract, while deployments whose
//! primary interface lacks the AMM-path argument route through an
//! alternate contract with a default path encoding. The choice is
//! made once from the network config and dispatched as a strategy,
//! not re-branched at every call site.

use alloy::primitives::{Address, B256};
use tracing::info;

use crate::error::Result;
use crate::ledger::LiquidationSink;
use crate::registry::{encode_amm_path, NetworkConfig, DEFAULT_AMM_PATH};

/// How liquidations reach the chain on this network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiquidationStrategy {
    /// Primary margin contract, address list only
    Direct,
    /// Alternate contract taking an explicit AMM path word
    Routed { contract: Address, amms: B256 },
}

impl LiquidationStrategy {
    /// Select the strategy for a deployment.
    pub fn for_network(network: &NetworkConfig) -> Result<Self> {
        Ok(match network.alternate_liquidation {
            Some(contract) => Self::Routed {
                contract,
                amms: encode_amm_path(DEFAULT_AMM_PATH)?,
            },
            None => Self::Direct,
        })
    }
}

/// Result of one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiquidationOutcome {
    /// Nothing to liquidate; no transaction was sent
    Skipped,
    Submitted(B256),
}

/// Submit one batched liquidation for all eligible accounts. An empty
/// list is a no-op, not an error. Submission failure propagates to
/// the caller; retry policy belongs to the enclosing scheduler.
pub async fn liquidate(
    sink: &dyn LiquidationSink,
    strategy: &LiquidationStrategy,
    accounts: &[Address],
) -> Result<LiquidationOutcome> {
    if accounts.is_empty() {
        info!("No liquidatable accounts, skipping submission");
        return Ok(LiquidationOutcome::Skipped);
    }

    let tx_hash = match strategy {
        LiquidationStrategy::Direct => sink.liquidate_direct(accounts).await?,
        LiquidationStrategy::Routed { contract, amms } => {
            sink.liquidate_routed(*contract, accounts, *amms).await?
        }
    };

    info!(
        accounts = accounts.len(),
        tx_hash = %tx_hash,
        "Liquidation submitted"
    );
    Ok(LiquidationOutcome::Submitted(tx_hash))
}
