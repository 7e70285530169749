//! Trait seams for the external on-chain collaborators.
//!
//! The pipeline only ever talks to the ledger node, the margin
//! contract and the swap router through these traits; the alloy-backed
//! implementations live in `marginbot-chain`, and the tests in this
//! crate run against in-memory mocks.

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;

use crate::error::Result;

/// Read access to the ledger's head and event log.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Current chain height.
    async fn block_number(&self) -> Result<u64>;

    /// Accounts named by `AccountUpdated` events in the inclusive
    /// block range. An empty range result is normal.
    async fn account_updates(&self, from_block: u64, to_block: u64) -> Result<Vec<Address>>;
}

/// Read-only views of the cross-margin trading contract.
#[async_trait]
pub trait MarginViews: Send + Sync {
    async fn loan_in_peg(&self, account: Address) -> Result<U256>;

    async fn holdings_in_peg(&self, account: Address) -> Result<U256>;

    async fn can_be_liquidated(&self, account: Address) -> Result<bool>;

    /// Protocol's own peg valuation of `amount` of `token`.
    async fn current_price_in_peg(&self, token: Address, amount: U256) -> Result<U256>;
}

/// Swap-router quoting.
#[async_trait]
pub trait RouterQuotes: Send + Sync {
    /// Input amounts per hop needed to receive `amount_out` along the
    /// path; index 0 is the required input of the first token.
    async fn amounts_in(
        &self,
        amount_out: U256,
        amms: B256,
        path: &[Address],
    ) -> Result<Vec<U256>>;

    /// Output amounts per hop for swapping `amount_in` along the path;
    /// the last element is the final output.
    async fn amounts_out(
        &self,
        amount_in: U256,
        amms: B256,
        path: &[Address],
    ) -> Result<Vec<U256>>;
}

/// State-mutating submissions.
#[async_trait]
pub trait LiquidationSink: Send + Sync {
    /// Batched liquidation through the primary margin contract.
    async fn liquidate_direct(&self, accounts: &[Address]) -> Result<B256>;

    /// Batched liquidation through the alternate contract, with an
    /// explicit AMM path word.
    async fn liquidate_routed(
        &self,
        contract: Address,
        accounts: &[Address],
        amms: B256,
    ) -> Result<B256>;

    /// Forced on-chain price refresh for a token.
    async fn refresh_price(&self, token: Address, probe_amount: U256) -> Result<B256>;
}
