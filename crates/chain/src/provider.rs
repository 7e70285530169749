//! Alloy-backed implementations of the ledger trait seams.
//!
//! A fresh HTTP provider is built per call; alloy providers are
//! cheap handles over a shared transport and this keeps the struct
//! free of generic provider parameters.

use alloy::primitives::{Address, B256, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::Filter;
use async_trait::async_trait;
use marginbot_core::ledger::{LedgerReader, LiquidationSink, MarginViews, RouterQuotes};
use marginbot_core::{BotError, Result};
use tracing::debug;

use crate::contracts::{
    account_updated_signature, encode_liquidate, encode_liquidate_routed, encode_price_refresh,
    parse_account_updated, ICrossMarginTrading, IMarginRouter, LIQUIDATION_GAS_LIMIT,
    PRICE_REFRESH_GAS_LIMIT,
};
use crate::signer::TransactionSender;

/// On-chain gateway for one network: event reads, margin views,
/// router quotes and signed submissions.
pub struct MarginProvider {
    http_url: String,
    router: Address,
    margin_contract: Address,
    sender: TransactionSender,
}

impl MarginProvider {
    pub fn new(
        http_url: impl Into<String>,
        router: Address,
        margin_contract: Address,
        sender: TransactionSender,
    ) -> Self {
        Self {
            http_url: http_url.into(),
            router,
            margin_contract,
            sender,
        }
    }

    /// Address the operator key controls.
    pub fn operator(&self) -> Address {
        self.sender.address
    }

    fn provider(&self) -> Result<impl Provider> {
        Ok(ProviderBuilder::new().on_http(self.http_url.parse().map_err(BotError::transport)?))
    }
}

#[async_trait]
impl LedgerReader for MarginProvider {
    async fn block_number(&self) -> Result<u64> {
        self.provider()?
            .get_block_number()
            .await
            .map_err(BotError::transport)
    }

    async fn account_updates(&self, from_block: u64, to_block: u64) -> Result<Vec<Address>> {
        let filter = Filter::new()
            .address(self.router)
            .event_signature(account_updated_signature())
            .from_block(from_block)
            .to_block(to_block);

        let logs = self
            .provider()?
            .get_logs(&filter)
            .await
            .map_err(BotError::transport)?;

        debug!(from_block, to_block, logs = logs.len(), "queried account updates");

        Ok(logs.iter().filter_map(parse_account_updated).collect())
    }
}

#[async_trait]
impl MarginViews for MarginProvider {
    async fn loan_in_peg(&self, account: Address) -> Result<U256> {
        let margin = ICrossMarginTrading::new(self.margin_contract, self.provider()?);
        let loan = margin
            .viewLoanInPeg(account)
            .call()
            .await
            .map_err(BotError::transport)?;
        Ok(loan._0)
    }

    async fn holdings_in_peg(&self, account: Address) -> Result<U256> {
        let margin = ICrossMarginTrading::new(self.margin_contract, self.provider()?);
        let holdings = margin
            .viewHoldingsInPeg(account)
            .call()
            .await
            .map_err(BotError::transport)?;
        Ok(holdings._0)
    }

    async fn can_be_liquidated(&self, account: Address) -> Result<bool> {
        let margin = ICrossMarginTrading::new(self.margin_contract, self.provider()?);
        let flagged = margin
            .canBeLiquidated(account)
            .call()
            .await
            .map_err(BotError::transport)?;
        Ok(flagged._0)
    }

    async fn current_price_in_peg(&self, token: Address, amount: U256) -> Result<U256> {
        let margin = ICrossMarginTrading::new(self.margin_contract, self.provider()?);
        let value = margin
            .viewCurrentPriceInPeg(token, amount)
            .call()
            .await
            .map_err(BotError::transport)?;
        Ok(value._0)
    }
}

#[async_trait]
impl RouterQuotes for MarginProvider {
    async fn amounts_in(
        &self,
        amount_out: U256,
        amms: B256,
        path: &[Address],
    ) -> Result<Vec<U256>> {
        let router = IMarginRouter::new(self.router, self.provider()?);
        let amounts = router
            .getAmountsIn(amount_out, amms, path.to_vec())
            .call()
            .await
            .map_err(BotError::transport)?;
        Ok(amounts.amounts)
    }

    async fn amounts_out(
        &self,
        amount_in: U256,
        amms: B256,
        path: &[Address],
    ) -> Result<Vec<U256>> {
        let router = IMarginRouter::new(self.router, self.provider()?);
        let amounts = router
            .getAmountsOut(amount_in, amms, path.to_vec())
            .call()
            .await
            .map_err(BotError::transport)?;
        Ok(amounts.amounts)
    }
}

#[async_trait]
impl LiquidationSink for MarginProvider {
    async fn liquidate_direct(&self, accounts: &[Address]) -> Result<B256> {
        let calldata = encode_liquidate(accounts);
        self.sender
            .send(self.margin_contract, calldata, LIQUIDATION_GAS_LIMIT)
            .await
    }

    async fn liquidate_routed(
        &self,
        contract: Address,
        accounts: &[Address],
        amms: B256,
    ) -> Result<B256> {
        let calldata = encode_liquidate_routed(accounts, amms);
        self.sender
            .send(contract, calldata, LIQUIDATION_GAS_LIMIT)
            .await
    }

    async fn refresh_price(&self, token: Address, probe_amount: U256) -> Result<B256> {
        let calldata = encode_price_refresh(token, probe_amount);
        self.sender
            .send(self.margin_contract, calldata, PRICE_REFRESH_GAS_LIMIT)
            .await
    }
}
