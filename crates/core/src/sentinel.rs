//! Price sanity checking against swap-router quotes.
//!
//! For each registered token the router is asked, along the token's
//! liquidation path, how much input buys exactly one peg unit; the
//! margin contract is then asked for its own peg valuation of that
//! input amount. If the two quotes agree the valuation equals one peg
//! unit; the scaled ratio between them is the disparity signal, and a
//! reading outside the tolerance band triggers a forced on-chain
//! price refresh. Tokens are checked independently; one token's
//! failure or refresh never blocks another's.

use alloy::primitives::U256;
use tracing::{debug, info};

use crate::error::{BotError, Result};
use crate::ledger::{LiquidationSink, MarginViews, RouterQuotes};
use crate::peg_math::pow10;
use crate::registry::Registry;

/// Fixed-point scale of the disparity ratio (five decimals).
pub const RATIO_SCALE: u64 = 100_000;

/// Probe amount for the refresh transaction (one 18-decimal token).
const REFRESH_PROBE_DECIMALS: u8 = 18;

/// Tolerance band around a 1:1 ratio, in `RATIO_SCALE` units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisparityWindow {
    lower: u64,
    upper: u64,
}

impl DisparityWindow {
    /// Build from a fractional window, e.g. `0.10` for ±10%.
    pub fn from_fraction(window: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&window) {
            return Err(BotError::config(format!(
                "price window {window} outside [0, 1)"
            )));
        }
        let delta = (window * RATIO_SCALE as f64).round() as u64;
        Ok(Self {
            lower: RATIO_SCALE - delta,
            upper: RATIO_SCALE + delta,
        })
    }

    /// Whether a scaled ratio falls outside the band.
    pub fn is_breached(&self, ratio_scaled: U256) -> bool {
        ratio_scaled < U256::from(self.lower) || ratio_scaled > U256::from(self.upper)
    }
}

pub struct PriceSentinel<'a> {
    registry: &'a Registry,
    router: &'a dyn RouterQuotes,
    views: &'a dyn MarginViews,
    sink: &'a dyn LiquidationSink,
    window: DisparityWindow,
}

impl<'a> PriceSentinel<'a> {
    pub fn new(
        registry: &'a Registry,
        router: &'a dyn RouterQuotes,
        views: &'a dyn MarginViews,
        sink: &'a dyn LiquidationSink,
        window: DisparityWindow,
    ) -> Self {
        Self {
            registry,
            router,
            views,
            sink,
            window,
        }
    }

    /// Check one token and refresh its on-chain price if the protocol
    /// quote has drifted out of the window. Returns whether a refresh
    /// transaction was submitted.
    pub async fn check_and_refresh(&self, symbol: &str) -> Result<bool> {
        let token = self.registry.token_address(symbol)?;
        let path = self.registry.resolve_liquidation_path(symbol)?;
        let amms = self.registry.amm_selectors(symbol)?;
        let peg_unit = self.registry.peg_unit();

        // Router-side: input needed to buy exactly one peg unit.
        let amounts_in = self.router.amounts_in(peg_unit, amms, &path).await?;
        let reference_input = *amounts_in
            .first()
            .ok_or_else(|| BotError::transport("router returned empty amountsIn"))?;

        // Protocol-side valuation of that same input.
        let protocol_value = self
            .views
            .current_price_in_peg(token, reference_input)
            .await?;

        let ratio_scaled = protocol_value * U256::from(RATIO_SCALE) / peg_unit;

        // Cross-check quotes for one whole token, log only.
        let one_token = pow10(self.registry.token_decimals(symbol)?);
        if let Ok(protocol_quote) = self.views.current_price_in_peg(token, one_token).await {
            debug!(
                token = symbol,
                protocol_quote = %(protocol_quote / peg_unit),
                "Protocol quote for one token"
            );
        }
        if let Ok(out) = self.router.amounts_out(one_token, amms, &path).await {
            if let Some(final_out) = out.last() {
                debug!(
                    token = symbol,
                    router_quote = %(*final_out / peg_unit),
                    "Router quote for one token"
                );
            }
        }

        if !self.window.is_breached(ratio_scaled) {
            debug!(token = symbol, ratio = %ratio_scaled, "Price within window");
            return Ok(false);
        }

        info!(
            token = symbol,
            ratio = %ratio_scaled,
            lower = self.window.lower,
            upper = self.window.upper,
            "Price disparity beyond window, refreshing"
        );

        let probe = pow10(REFRESH_PROBE_DECIMALS);
        let tx_hash = self.sink.refresh_price(token, probe).await?;
        info!(token = symbol, tx_hash = %tx_hash, "Price refresh submitted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, B256};
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::error::Result;
    use crate::ledger::LiquidationSink;

    /// Router that always quotes `input_for_peg` as the required input.
    struct MockRouter {
        input_for_peg: U256,
    }

    #[async_trait]
    impl RouterQuotes for MockRouter {
        async fn amounts_in(&self, _: U256, _: B256, path: &[Address]) -> Result<Vec<U256>> {
            let mut amounts = vec![self.input_for_peg];
            amounts.extend(std::iter::repeat(U256::ZERO).take(path.len() - 1));
            Ok(amounts)
        }
        async fn amounts_out(&self, amount_in: U256, _: B256, _: &[Address]) -> Result<Vec<U256>> {
            Ok(vec![amount_in])
        }
    }

    /// Margin contract quoting a fixed peg valuation for any amount.
    struct MockViews {
        valuation: U256,
    }

    #[async_trait]
    impl MarginViews for MockViews {
        async fn loan_in_peg(&self, _: Address) -> Result<U256> {
            unreachable!()
        }
        async fn holdings_in_peg(&self, _: Address) -> Result<U256> {
            unreachable!()
        }
        async fn can_be_liquidated(&self, _: Address) -> Result<bool> {
            unreachable!()
        }
        async fn current_price_in_peg(&self, _: Address, _: U256) -> Result<U256> {
            Ok(self.valuation)
        }
    }

    #[derive(Default)]
    struct MockSink {
        refreshed: Mutex<Vec<Address>>,
    }

    #[async_trait]
    impl LiquidationSink for MockSink {
        async fn liquidate_direct(&self, _: &[Address]) -> Result<B256> {
            unreachable!()
        }
        async fn liquidate_routed(&self, _: Address, _: &[Address], _: B256) -> Result<B256> {
            unreachable!()
        }
        async fn refresh_price(&self, token: Address, _: U256) -> Result<B256> {
            self.refreshed.lock().unwrap().push(token);
            Ok(B256::repeat_byte(0xfe))
        }
    }

    async fn run_scenario(protocol_value: u64, window: f64) -> bool {
        // Mainnet peg unit is 10^6; a protocol valuation of
        // ratio * 10 gives the desired scaled ratio directly.
        let registry = Registry::for_network(1).unwrap();
        let router = MockRouter {
            input_for_peg: U256::from(1_000_000_000_000_000u64),
        };
        let views = MockViews {
            valuation: U256::from(protocol_value),
        };
        let sink = MockSink::default();
        let sentinel = PriceSentinel::new(
            &registry,
            &router,
            &views,
            &sink,
            DisparityWindow::from_fraction(window).unwrap(),
        );

        let refreshed = sentinel.check_and_refresh("DAI").await.unwrap();
        assert_eq!(sink.refreshed.lock().unwrap().len(), usize::from(refreshed));
        refreshed
    }

    #[tokio::test]
    async fn test_disparity_beyond_window_triggers_refresh() {
        // valuation 1.13 peg units -> ratio 113000 vs [90000, 110000]
        assert!(run_scenario(1_130_000, 0.10).await);
    }

    #[tokio::test]
    async fn test_disparity_within_window_is_left_alone() {
        // Same 1.13 ratio inside a ±20% window
        assert!(!run_scenario(1_130_000, 0.20).await);
    }

    #[tokio::test]
    async fn test_undervalued_protocol_price_also_refreshes() {
        // ratio 0.85 breaches the lower bound of ±10%
        assert!(run_scenario(850_000, 0.10).await);
    }

    #[tokio::test]
    async fn test_exact_parity_never_refreshes() {
        assert!(!run_scenario(1_000_000, 0.10).await);
    }

    #[test]
    fn test_window_bounds() {
        let window = DisparityWindow::from_fraction(0.10).unwrap();
        assert!(!window.is_breached(U256::from(90_000u64)));
        assert!(!window.is_breached(U256::from(110_000u64)));
        assert!(window.is_breached(U256::from(89_999u64)));
        assert!(window.is_breached(U256::from(110_001u64)));

        assert!(DisparityWindow::from_fraction(1.0).is_err());
        assert!(DisparityWindow::from_fraction(-0.1).is_err());
    }
}
