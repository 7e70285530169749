//! Runtime configuration from the environment.
//!
//! Parsed once at startup into an immutable [`RunConfig`]; no
//! component reads the environment after this point.

use alloy::primitives::U256;

use crate::error::{BotError, Result};
use crate::peg_math::to_peg_units;
use crate::sentinel::DisparityWindow;

/// Environment variable names.
pub mod env {
    pub const NODE_URL: &str = "NODE_URL";
    pub const CHAIN_ID: &str = "CHAIN_ID";
    pub const MINIMUM_LOAN_USD: &str = "MINIMUM_LOAN_USD";
    pub const PRICE_WINDOW: &str = "PRICE_WINDOW";
    pub const RETENTION_FLOOR_USD: &str = "RETENTION_FLOOR_USD";
    pub const REPORT_THRESHOLD_USD: &str = "REPORT_THRESHOLD_USD";
    pub const CURSOR_FILE: &str = "CURSOR_FILE";
}

/// Default minimum loan, in whole peg units.
const DEFAULT_MINIMUM_LOAN: u64 = 5;

/// Default reporting threshold, in whole peg units.
const DEFAULT_REPORT_THRESHOLD: u64 = 100;

const DEFAULT_CURSOR_FILE: &str = "addresses.json";

/// One run's configuration. Threshold fields are whole peg units;
/// use [`RunConfig::scaled_thresholds`] for raw comparisons.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub node_url: String,
    pub chain_id: u64,
    /// Loans at or below this (whole peg units) are never liquidated
    pub minimum_loan: u64,
    /// Retention floor in whole peg units; `None` means half the
    /// minimum loan (resolved at scaling time, where halving the raw
    /// amount loses nothing to integer division)
    pub retention_floor: Option<u64>,
    /// Reporting threshold in whole peg units
    pub report_threshold: u64,
    /// Price sentinel tolerance; `None` disables the pass
    pub price_window: Option<DisparityWindow>,
    pub cursor_file: String,
}

/// Thresholds scaled to the peg's smallest unit.
#[derive(Debug, Clone, Copy)]
pub struct ScaledThresholds {
    pub minimum_loan: U256,
    pub retention_floor: U256,
    pub report_threshold: U256,
}

impl RunConfig {
    /// Read and validate the environment. `Config` errors here abort
    /// before any remote call.
    pub fn from_env() -> Result<Self> {
        let node_url = require(env::NODE_URL)?;
        let chain_id = require(env::CHAIN_ID)?
            .parse::<u64>()
            .map_err(|e| BotError::config(format!("invalid {}: {e}", env::CHAIN_ID)))?;

        let minimum_loan = parse_optional(env::MINIMUM_LOAN_USD)?.unwrap_or(DEFAULT_MINIMUM_LOAN);
        let retention_floor = parse_optional(env::RETENTION_FLOOR_USD)?;
        let report_threshold =
            parse_optional(env::REPORT_THRESHOLD_USD)?.unwrap_or(DEFAULT_REPORT_THRESHOLD);

        let price_window = match std::env::var(env::PRICE_WINDOW) {
            Ok(raw) => {
                let fraction = raw
                    .parse::<f64>()
                    .map_err(|e| BotError::config(format!("invalid {}: {e}", env::PRICE_WINDOW)))?;
                Some(DisparityWindow::from_fraction(fraction)?)
            }
            Err(_) => None,
        };

        let cursor_file =
            std::env::var(env::CURSOR_FILE).unwrap_or_else(|_| DEFAULT_CURSOR_FILE.to_string());

        Ok(Self {
            node_url,
            chain_id,
            minimum_loan,
            retention_floor,
            report_threshold,
            price_window,
            cursor_file,
        })
    }

    /// Scale the whole-unit thresholds to the peg's smallest unit.
    pub fn scaled_thresholds(&self, peg_decimals: u8) -> ScaledThresholds {
        let minimum_loan = to_peg_units(self.minimum_loan, peg_decimals);
        let retention_floor = match self.retention_floor {
            Some(floor) => to_peg_units(floor, peg_decimals),
            None => minimum_loan / U256::from(2u64),
        };
        ScaledThresholds {
            minimum_loan,
            retention_floor,
            report_threshold: to_peg_units(self.report_threshold, peg_decimals),
        }
    }
}

fn require(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| BotError::config(format!("missing env var {name}")))
}

fn parse_optional(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|e| BotError::config(format!("invalid {name}: {e}"))),
        Err(_) => Ok(None),
    }
}
