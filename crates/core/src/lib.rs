//! Core pipeline of the cross-margin liquidation monitor.
//!
//! This crate provides the batch pipeline that each run walks through:
//! - Static token/path registry per network
//! - Persistent scan cursor (last block + retained account set)
//! - Windowed account discovery from the event log
//! - Per-account risk evaluation and retention pruning
//! - Strategy-dispatched batched liquidation
//! - Router-vs-protocol price sentinel
//!
//! The on-chain collaborators are trait seams (`ledger`); the
//! alloy-backed implementations live in `marginbot-chain`.

pub mod config;
mod cursor;
mod discovery;
mod error;
mod evaluator;
mod executor;
pub mod ledger;
pub mod peg_math;
pub mod registry;
mod sentinel;

pub use config::{RunConfig, ScaledThresholds};
pub use cursor::{Cursor, CursorStore};
pub use discovery::{discover, DiscoveryOutcome, MAX_WINDOWS_PER_RUN};
pub use error::{BotError, Result};
pub use evaluator::{AccountSnapshot, AggregateRiskTotals, Evaluation, RiskEvaluator};
pub use executor::{liquidate, LiquidationOutcome, LiquidationStrategy};
pub use registry::{encode_amm_path, Amm, NetworkConfig, Registry, TokenInfo};
pub use sentinel::{DisparityWindow, PriceSentinel, RATIO_SCALE};
