//! Margin-protocol chain interaction layer.
//!
//! This crate provides:
//! - Contract bindings for the margin router, cross-margin trading
//!   contract and the alternate liquidation contract
//! - `MarginProvider`, the alloy-backed implementation of the
//!   `marginbot-core` trait seams
//! - Operator key loading and transaction submission

mod contracts;
mod provider;
mod signer;

pub use contracts::{
    account_updated_signature, LIQUIDATION_GAS_LIMIT, PRICE_REFRESH_GAS_LIMIT,
};
pub use provider::MarginProvider;
pub use signer::{read_secret, TransactionSender, SECRET_FILE};
