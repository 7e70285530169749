//! Error taxonomy for the liquidation monitor.
//!
//! Config errors abort before any remote call; transport errors abort
//! the run without touching the cursor; submission errors are logged
//! by the caller after the cursor has already been saved.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    /// Missing or invalid static configuration (network selector,
    /// token registry entry, secret file). Fatal before any RPC.
    #[error("config error: {0}")]
    Config(String),

    /// RPC round-trip failure during discovery, evaluation or quoting.
    #[error("transport error: {0}")]
    Transport(String),

    /// A state-mutating transaction was rejected by the node.
    #[error("submission error: {0}")]
    Submission(String),

    /// Cursor file unreadable or unwritable.
    #[error("cursor io error: {0}")]
    Io(#[from] std::io::Error),

    /// Cursor file present but not valid JSON.
    #[error("cursor decode error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BotError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn transport(msg: impl std::fmt::Display) -> Self {
        Self::Transport(msg.to_string())
    }

    pub fn submission(msg: impl std::fmt::Display) -> Self {
        Self::Submission(msg.to_string())
    }
}

pub type Result<T, E = BotError> = std::result::Result<T, E>;
