//! Key loading and transaction submission.
//!
//! The operator key lives in a dotfile in the home directory rather
//! than the environment, so a leaked process environment does not
//! leak the key. Submissions return the transaction hash as soon as
//! the node accepts the transaction; receipts are not awaited because
//! a reverted liquidation only costs gas and the next run retries.

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, B256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use marginbot_core::{BotError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Dotfile in `$HOME` holding the hex-encoded operator private key.
pub const SECRET_FILE: &str = ".marginswap-secret";

/// Read the operator key from `$HOME/.marginswap-secret`.
pub fn read_secret() -> Result<String> {
    let home = std::env::var("HOME")
        .map_err(|_| BotError::config("HOME is not set, cannot locate the secret file"))?;
    read_secret_from(&PathBuf::from(home).join(SECRET_FILE))
}

/// Read and trim a key file. Missing or empty files are config
/// errors, not transport errors; the operator must fix them.
pub fn read_secret_from(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| BotError::config(format!("cannot read secret file {}: {e}", path.display())))?;
    let key = raw.trim().to_string();
    if key.is_empty() {
        return Err(BotError::config(format!(
            "secret file {} is empty",
            path.display()
        )));
    }
    Ok(key)
}

/// Signs and submits transactions over HTTP.
pub struct TransactionSender {
    rpc_url: String,
    wallet: EthereumWallet,
    /// Signer address, logged at startup.
    pub address: Address,
    chain_id: u64,
}

impl TransactionSender {
    /// Create a sender from a hex private key, with or without the
    /// `0x` prefix.
    pub fn new(private_key: &str, rpc_url: &str, chain_id: u64) -> Result<Self> {
        let key_str = private_key.trim_start_matches("0x");
        let signer: PrivateKeySigner = key_str
            .parse()
            .map_err(|e| BotError::config(format!("invalid private key: {e}")))?;
        let address = signer.address();
        let wallet = EthereumWallet::from(signer);

        info!(address = %address, chain_id, "transaction sender initialized");

        Ok(Self {
            rpc_url: rpc_url.to_string(),
            wallet,
            address,
            chain_id,
        })
    }

    /// Submit a transaction and return its hash without waiting for
    /// a receipt. Nonce and gas price come from the provider fillers.
    pub async fn send(&self, to: Address, calldata: Bytes, gas_limit: u64) -> Result<B256> {
        debug!(to = %to, calldata_len = calldata.len(), gas_limit, "preparing transaction");

        let tx = TransactionRequest::default()
            .with_to(to)
            .with_input(calldata)
            .with_gas_limit(gas_limit)
            .with_chain_id(self.chain_id);

        let provider = ProviderBuilder::new()
            .wallet(self.wallet.clone())
            .on_http(self.rpc_url.parse().map_err(BotError::transport)?);

        let pending = provider
            .send_transaction(tx)
            .await
            .map_err(BotError::submission)?;
        let tx_hash = *pending.tx_hash();

        info!(tx_hash = %tx_hash, to = %to, "transaction submitted");
        Ok(tx_hash)
    }
}

impl std::fmt::Debug for TransactionSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionSender")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .field("rpc_url", &self.rpc_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known hardhat test key, never funded on any real network.
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_sender_derives_address_from_key() {
        let sender = TransactionSender::new(TEST_KEY, "http://localhost:8545", 31337).unwrap();
        assert_eq!(
            format!("{:?}", sender.address).to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );

        // Prefix is optional
        let bare = TransactionSender::new(&TEST_KEY[2..], "http://localhost:8545", 31337).unwrap();
        assert_eq!(bare.address, sender.address);
    }

    #[test]
    fn test_invalid_key_is_config_error() {
        let err = TransactionSender::new("not-a-key", "http://localhost:8545", 1).unwrap_err();
        assert!(matches!(err, BotError::Config(_)));
    }

    #[test]
    fn test_read_secret_from_file() {
        let path = std::env::temp_dir().join(format!("secret-test-{}", std::process::id()));
        std::fs::write(&path, format!("{TEST_KEY}\n")).unwrap();
        let key = read_secret_from(&path).unwrap();
        assert_eq!(key, TEST_KEY);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_or_empty_secret_is_config_error() {
        let missing = std::env::temp_dir().join("secret-test-never-written");
        assert!(matches!(
            read_secret_from(&missing).unwrap_err(),
            BotError::Config(_)
        ));

        let empty = std::env::temp_dir().join(format!("secret-test-empty-{}", std::process::id()));
        std::fs::write(&empty, "  \n").unwrap();
        assert!(matches!(
            read_secret_from(&empty).unwrap_err(),
            BotError::Config(_)
        ));
        std::fs::remove_file(&empty).unwrap();
    }
}
