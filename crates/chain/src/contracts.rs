//! Contract interfaces and calldata encoding.
//!
//! Inline `sol!` bindings for the three protocol contracts this bot
//! talks to: the margin router (events + swap quotes), the
//! cross-margin trading contract (risk views, direct liquidation,
//! price refresh) and the alternate liquidation contract that takes
//! an explicit AMM path word.

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol;
use alloy::sol_types::{SolCall, SolEvent};

sol! {
    /// Margin router: account-update events and swap-path quoting.
    #[sol(rpc)]
    interface IMarginRouter {
        event AccountUpdated(address indexed trader);

        function getAmountsIn(uint256 outAmount, bytes32 amms, address[] calldata tokens)
            external view returns (uint256[] memory amounts);

        function getAmountsOut(uint256 inAmount, bytes32 amms, address[] calldata tokens)
            external view returns (uint256[] memory amounts);
    }
}

sol! {
    /// Cross-margin trading contract (subset used by the monitor).
    #[sol(rpc)]
    interface ICrossMarginTrading {
        function viewLoanInPeg(address trader) external view returns (uint256);

        function viewHoldingsInPeg(address trader) external view returns (uint256);

        function canBeLiquidated(address trader) external view returns (bool);

        function viewCurrentPriceInPeg(address token, uint256 inAmount)
            external view returns (uint256);

        function getCurrentPriceInPeg(address token, uint256 inAmount, bool forceCurBlock)
            external returns (uint256);

        function liquidate(address[] calldata liquidatableAccounts) external;
    }
}

sol! {
    /// Alternate liquidation entry point carrying the AMM path.
    #[sol(rpc)]
    interface ILiquidation {
        function liquidate(address[] calldata liquidatableAccounts, bytes32 amms) external;
    }
}

/// Gas ceiling for the batched liquidation call. The receiving
/// contract's cost is not known in advance; inclusion beats
/// optimization here.
pub const LIQUIDATION_GAS_LIMIT: u64 = 8_000_000;

/// Gas ceiling for a single-token price refresh.
pub const PRICE_REFRESH_GAS_LIMIT: u64 = 800_000;

/// keccak256("AccountUpdated(address)"), the discovery filter topic.
pub fn account_updated_signature() -> B256 {
    IMarginRouter::AccountUpdated::SIGNATURE_HASH
}

/// Trader address from an `AccountUpdated` log, if the log matches.
pub fn parse_account_updated(log: &alloy::rpc::types::Log) -> Option<Address> {
    let topics = log.topics();
    if topics.len() < 2 || topics[0] != account_updated_signature() {
        return None;
    }
    Some(Address::from_slice(&topics[1][12..]))
}

/// Calldata for the primary contract's batched liquidation.
pub fn encode_liquidate(accounts: &[Address]) -> Bytes {
    let call = ICrossMarginTrading::liquidateCall {
        liquidatableAccounts: accounts.to_vec(),
    };
    Bytes::from(call.abi_encode())
}

/// Calldata for the alternate contract's liquidation with AMM path.
pub fn encode_liquidate_routed(accounts: &[Address], amms: B256) -> Bytes {
    let call = ILiquidation::liquidateCall {
        liquidatableAccounts: accounts.to_vec(),
        amms,
    };
    Bytes::from(call.abi_encode())
}

/// Calldata for a forced price refresh.
pub fn encode_price_refresh(token: Address, probe_amount: U256) -> Bytes {
    let call = ICrossMarginTrading::getCurrentPriceInPegCall {
        token,
        inAmount: probe_amount,
        forceCurBlock: true,
    };
    Bytes::from(call.abi_encode())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::LogData;

    #[test]
    fn test_event_signature_is_stable() {
        let sig = account_updated_signature();
        assert!(!sig.is_zero());
        // Must match keccak256 of the canonical event declaration
        assert_eq!(sig, alloy::primitives::keccak256(b"AccountUpdated(address)"));
    }

    #[test]
    fn test_parse_account_updated() {
        let trader = Address::repeat_byte(0x42);
        let mut topic = [0u8; 32];
        topic[12..].copy_from_slice(trader.as_slice());

        let log = alloy::rpc::types::Log {
            inner: alloy::primitives::Log {
                address: Address::repeat_byte(0x11),
                data: LogData::new_unchecked(
                    vec![account_updated_signature(), B256::new(topic)],
                    Bytes::new(),
                ),
            },
            ..Default::default()
        };
        assert_eq!(parse_account_updated(&log), Some(trader));

        // Wrong topic is skipped, not an error
        let other = alloy::rpc::types::Log {
            inner: alloy::primitives::Log {
                address: Address::repeat_byte(0x11),
                data: LogData::new_unchecked(vec![B256::repeat_byte(1), B256::new(topic)], Bytes::new()),
            },
            ..Default::default()
        };
        assert_eq!(parse_account_updated(&other), None);
    }

    #[test]
    fn test_liquidate_calldata_batches_all_accounts() {
        let accounts = [Address::repeat_byte(1), Address::repeat_byte(2)];
        let calldata = encode_liquidate(&accounts);
        assert!(!calldata.is_empty());

        let decoded = ICrossMarginTrading::liquidateCall::abi_decode(&calldata, true).unwrap();
        assert_eq!(decoded.liquidatableAccounts, accounts.to_vec());
    }

    #[test]
    fn test_routed_liquidate_carries_amm_word() {
        let accounts = [Address::repeat_byte(3)];
        let amms = B256::repeat_byte(0x01);
        let calldata = encode_liquidate_routed(&accounts, amms);

        let decoded = ILiquidation::liquidateCall::abi_decode(&calldata, true).unwrap();
        assert_eq!(decoded.liquidatableAccounts, accounts.to_vec());
        assert_eq!(decoded.amms, amms);

        // Distinct selector from the primary entry point
        assert_ne!(&calldata[..4], &encode_liquidate(&accounts)[..4]);
    }

    #[test]
    fn test_price_refresh_forces_current_block() {
        let calldata = encode_price_refresh(Address::repeat_byte(7), U256::from(1u64));
        let decoded =
            ICrossMarginTrading::getCurrentPriceInPegCall::abi_decode(&calldata, true).unwrap();
        assert!(decoded.forceCurBlock);
        assert_eq!(decoded.token, Address::repeat_byte(7));
    }
}
