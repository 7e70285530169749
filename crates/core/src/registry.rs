//! Token and path registry for the cross-margin protocol.
//!
//! Static per-network tables: token symbol -> address maps, per-token
//! risk parameters and liquidation swap paths, and the contract
//! addresses of each deployment. Built once at startup into an
//! immutable [`Registry`] and passed explicitly into every component.

use alloy::primitives::{address, Address, B256, U256};
use std::collections::BTreeMap;

use crate::error::{BotError, Result};
use crate::peg_math::pow10;

/// AMM venue selector, one byte per swap hop on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Amm {
    Uniswap = 0,
    Sushiswap = 1,
}

/// Default selector sequence when a token specifies none.
pub const DEFAULT_AMM_PATH: &[Amm] = &[Amm::Uniswap];

/// Placeholder symbol resolved to the network's base currency.
pub const BASE_PLACEHOLDER: &str = "BASE";

/// Encode an AMM selector sequence as the 32-byte word the on-chain
/// router decodes: one byte per hop from the front, zero fill to the
/// right. The layout is wire format, not cosmetic.
pub fn encode_amm_path(path: &[Amm]) -> Result<B256> {
    if path.len() > 32 {
        return Err(BotError::config(format!(
            "AMM path has {} hops, wire word fits 32",
            path.len()
        )));
    }
    let mut word = [0u8; 32];
    for (i, amm) in path.iter().enumerate() {
        word[i] = *amm as u8;
    }
    Ok(B256::new(word))
}

/// One protocol deployment.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// EVM chain id
    pub chain_id: u64,
    /// Human-readable name for logs
    pub name: &'static str,
    /// Wrapped native token symbol, substituted for `BASE` in paths
    pub base_symbol: &'static str,
    /// Stable token every liquidation path terminates at
    pub peg_symbol: &'static str,
    /// Decimal count of the peg token on this network
    pub peg_decimals: u8,
    /// CrossMarginTrading contract (views + direct liquidate)
    pub margin_contract: Address,
    /// MarginRouter contract (AccountUpdated events, swap quotes)
    pub router: Address,
    /// Alternate liquidation contract taking an explicit AMM path,
    /// used where the primary interface lacks that argument
    pub alternate_liquidation: Option<Address>,
    /// Block span per event-log query, sized to the node's range limit
    pub log_window: u64,
}

impl NetworkConfig {
    /// One whole peg unit in the peg's smallest denomination.
    pub fn peg_unit(&self) -> U256 {
        pow10(self.peg_decimals)
    }
}

/// Risk and routing parameters for one supported token.
///
/// Exposure cap, lending buffer and incentive weight are risk-engine
/// inputs consumed on-chain; they are carried through unchanged.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub symbol: &'static str,
    pub decimals: u8,
    /// Per-network decimal overrides (chain id, decimals)
    pub decimal_overrides: &'static [(u64, u8)],
    pub exposure_cap: u64,
    pub lending_buffer: u64,
    pub incentive_weight: u8,
    /// Swap hops toward the peg, `BASE` standing for the base currency
    pub liquidation_path: &'static [&'static str],
    /// AMM venue per hop; `None` means the single default hop
    pub amm_path: Option<&'static [Amm]>,
}

// ============================================================================
// Per-token parameters (shared across networks)
// ============================================================================

const TOKEN_PARAMS: &[TokenInfo] = &[
    TokenInfo {
        symbol: "WETH",
        decimals: 18,
        decimal_overrides: &[],
        exposure_cap: 100_000,
        lending_buffer: 500,
        incentive_weight: 3,
        liquidation_path: &["BASE"],
        amm_path: None,
    },
    TokenInfo {
        symbol: "DAI",
        decimals: 18,
        decimal_overrides: &[],
        exposure_cap: 10_000_000,
        lending_buffer: 10_000,
        incentive_weight: 3,
        liquidation_path: &["DAI", "BASE"],
        amm_path: None,
    },
    TokenInfo {
        symbol: "UNI",
        decimals: 18,
        decimal_overrides: &[],
        exposure_cap: 100_000,
        lending_buffer: 500,
        incentive_weight: 5,
        liquidation_path: &["UNI", "BASE"],
        amm_path: None,
    },
    TokenInfo {
        symbol: "MKR",
        decimals: 18,
        decimal_overrides: &[],
        exposure_cap: 2_000,
        lending_buffer: 80,
        incentive_weight: 5,
        liquidation_path: &["MKR", "BASE"],
        amm_path: None,
    },
    TokenInfo {
        symbol: "USDT",
        decimals: 6,
        // BSC-bridged USDT is an 18-decimal BEP-20
        decimal_overrides: &[(56, 18)],
        exposure_cap: 100_000_000,
        lending_buffer: 10_000,
        incentive_weight: 3,
        liquidation_path: &["USDT", "BASE"],
        amm_path: None,
    },
    TokenInfo {
        symbol: "USDC",
        decimals: 6,
        decimal_overrides: &[(56, 18)],
        exposure_cap: 100_000_000,
        lending_buffer: 10_000,
        incentive_weight: 3,
        liquidation_path: &["USDC", "BASE"],
        amm_path: None,
    },
    TokenInfo {
        symbol: "WBTC",
        decimals: 8,
        decimal_overrides: &[],
        exposure_cap: 2_000,
        lending_buffer: 20,
        incentive_weight: 3,
        liquidation_path: &["WBTC", "BASE"],
        amm_path: None,
    },
    TokenInfo {
        symbol: "LINK",
        decimals: 18,
        decimal_overrides: &[],
        exposure_cap: 200_000,
        lending_buffer: 100,
        incentive_weight: 1,
        liquidation_path: &["LINK", "BASE"],
        amm_path: Some(&[Amm::Uniswap, Amm::Uniswap]),
    },
    TokenInfo {
        symbol: "SUSHI",
        decimals: 18,
        decimal_overrides: &[],
        exposure_cap: 300_000,
        lending_buffer: 4_000,
        incentive_weight: 1,
        liquidation_path: &["SUSHI", "BASE"],
        amm_path: Some(&[Amm::Sushiswap, Amm::Sushiswap, Amm::Sushiswap]),
    },
    TokenInfo {
        symbol: "ALCX",
        decimals: 18,
        decimal_overrides: &[],
        exposure_cap: 10_000,
        lending_buffer: 100,
        incentive_weight: 2,
        liquidation_path: &["ALCX", "BASE"],
        amm_path: Some(&[Amm::Sushiswap, Amm::Sushiswap, Amm::Sushiswap]),
    },
    TokenInfo {
        symbol: "ETH",
        decimals: 18,
        decimal_overrides: &[],
        exposure_cap: 100_000,
        lending_buffer: 500,
        incentive_weight: 3,
        liquidation_path: &["ETH", "BASE"],
        amm_path: None,
    },
    TokenInfo {
        symbol: "WBNB",
        decimals: 18,
        decimal_overrides: &[],
        exposure_cap: 1_000_000,
        lending_buffer: 10_000,
        incentive_weight: 3,
        liquidation_path: &["WBNB"],
        amm_path: None,
    },
    TokenInfo {
        symbol: "CAKE",
        decimals: 18,
        decimal_overrides: &[],
        exposure_cap: 200_000,
        lending_buffer: 100,
        incentive_weight: 1,
        liquidation_path: &["CAKE", "BASE"],
        amm_path: None,
    },
    TokenInfo {
        symbol: "BUSD",
        decimals: 18,
        decimal_overrides: &[],
        exposure_cap: 10_000_000,
        lending_buffer: 10_000,
        incentive_weight: 3,
        liquidation_path: &["BUSD", "BASE"],
        amm_path: None,
    },
    TokenInfo {
        symbol: "BTCB",
        decimals: 18,
        decimal_overrides: &[],
        exposure_cap: 2_000,
        lending_buffer: 20,
        incentive_weight: 3,
        liquidation_path: &["BTCB", "BASE"],
        amm_path: None,
    },
    TokenInfo {
        symbol: "WMATIC",
        decimals: 18,
        decimal_overrides: &[],
        exposure_cap: 1_000_000,
        lending_buffer: 10_000,
        incentive_weight: 3,
        liquidation_path: &["WMATIC"],
        amm_path: None,
    },
    TokenInfo {
        symbol: "WAVAX",
        decimals: 18,
        decimal_overrides: &[],
        exposure_cap: 1_000_000,
        lending_buffer: 10_000,
        incentive_weight: 3,
        liquidation_path: &["WAVAX"],
        amm_path: None,
    },
    TokenInfo {
        symbol: "PNG",
        decimals: 18,
        decimal_overrides: &[],
        exposure_cap: 1_000_000,
        lending_buffer: 1,
        incentive_weight: 3,
        liquidation_path: &["PNG", "BASE"],
        amm_path: None,
    },
    TokenInfo {
        symbol: "AAVE",
        decimals: 18,
        decimal_overrides: &[],
        exposure_cap: 1_000_000,
        lending_buffer: 1,
        incentive_weight: 3,
        liquidation_path: &["AAVE", "BASE"],
        amm_path: None,
    },
];

// ============================================================================
// Per-network deployments
// ============================================================================

/// Ethereum mainnet
const MAINNET: NetworkConfig = NetworkConfig {
    chain_id: 1,
    name: "mainnet",
    base_symbol: "WETH",
    peg_symbol: "USDT",
    peg_decimals: 6,
    margin_contract: address!("9d4454b023096f34b160d6b654540c56a1f81688"),
    router: address!("b4e16d0168e52d35cacd2c6185b44281ec28c9dc"),
    alternate_liquidation: None,
    log_window: 10_000,
};

/// BNB Smart Chain. The primary contract on this deployment predates
/// the AMM-path argument, so liquidations route through the alternate
/// entry point.
const BSC: NetworkConfig = NetworkConfig {
    chain_id: 56,
    name: "bsc",
    base_symbol: "WBNB",
    peg_symbol: "USDT",
    peg_decimals: 18,
    margin_contract: address!("f1b63cd9d7f6f2b9eb3934b55089bd20d0a97b4d"),
    router: address!("c6c7b570a4e0b05dc3e0ea43878e3cc23ae97f21"),
    alternate_liquidation: Some(address!("3ed430c406a549eaa0976612b1d3b39c07b5b626")),
    log_window: 5_000,
};

/// Polygon PoS
const POLYGON: NetworkConfig = NetworkConfig {
    chain_id: 137,
    name: "polygon",
    base_symbol: "WMATIC",
    peg_symbol: "USDT",
    peg_decimals: 6,
    margin_contract: address!("41ae9256bfa2b7e241e9a1ae4ebbe47e16dfdc3b"),
    router: address!("2b8e690a7f14ab4a60ae909b041bd3f642e0317c"),
    alternate_liquidation: None,
    log_window: 3_500,
};

/// Avalanche C-Chain
const AVALANCHE: NetworkConfig = NetworkConfig {
    chain_id: 43114,
    name: "avalanche",
    base_symbol: "WAVAX",
    peg_symbol: "USDT",
    peg_decimals: 6,
    margin_contract: address!("905c11e42ae26c73c0ef6b5da34f2fcc3b9d4e4e"),
    router: address!("85995e88bc9f39d73c2ca2b847f16e2c0a1a0f26"),
    alternate_liquidation: None,
    log_window: 2_048,
};

/// Local hardhat fork of mainnet, for development.
const LOCAL: NetworkConfig = NetworkConfig {
    chain_id: 31337,
    name: "local",
    base_symbol: "WETH",
    peg_symbol: "USDT",
    peg_decimals: 6,
    margin_contract: address!("9d4454b023096f34b160d6b654540c56a1f81688"),
    router: address!("b4e16d0168e52d35cacd2c6185b44281ec28c9dc"),
    alternate_liquidation: None,
    log_window: 10_000,
};

const NETWORKS: &[&NetworkConfig] = &[&MAINNET, &BSC, &POLYGON, &AVALANCHE, &LOCAL];

/// Token address maps, keyed by chain id.
const TOKENS_PER_NETWORK: &[(u64, &[(&str, Address)])] = &[
    (
        1,
        &[
            ("DAI", address!("6b175474e89094c44da98b954eedeac495271d0f")),
            ("WETH", address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2")),
            ("UNI", address!("1f9840a85d5af5bf1d1762f925bdaddc4201f984")),
            ("MKR", address!("9f8f72aa9304c8b593d555f12ef6589cc3a579a2")),
            ("USDT", address!("dac17f958d2ee523a2206206994597c13d831ec7")),
            ("LINK", address!("514910771af9ca656af840dff83e8264ecf986ca")),
            ("USDC", address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48")),
            ("WBTC", address!("2260fac5e5542a773aa44fbcfedf7c193bc2c599")),
            ("SUSHI", address!("6b3595068778dd592e39a122f4f5a5cf09c90fe2")),
            ("ALCX", address!("dbdb4d16eda451d0503b854cf79d55697f90c8df")),
        ],
    ),
    (
        56,
        &[
            ("WBNB", address!("bb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c")),
            ("CAKE", address!("0e09fabb73bd3ade0a17ecc321fd13a19e81ce82")),
            ("ETH", address!("2170ed0880ac9a755fd29b2688956bd959f933f8")),
            ("USDC", address!("8ac76a51cc950d9822d68b83fe1ad97b32cd580d")),
            ("BUSD", address!("e9e7cea3dedca5984780bafc599bd69add087d56")),
            ("DAI", address!("1af3f329e8be154074d8769d1ffa4ee058b1dbc3")),
            ("BTCB", address!("7130d2a12b9bcbfae4f2634d864a1ee1ce3ead9c")),
            ("USDT", address!("55d398326f99059ff775485246999027b3197955")),
        ],
    ),
    (
        137,
        &[
            ("USDC", address!("2791bca1f2de4661ed88a30c99a7a9449aa84174")),
            ("WBTC", address!("1bfd67037b42cf73acf2047067bd4f2c47d9bfd6")),
            ("DAI", address!("8f3cf7ad23cd3cadbd9735aff958023239c6a063")),
            ("WETH", address!("7ceb23fd6bc0add59e62ac25578270cff1b9f619")),
            ("WMATIC", address!("0d500b1d8e8ef31e21c99d1db9a6444d3adf1270")),
            ("USDT", address!("c2132d05d31c914a87c6611c10748aeb04b58e8f")),
            ("LINK", address!("53e0bca35ec356bd5dddfebbd1fc0fd03fabad39")),
            ("AAVE", address!("d6df932a45c0f255f85145f286ea0b292b21c90b")),
        ],
    ),
    (
        43114,
        &[
            ("WAVAX", address!("b31f66aa3c1e785363f0875a1b74e27b85fd66c7")),
            ("ETH", address!("f20d962a6c8f70c731bd838a3a388d7d48fa6e15")),
            ("PNG", address!("60781c2586d68229fde47564546784ab3faca982")),
            ("WBTC", address!("408d4cd0adb7cebd1f1a1c33a0ba2098e1295bab")),
            ("USDT", address!("de3a24028580884448a5397872046a019649b084")),
        ],
    ),
    (
        31337,
        &[
            ("DAI", address!("6b175474e89094c44da98b954eedeac495271d0f")),
            ("WETH", address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2")),
            ("USDT", address!("dac17f958d2ee523a2206206994597c13d831ec7")),
            ("ALCX", address!("dbdb4d16eda451d0503b854cf79d55697f90c8df")),
            ("UNI", address!("1f9840a85d5af5bf1d1762f925bdaddc4201f984")),
        ],
    ),
];

// ============================================================================
// Registry
// ============================================================================

/// Immutable view of one network's tokens and contracts.
pub struct Registry {
    network: &'static NetworkConfig,
    tokens: BTreeMap<&'static str, Address>,
}

impl Registry {
    /// Build the registry for a chain id. `Config` error on an
    /// unknown network selector.
    pub fn for_network(chain_id: u64) -> Result<Self> {
        let network = NETWORKS
            .iter()
            .find(|n| n.chain_id == chain_id)
            .copied()
            .ok_or_else(|| BotError::config(format!("unsupported chain id {chain_id}")))?;

        let tokens = TOKENS_PER_NETWORK
            .iter()
            .find(|(id, _)| *id == chain_id)
            .map(|(_, entries)| entries.iter().copied().collect::<BTreeMap<_, _>>())
            .ok_or_else(|| BotError::config(format!("no token table for chain id {chain_id}")))?;

        Ok(Self { network, tokens })
    }

    pub fn network(&self) -> &'static NetworkConfig {
        self.network
    }

    /// Symbols registered on this network, in stable order.
    pub fn symbols(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tokens.keys().copied()
    }

    /// Address of a symbol on this network.
    pub fn token_address(&self, symbol: &str) -> Result<Address> {
        self.tokens.get(symbol).copied().ok_or_else(|| {
            BotError::config(format!(
                "token {symbol} has no address on {}",
                self.network.name
            ))
        })
    }

    /// Shared risk/routing parameters for a symbol.
    pub fn token_info(&self, symbol: &str) -> Result<&'static TokenInfo> {
        TOKEN_PARAMS
            .iter()
            .find(|t| t.symbol == symbol)
            .ok_or_else(|| BotError::config(format!("token {symbol} has no parameters")))
    }

    /// Decimals of a symbol, honoring per-network overrides.
    pub fn token_decimals(&self, symbol: &str) -> Result<u8> {
        let info = self.token_info(symbol)?;
        let decimals = info
            .decimal_overrides
            .iter()
            .find(|(chain, _)| *chain == self.network.chain_id)
            .map(|(_, d)| *d)
            .unwrap_or(info.decimals);
        Ok(decimals)
    }

    /// Full swap path for liquidating a token into the peg, as
    /// addresses: the configured hops with `BASE` resolved to the
    /// network base currency, terminated at the peg stable token.
    pub fn resolve_liquidation_path(&self, symbol: &str) -> Result<Vec<Address>> {
        let info = self.token_info(symbol)?;
        let mut path = Vec::with_capacity(info.liquidation_path.len() + 1);
        for hop in info.liquidation_path {
            let resolved = if *hop == BASE_PLACEHOLDER {
                self.network.base_symbol
            } else {
                hop
            };
            path.push(self.token_address(resolved)?);
        }
        path.push(self.token_address(self.network.peg_symbol)?);
        Ok(path)
    }

    /// Encoded AMM selector word for a token's path, defaulting to a
    /// single Uniswap hop.
    pub fn amm_selectors(&self, symbol: &str) -> Result<B256> {
        let info = self.token_info(symbol)?;
        encode_amm_path(info.amm_path.unwrap_or(DEFAULT_AMM_PATH))
    }

    /// One whole peg unit on this network.
    pub fn peg_unit(&self) -> U256 {
        self.network.peg_unit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_network_rejected() {
        assert!(matches!(
            Registry::for_network(42),
            Err(BotError::Config(_))
        ));
    }

    #[test]
    fn test_paths_end_at_peg_and_resolve_base() {
        for network in [1u64, 56, 137, 43114, 31337] {
            let registry = Registry::for_network(network).unwrap();
            let peg = registry
                .token_address(registry.network().peg_symbol)
                .unwrap();
            let base = registry
                .token_address(registry.network().base_symbol)
                .unwrap();

            for symbol in registry.symbols().collect::<Vec<_>>() {
                let path = registry.resolve_liquidation_path(symbol).unwrap();
                assert_eq!(*path.last().unwrap(), peg, "{symbol} on {network}");
                // BASE placeholder resolved: WETH on mainnet has path
                // [BASE] so its first hop must be the base address.
                if registry.token_info(symbol).unwrap().liquidation_path
                    == &[BASE_PLACEHOLDER][..]
                {
                    assert_eq!(path[0], base);
                }
            }
        }
    }

    #[test]
    fn test_amm_word_layout() {
        let word = encode_amm_path(&[Amm::Sushiswap, Amm::Uniswap, Amm::Sushiswap]).unwrap();
        assert_eq!(word[0], 1);
        assert_eq!(word[1], 0);
        assert_eq!(word[2], 1);
        // Zero fill to the right of the hops
        assert!(word[3..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_default_amm_path_is_single_uniswap() {
        let registry = Registry::for_network(1).unwrap();
        // DAI has no explicit AMM path
        let word = registry.amm_selectors("DAI").unwrap();
        assert_eq!(word, B256::ZERO);

        // SUSHI routes three Sushiswap hops
        let word = registry.amm_selectors("SUSHI").unwrap();
        assert_eq!(&word[..3], &[1, 1, 1]);
        assert!(word[3..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_amm_path_too_long_rejected() {
        let hops = [Amm::Uniswap; 33];
        assert!(encode_amm_path(&hops).is_err());
    }

    #[test]
    fn test_usdt_decimals_override_on_bsc() {
        let mainnet = Registry::for_network(1).unwrap();
        assert_eq!(mainnet.token_decimals("USDT").unwrap(), 6);

        let bsc = Registry::for_network(56).unwrap();
        assert_eq!(bsc.token_decimals("USDT").unwrap(), 18);
        assert_eq!(bsc.peg_unit(), pow10(18));
    }

    #[test]
    fn test_missing_symbol_is_config_error() {
        let avalanche = Registry::for_network(43114).unwrap();
        assert!(matches!(
            avalanche.token_address("SUSHI"),
            Err(BotError::Config(_))
        ));
    }
}
