//! Static lookup tables for bridge contracts and wrapped tokens.
//!
//! Both registries are built once and never mutated afterwards, so they can be
//! shared behind an `Arc` by any number of monitor loops without locking.

use std::collections::HashMap;

use strum_macros::{AsRefStr, Display};

use crate::model::Chain;

/// Bridge protocols with a dedicated payload decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum BridgeProtocol {
    #[strum(to_string = "WBTC")]
    Wbtc,
    #[strum(to_string = "RenBridge")]
    RenBridge,
}

impl BridgeProtocol {
    /// RenBridge only reveals the destination in the receipt logs; WBTC burns
    /// carry it in the call data.
    pub fn needs_receipt_logs(self) -> bool {
        matches!(self, BridgeProtocol::RenBridge)
    }

    /// Contract whose logs carry the destination for log-based protocols.
    pub fn log_contract(self) -> &'static str {
        match self {
            BridgeProtocol::Wbtc => WBTC_CONTRACT,
            BridgeProtocol::RenBridge => RENBRIDGE_CONTRACT,
        }
    }
}

pub const WBTC_CONTRACT: &str = "0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599";
pub const RENBRIDGE_CONTRACT: &str = "0x3ee18B2214AFF97000D974cf647E7C347E8fa585";
pub const RENBRIDGE_BTC_GATEWAY: &str = "1FcXr8tDtXxQvuoXqC4sj5uQh5NNvZvfXu";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub name: String,
    pub source_chain: Chain,
    pub target_chain: Chain,
    pub protocol: BridgeProtocol,
    pub requires_payload_decode: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BridgeRegistry {
    entries: HashMap<String, BridgeConfig>,
}

impl BridgeRegistry {
    /// Builds a registry from `(address, config)` pairs. Addresses are keyed
    /// using the normalization of the bridge's source chain.
    pub fn new<I, A>(entries: I) -> Self
    where
        I: IntoIterator<Item = (A, BridgeConfig)>,
        A: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|(address, config)| {
                (
                    config.source_chain.normalize_address(address.as_ref()),
                    config,
                )
            })
            .collect();
        Self { entries }
    }

    /// Known mainnet BTC<->ETH bridges.
    pub fn mainnet() -> Self {
        Self::new([
            (
                WBTC_CONTRACT,
                BridgeConfig {
                    name: "WBTC".to_string(),
                    source_chain: Chain::Eth,
                    target_chain: Chain::Btc,
                    protocol: BridgeProtocol::Wbtc,
                    requires_payload_decode: true,
                },
            ),
            (
                RENBRIDGE_CONTRACT,
                BridgeConfig {
                    name: "RenBridge".to_string(),
                    source_chain: Chain::Eth,
                    target_chain: Chain::Btc,
                    protocol: BridgeProtocol::RenBridge,
                    requires_payload_decode: true,
                },
            ),
            (
                RENBRIDGE_BTC_GATEWAY,
                BridgeConfig {
                    name: "RenBridge-BTC".to_string(),
                    source_chain: Chain::Btc,
                    target_chain: Chain::Eth,
                    protocol: BridgeProtocol::RenBridge,
                    requires_payload_decode: false,
                },
            ),
        ])
    }

    pub fn lookup(&self, address: &str, chain: Chain) -> Option<&BridgeConfig> {
        self.entries.get(&chain.normalize_address(address))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A token on `host_chain` representing an asset locked on `original_chain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedToken {
    pub symbol: String,
    pub host_chain: Chain,
    pub original_chain: Chain,
}

impl WrappedToken {
    pub fn protocol_label(&self) -> String {
        format!("{} Wrapping", self.symbol)
    }
}

#[derive(Debug, Clone, Default)]
pub struct WrappedTokenRegistry {
    entries: HashMap<String, WrappedToken>,
}

impl WrappedTokenRegistry {
    pub fn new<I, A>(entries: I) -> Self
    where
        I: IntoIterator<Item = (A, WrappedToken)>,
        A: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|(address, token)| (token.host_chain.normalize_address(address.as_ref()), token))
            .collect();
        Self { entries }
    }

    /// BTC-backed tokens on Ethereum. WBTC itself is handled as a bridge.
    pub fn mainnet() -> Self {
        let btc_on_eth = |symbol: &str| WrappedToken {
            symbol: symbol.to_string(),
            host_chain: Chain::Eth,
            original_chain: Chain::Btc,
        };
        Self::new([
            ("0xEB4C2781e4ebA804CE9a9803C67d0893436bB27D", btc_on_eth("renBTC")),
            ("0x0316EB71485b0Ab14103307bf65a021042c6d380", btc_on_eth("HBTC")),
            ("0x18084fbA666a33d37592fA2633fD49a74DD93a88", btc_on_eth("tBTC")),
        ])
    }

    /// Matches only tokens hosted on `chain`.
    pub fn lookup(&self, address: &str, chain: Chain) -> Option<&WrappedToken> {
        self.entries
            .get(&chain.normalize_address(address))
            .filter(|token| token.host_chain == chain)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
