//! Data structures shared by the detection engine and its collaborators.

use std::fmt;
use std::str::FromStr;

use strum_macros::{AsRefStr, Display, EnumString};

/// Placeholder used when a bridge is detected but the destination address
/// could not be recovered from the payload.
pub const UNKNOWN_TARGET: &str = "Unknown";

/// Chains the monitor understands. Parsing accepts both ticker and long
/// names in any case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(ascii_case_insensitive)]
pub enum Chain {
    #[strum(to_string = "BTC", serialize = "BITCOIN")]
    Btc,
    #[strum(to_string = "ETH", serialize = "ETHEREUM")]
    Eth,
}

impl Chain {
    /// Addresses on EVM-style chains are hex and compared without regard to
    /// checksum casing.
    pub fn is_evm(self) -> bool {
        matches!(self, Chain::Eth)
    }

    /// Canonical comparison key for an address on this chain.
    pub fn normalize_address(self, address: &str) -> String {
        let trimmed = address.trim();
        if self.is_evm() {
            trimmed.to_ascii_lowercase()
        } else {
            trimmed.to_string()
        }
    }
}

/// Maps free-form chain names onto the canonical ticker. Names that are not
/// recognized come back upper-cased but otherwise untouched.
pub fn normalize_chain_name(chain: &str) -> String {
    match Chain::from_str(chain.trim()) {
        Ok(chain) => chain.to_string(),
        Err(_) => chain.trim().to_ascii_uppercase(),
    }
}

/// Only BTC<->ETH legs are tracked.
pub fn is_valid_chain_pair(in_chain: &str, out_chain: &str) -> bool {
    matches!(
        (
            Chain::from_str(in_chain.trim()),
            Chain::from_str(out_chain.trim())
        ),
        (Ok(Chain::Btc), Ok(Chain::Eth)) | (Ok(Chain::Eth), Ok(Chain::Btc))
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum SwapStatus {
    Pending,
    Completed,
    Failed,
    Unknown,
}

impl SwapStatus {
    /// Case-folds a collaborator-supplied status string. `COMPLETED` is
    /// accepted alongside `COMPLETE`/`SUCCESS` so that feeding our own
    /// output back in is a no-op.
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING" => SwapStatus::Pending,
            "COMPLETE" | "COMPLETED" | "SUCCESS" => SwapStatus::Completed,
            "FAILED" => SwapStatus::Failed,
            _ => SwapStatus::Unknown,
        }
    }
}

/// Convenience wrapper returning the display form of [`SwapStatus::normalize`].
pub fn normalize_status(raw: &str) -> String {
    SwapStatus::normalize(raw).to_string()
}

/// A chain-native transaction touching the monitored address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub chain: Chain,
    pub hash: String,
    pub from: String,
    pub to: String,
    /// Decimal amount as reported by the source, kept as text to avoid
    /// float rounding.
    pub value: String,
    /// Unix seconds.
    pub timestamp: i64,
}

impl Transaction {
    /// Recipient normalized for registry lookups on this transaction's chain.
    pub fn normalized_to(&self) -> String {
        self.chain.normalize_address(&self.to)
    }

    /// Key used by the dedup set; hashes are unique within a chain.
    pub fn dedup_key(&self) -> String {
        self.chain.normalize_address(&self.hash)
    }
}

/// Emitted once per detected cross-chain transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossChainInfo {
    pub source_chain: Chain,
    pub target_chain: Chain,
    pub target_address: String,
    pub swap_id: String,
    pub status: SwapStatus,
    pub protocol: String,
}

impl CrossChainInfo {
    pub fn has_known_target(&self) -> bool {
        self.target_address != UNKNOWN_TARGET
    }
}

impl fmt::Display for CrossChainInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}->{} to {} ({})",
            self.protocol, self.source_chain, self.target_chain, self.target_address, self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_parsing_accepts_aliases_in_any_case() {
        assert_eq!(Chain::from_str("bitcoin").unwrap(), Chain::Btc);
        assert_eq!(Chain::from_str("Ethereum").unwrap(), Chain::Eth);
        assert_eq!(Chain::from_str("eth").unwrap(), Chain::Eth);
        assert!(Chain::from_str("doge").is_err());
        assert_eq!(Chain::Btc.to_string(), "BTC");
    }

    #[test]
    fn chain_name_normalization() {
        assert_eq!(normalize_chain_name("BITCOIN"), "BTC");
        assert_eq!(normalize_chain_name("ethereum"), "ETH");
        assert_eq!(normalize_chain_name("bnb"), "BNB");
    }

    #[test]
    fn status_normalization_is_case_insensitive_and_idempotent() {
        assert_eq!(normalize_status("success"), "Completed");
        assert_eq!(normalize_status("COMPLETE"), "Completed");
        assert_eq!(normalize_status("success"), normalize_status("COMPLETE"));
        assert_eq!(normalize_status("pending"), "Pending");
        assert_eq!(normalize_status("Failed"), "Failed");
        assert_eq!(normalize_status("refunded"), "Unknown");

        for raw in ["pending", "success", "failed", "weird"] {
            let once = normalize_status(raw);
            assert_eq!(normalize_status(&once), once);
        }
    }

    #[test]
    fn only_btc_eth_pairs_are_valid() {
        assert!(is_valid_chain_pair("ETH", "BTC"));
        assert!(is_valid_chain_pair("bitcoin", "ethereum"));
        assert!(!is_valid_chain_pair("ETH", "ETH"));
        assert!(!is_valid_chain_pair("BTC", "BNB"));
    }

    #[test]
    fn evm_addresses_normalize_to_lowercase() {
        assert_eq!(
            Chain::Eth.normalize_address("0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599"),
            "0x2260fac5e5542a773aa44fbcfedf7c193bc2c599"
        );
        assert_eq!(
            Chain::Btc.normalize_address("1FcXr8tDtXxQvuoXqC4sj5uQh5NNvZvfXu"),
            "1FcXr8tDtXxQvuoXqC4sj5uQh5NNvZvfXu"
        );
    }
}
