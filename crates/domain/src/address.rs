//! Address format detection for the addresses an operator asks us to watch.

use std::fmt;

use thiserror::Error;

use crate::model::Chain;

const BTC_MIN_LENGTH: usize = 26;
const BTC_MAX_LENGTH: usize = 35;
const EVM_HEX_LENGTH: usize = 40;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,
    #[error("unsupported address format: {0}")]
    Unrecognized(String),
}

/// An address whose chain has been inferred from its format.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MonitoredAddress {
    chain: Chain,
    value: String,
}

impl MonitoredAddress {
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(AddressError::Empty);
        }

        let chain = if is_valid_bitcoin_address(value) {
            Chain::Btc
        } else if is_valid_ethereum_address(value) {
            Chain::Eth
        } else {
            return Err(AddressError::Unrecognized(value.to_string()));
        };

        Ok(Self {
            chain,
            value: value.to_string(),
        })
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for MonitoredAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Length-only check; base58/bech32 checksums are not verified.
pub fn is_valid_bitcoin_address(address: &str) -> bool {
    if has_hex_prefix(address) {
        return false;
    }
    (BTC_MIN_LENGTH..=BTC_MAX_LENGTH).contains(&address.len())
        && address.chars().all(|c| c.is_ascii_alphanumeric())
}

pub fn is_valid_ethereum_address(address: &str) -> bool {
    if !has_hex_prefix(address) {
        return false;
    }
    let body = &address[2..];
    body.len() == EVM_HEX_LENGTH && body.chars().all(|c| c.is_ascii_hexdigit())
}

fn has_hex_prefix(address: &str) -> bool {
    address
        .get(..2)
        .map(|prefix| prefix.eq_ignore_ascii_case("0x"))
        .unwrap_or(false)
}
