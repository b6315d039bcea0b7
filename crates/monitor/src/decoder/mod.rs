//! Protocol-specific extraction of the destination address from bridge
//! transactions.

use std::time::Duration;

use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider, ProviderError};
use ethers::types::{Address, TxHash};
use thiserror::Error;
use xchain_watch_domain::{BridgeProtocol, Transaction};

use crate::client::{http_provider, ProviderSetupError};

pub mod abi;

use abi::{decode_log_destination, decode_wbtc_burn};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("rpc error: {0}")]
    Rpc(#[from] ProviderError),
    #[error("`{0}` is not a transaction hash")]
    InvalidHash(String),
    #[error("transaction {0} not found")]
    TransactionNotFound(String),
    #[error("call data too short ({0} bytes)")]
    InputTooShort(usize),
    #[error("call data does not match `{expected}`")]
    SelectorMismatch { expected: &'static str },
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("destination address not present in payload")]
    MissingDestination,
}

#[async_trait]
pub trait PayloadDecoder: Send + Sync {
    /// Destination address on the bridge's target chain.
    async fn decode(
        &self,
        tx: &Transaction,
        protocol: BridgeProtocol,
    ) -> Result<String, DecodeError>;
}

/// Fetches call data (and receipt logs when the protocol needs them) from an
/// Ethereum JSON-RPC node.
#[derive(Debug)]
pub struct EvmPayloadDecoder {
    provider: Provider<Http>,
}

impl EvmPayloadDecoder {
    pub fn new(rpc_url: &str, timeout: Duration) -> Result<Self, ProviderSetupError> {
        Ok(Self {
            provider: http_provider(rpc_url, timeout)?,
        })
    }

    async fn call_data(&self, hash: &str) -> Result<Vec<u8>, DecodeError> {
        let tx = self
            .provider
            .get_transaction(parse_hash(hash)?)
            .await?
            .ok_or_else(|| DecodeError::TransactionNotFound(hash.to_string()))?;
        Ok(tx.input.to_vec())
    }

    async fn destination_from_logs(
        &self,
        hash: &str,
        protocol: BridgeProtocol,
    ) -> Result<String, DecodeError> {
        let contract: Address = protocol.log_contract().parse().map_err(|_| {
            DecodeError::Malformed(format!("bad log contract for {protocol}"))
        })?;
        let receipt = self
            .provider
            .get_transaction_receipt(parse_hash(hash)?)
            .await?
            .ok_or_else(|| DecodeError::TransactionNotFound(hash.to_string()))?;
        decode_log_destination(&receipt.logs, contract)
    }
}

fn parse_hash(hash: &str) -> Result<TxHash, DecodeError> {
    hash.parse()
        .map_err(|_| DecodeError::InvalidHash(hash.to_string()))
}

#[async_trait]
impl PayloadDecoder for EvmPayloadDecoder {
    async fn decode(
        &self,
        tx: &Transaction,
        protocol: BridgeProtocol,
    ) -> Result<String, DecodeError> {
        if protocol.needs_receipt_logs() {
            return self.destination_from_logs(&tx.hash, protocol).await;
        }

        let input = self.call_data(&tx.hash).await?;
        match protocol {
            BridgeProtocol::Wbtc => decode_wbtc_burn(&input),
            other => Err(DecodeError::Malformed(format!(
                "no call-data decoder for {other}"
            ))),
        }
    }
}
