use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ethers::providers::{Http, Provider};
use serde::{Deserialize, Serialize};
use serde_json::{json, value::RawValue};
use xchain_watch_domain::{Chain, Transaction};

use super::{SourceError, TransactionSource};
use crate::client::http_provider;

const TRANSFER_CATEGORIES: [&str; 5] = ["external", "internal", "erc20", "erc721", "erc1155"];
/// 1000 transfers per call.
const MAX_COUNT: &str = "0x3e8";

#[derive(Debug, Serialize, Deserialize)]
struct AssetTransfersResult {
    #[serde(default)]
    transfers: Vec<AssetTransfer>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AssetTransfer {
    hash: String,
    from: String,
    #[serde(default)]
    to: Option<String>,
    /// Decimal amount exactly as the indexer wrote it.
    #[serde(default)]
    value: Option<Box<RawValue>>,
    #[serde(default)]
    metadata: Option<TransferMetadata>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferMetadata {
    #[serde(default)]
    block_timestamp: Option<DateTime<Utc>>,
}

/// Alchemy `alchemy_getAssetTransfers` indexer for outgoing Ethereum
/// transfers.
#[derive(Debug)]
pub struct AlchemySource {
    provider: Provider<Http>,
}

impl AlchemySource {
    pub fn new(rpc_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            provider: http_provider(rpc_url, timeout)?,
        })
    }
}

#[async_trait]
impl TransactionSource for AlchemySource {
    async fn address_transactions(&self, address: &str) -> Result<Vec<Transaction>, SourceError> {
        let params = json!([{
            "fromAddress": address,
            "category": TRANSFER_CATEGORIES,
            "maxCount": MAX_COUNT,
            "withMetadata": true,
        }]);

        let result: AssetTransfersResult = self
            .provider
            .request("alchemy_getAssetTransfers", params)
            .await?;
        let fetched_at = Utc::now().timestamp();
        Ok(result
            .transfers
            .into_iter()
            .map(|transfer| convert_transfer(transfer, fetched_at))
            .collect())
    }
}

/// Transfers without a block timestamp are stamped with `fetched_at`.
fn convert_transfer(transfer: AssetTransfer, fetched_at: i64) -> Transaction {
    let timestamp = transfer
        .metadata
        .and_then(|metadata| metadata.block_timestamp)
        .map(|at| at.timestamp())
        .unwrap_or(fetched_at);

    Transaction {
        chain: Chain::Eth,
        hash: transfer.hash,
        from: transfer.from,
        to: transfer.to.unwrap_or_default(),
        value: transfer_value(transfer.value.as_deref()),
        timestamp,
    }
}

/// Copies the literal digits; quoted amounts lose their quotes.
fn transfer_value(raw: Option<&RawValue>) -> String {
    raw.map(|raw| raw.get().trim().trim_matches('"'))
        .filter(|text| !text.is_empty() && *text != "null")
        .unwrap_or("0")
        .to_string()
}
