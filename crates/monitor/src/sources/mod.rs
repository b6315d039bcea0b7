//! Per-chain transaction sources. Each implementation turns an indexer's
//! response into the normalized [`Transaction`] list the engine consumes.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::providers::ProviderError;
use thiserror::Error;
use xchain_watch_domain::{config::BootstrapConfig, Chain, MonitoredAddress, Transaction};

use crate::client::ProviderSetupError;

mod bitcoin;
mod ethereum;

pub use bitcoin::BlockCypherSource;
pub use ethereum::AlchemySource;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("indexer returned status {0}")]
    Status(u16),
    #[error("rpc error: {0}")]
    Rpc(#[from] ProviderError),
    #[error("provider setup failed: {0}")]
    Setup(#[from] ProviderSetupError),
}

#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Transactions touching `address`, in the order the indexer returns them.
    async fn address_transactions(&self, address: &str) -> Result<Vec<Transaction>, SourceError>;
}

#[async_trait]
impl<T> TransactionSource for Arc<T>
where
    T: TransactionSource + ?Sized,
{
    async fn address_transactions(&self, address: &str) -> Result<Vec<Transaction>, SourceError> {
        (**self).address_transactions(address).await
    }
}

/// Picks the indexer matching the address format.
pub fn build_source(
    address: &MonitoredAddress,
    config: &BootstrapConfig,
) -> Result<Arc<dyn TransactionSource>, SourceError> {
    let timeout = config.request_timeout();
    let source: Arc<dyn TransactionSource> = match address.chain() {
        Chain::Btc => Arc::new(BlockCypherSource::new(
            config.bitcoin_api_url(),
            config.blockcypher_token().map(str::to_string),
            timeout,
        )?),
        Chain::Eth => Arc::new(AlchemySource::new(config.ethereum_rpc_url(), timeout)?),
    };
    Ok(source)
}
