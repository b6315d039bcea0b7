//! Client for an external cross-chain swap index (THORChain-style).

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use xchain_watch_domain::{is_valid_chain_pair, Chain, CrossChainInfo, SwapStatus};

pub const THORCHAIN_PROTOCOL: &str = "THORChain";

#[derive(Debug, Error)]
pub enum SwapRegistryError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("swap registry returned status {0}")]
    Status(u16),
}

#[async_trait]
pub trait SwapRegistryClient: Send + Sync {
    /// `Ok(None)` when the registry has no record for `tx_hash` or the swap is
    /// not a supported chain pair.
    async fn check_swap(&self, tx_hash: &str) -> Result<Option<CrossChainInfo>, SwapRegistryError>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct ThorchainSwap {
    #[serde(default)]
    pub in_hash: String,
    #[serde(default)]
    pub out_hash: String,
    #[serde(default, rename = "from_address")]
    pub from: String,
    #[serde(default, rename = "to_address")]
    pub to: String,
    #[serde(default)]
    pub in_chain: String,
    #[serde(default)]
    pub out_chain: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

impl ThorchainSwap {
    /// Normalized record for BTC<->ETH swaps; other pairs are ignored.
    pub fn into_cross_chain_info(self) -> Option<CrossChainInfo> {
        if !is_valid_chain_pair(&self.in_chain, &self.out_chain) {
            return None;
        }
        let source_chain = Chain::from_str(self.in_chain.trim()).ok()?;
        let target_chain = Chain::from_str(self.out_chain.trim()).ok()?;

        Some(CrossChainInfo {
            source_chain,
            target_chain,
            target_address: self.to,
            swap_id: self.out_hash,
            status: SwapStatus::normalize(&self.status),
            protocol: THORCHAIN_PROTOCOL.to_string(),
        })
    }
}

#[derive(Debug)]
pub struct ThorchainClient {
    http: reqwest::Client,
    base_url: String,
}

impl ThorchainClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SwapRegistryError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SwapRegistryClient for ThorchainClient {
    async fn check_swap(&self, tx_hash: &str) -> Result<Option<CrossChainInfo>, SwapRegistryError> {
        let url = format!("{}/swaps/{}", self.base_url, tx_hash);
        let response = self.http.get(url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            StatusCode::OK => {}
            other => return Err(SwapRegistryError::Status(other.as_u16())),
        }

        let swap: ThorchainSwap = response.json().await?;
        Ok(swap.into_cross_chain_info())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(server: &mockito::Server) -> ThorchainClient {
        ThorchainClient::new(server.url(), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn maps_known_btc_to_eth_swap() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/swaps/0xabc")
            .with_status(200)
            .with_body(
                r#"{
                    "in_hash": "0xabc",
                    "out_hash": "0xdef",
                    "from_address": "1BoatSLRHtKNngkdXEeobR76b53LETtpyT",
                    "to_address": "0x00000000000000000000000000000000000000bb",
                    "in_chain": "bitcoin",
                    "out_chain": "ETH",
                    "status": "success",
                    "type": "swap"
                }"#,
            )
            .create_async()
            .await;

        let info = client(&server)
            .check_swap("0xabc")
            .await
            .expect("request ok")
            .expect("swap known");

        assert_eq!(info.source_chain, Chain::Btc);
        assert_eq!(info.target_chain, Chain::Eth);
        assert_eq!(info.swap_id, "0xdef");
        assert_eq!(info.status, SwapStatus::Completed);
        assert_eq!(info.protocol, "THORChain");
        assert_eq!(info.target_address, "0x00000000000000000000000000000000000000bb");
    }

    #[tokio::test]
    async fn not_found_is_not_a_swap() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/swaps/0x404")
            .with_status(404)
            .create_async()
            .await;

        let result = client(&server).check_swap("0x404").await.expect("404 is ok");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn unsupported_pair_is_ignored() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/swaps/0x1")
            .with_status(200)
            .with_body(r#"{"in_chain": "ETH", "out_chain": "BNB", "status": "pending"}"#)
            .create_async()
            .await;

        assert!(client(&server).check_swap("0x1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn records_without_chains_are_ignored() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/swaps/0x2")
            .with_status(200)
            .with_body(r#"{"status": "success", "to_address": "0xdead"}"#)
            .create_async()
            .await;

        let result = client(&server)
            .check_swap("0x2")
            .await
            .expect("missing chains are not an error");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn server_errors_surface() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/swaps/0x500")
            .with_status(503)
            .create_async()
            .await;

        let err = client(&server).check_swap("0x500").await.unwrap_err();
        assert!(matches!(err, SwapRegistryError::Status(503)));
    }
}
