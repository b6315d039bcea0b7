//! Ethereum JSON-RPC provider shared by the transfer source and the payload
//! decoder.

use std::time::Duration;

use ethers::providers::{Http, Provider};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderSetupError {
    #[error("invalid rpc url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Builds an HTTP provider whose requests give up after `timeout`.
pub fn http_provider(url: &str, timeout: Duration) -> Result<Provider<Http>, ProviderSetupError> {
    let endpoint = reqwest::Url::parse(url).map_err(|err| ProviderSetupError::InvalidUrl {
        url: url.to_string(),
        reason: err.to_string(),
    })?;
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Provider::new(Http::new_with_client(endpoint, client)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::providers::Middleware;
    use serde_json::json;

    #[tokio::test]
    async fn provider_posts_to_configured_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::PartialJson(json!({
                "jsonrpc": "2.0",
                "method": "eth_blockNumber"
            })))
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x10"}"#)
            .create_async()
            .await;

        let provider = http_provider(&server.url(), Duration::from_secs(2)).unwrap();
        let height = provider.get_block_number().await.expect("call succeeds");

        assert_eq!(height.as_u64(), 16);
        mock.assert_async().await;
    }

    #[test]
    fn rejects_malformed_urls() {
        let err = http_provider("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ProviderSetupError::InvalidUrl { .. }));
    }
}
