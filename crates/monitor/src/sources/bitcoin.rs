use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use xchain_watch_domain::{Chain, Transaction};

use super::{SourceError, TransactionSource};

const PAGE_LIMIT: &str = "50";

#[derive(Debug, Deserialize)]
struct AddressFullResponse {
    #[serde(default)]
    txs: Vec<BlockCypherTx>,
}

#[derive(Debug, Deserialize)]
struct BlockCypherTx {
    hash: String,
    /// Satoshis moved by the transaction.
    total: u64,
    #[serde(default)]
    confirmed: Option<DateTime<Utc>>,
    #[serde(default)]
    received: Option<DateTime<Utc>>,
    #[serde(default)]
    inputs: Vec<TxIo>,
    #[serde(default)]
    outputs: Vec<TxIo>,
}

#[derive(Debug, Deserialize)]
struct TxIo {
    #[serde(default)]
    addresses: Option<Vec<String>>,
}

impl TxIo {
    fn first_address(&self) -> Option<&str> {
        self.addresses.as_ref()?.first().map(String::as_str)
    }
}

/// BlockCypher-style REST indexer for Bitcoin addresses.
#[derive(Debug)]
pub struct BlockCypherSource {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BlockCypherSource {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }
}

#[async_trait]
impl TransactionSource for BlockCypherSource {
    async fn address_transactions(&self, address: &str) -> Result<Vec<Transaction>, SourceError> {
        let url = format!("{}/addrs/{}/full", self.base_url, address);
        let mut request = self.http.get(url).query(&[("limit", PAGE_LIMIT)]);
        if let Some(token) = &self.token {
            request = request.query(&[("token", token.as_str())]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }

        let body: AddressFullResponse = response.json().await?;
        Ok(body.txs.into_iter().map(convert_tx).collect())
    }
}

/// Sender is the first input address and recipient the first output address.
fn convert_tx(tx: BlockCypherTx) -> Transaction {
    let from = tx
        .inputs
        .first()
        .and_then(TxIo::first_address)
        .unwrap_or_default()
        .to_string();
    let to = tx
        .outputs
        .first()
        .and_then(TxIo::first_address)
        .unwrap_or_default()
        .to_string();
    let timestamp = tx
        .confirmed
        .or(tx.received)
        .map(|at| at.timestamp())
        .unwrap_or_default();

    Transaction {
        chain: Chain::Btc,
        hash: tx.hash,
        from,
        to,
        value: tx.total.to_string(),
        timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "1FcXr8tDtXxQvuoXqC4sj5uQh5NNvZvfXu";

    const BODY: &str = r#"{
        "address": "1FcXr8tDtXxQvuoXqC4sj5uQh5NNvZvfXu",
        "txs": [
            {
                "hash": "f854aebae95150b379cc1187d848d58225f3c4157fe992bcd166f58bd5063449",
                "total": 70320221545,
                "confirmed": "2014-03-29T01:29:19Z",
                "received": "2014-03-29T01:20:00Z",
                "inputs": [{"addresses": ["1GbVUSW5WJmRCpaCJ4hanUny77oDaWW4to"]}],
                "outputs": [
                    {"addresses": ["1FcXr8tDtXxQvuoXqC4sj5uQh5NNvZvfXu"]},
                    {"addresses": null}
                ]
            },
            {
                "hash": "aa",
                "total": 1,
                "received": "2014-03-30T00:00:00Z",
                "inputs": [],
                "outputs": [{"addresses": null}]
            }
        ]
    }"#;

    #[test]
    fn converts_blockcypher_tx_into_transaction() {
        let body: AddressFullResponse = serde_json::from_str(BODY).unwrap();
        let txs: Vec<Transaction> = body.txs.into_iter().map(convert_tx).collect();

        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].chain, Chain::Btc);
        assert_eq!(txs[0].from, "1GbVUSW5WJmRCpaCJ4hanUny77oDaWW4to");
        assert_eq!(txs[0].to, ADDRESS);
        assert_eq!(txs[0].value, "70320221545");
        assert_eq!(txs[0].timestamp, 1_396_056_559);

        assert_eq!(txs[1].from, "");
        assert_eq!(txs[1].to, "");
        assert_eq!(txs[1].timestamp, 1_396_137_600);
    }

    #[tokio::test]
    async fn fetches_full_address_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", format!("/addrs/{ADDRESS}/full").as_str())
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("limit".into(), "50".into()),
                mockito::Matcher::UrlEncoded("token".into(), "secret".into()),
            ]))
            .with_status(200)
            .with_body(BODY)
            .create_async()
            .await;

        let source = BlockCypherSource::new(
            server.url(),
            Some("secret".to_string()),
            Duration::from_secs(2),
        )
        .unwrap();
        let txs = source.address_transactions(ADDRESS).await.expect("fetch ok");

        assert_eq!(txs.len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", mockito::Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let source = BlockCypherSource::new(server.url(), None, Duration::from_secs(2)).unwrap();
        let err = source.address_transactions(ADDRESS).await.unwrap_err();

        assert!(matches!(err, SourceError::Status(429)));
    }
}
