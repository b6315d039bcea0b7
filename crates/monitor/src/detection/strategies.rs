use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use tracing::warn;
use xchain_watch_domain::{
    BridgeConfig, BridgeRegistry, CrossChainInfo, SwapStatus, Transaction, WrappedTokenRegistry,
    UNKNOWN_TARGET,
};

use super::DetectionError;
use crate::{decoder::PayloadDecoder, swap::SwapRegistryClient};

/// One way of recognizing a cross-chain transaction. Strategies must not
/// mutate shared state; the engine decides ordering and dedup.
#[async_trait]
pub trait DetectionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn try_match(&self, tx: &Transaction) -> Result<Option<CrossChainInfo>, DetectionError>;
}

/// Matches transfers sent to a known bridge contract on the bridge's source
/// chain.
pub struct BridgeContractStrategy {
    registry: Arc<BridgeRegistry>,
    decoder: Arc<dyn PayloadDecoder>,
}

impl BridgeContractStrategy {
    pub fn new(registry: Arc<BridgeRegistry>, decoder: Arc<dyn PayloadDecoder>) -> Self {
        Self { registry, decoder }
    }

    async fn target_address(
        &self,
        tx: &Transaction,
        bridge: &BridgeConfig,
    ) -> Result<String, DetectionError> {
        if !bridge.requires_payload_decode {
            return derive_target_address(tx, bridge);
        }

        match self.decoder.decode(tx, bridge.protocol).await {
            Ok(address) => Ok(address),
            Err(err) => {
                counter!(
                    "monitor_decode_failures_total",
                    "protocol" => bridge.protocol.to_string()
                )
                .increment(1);
                warn!(
                    hash = %tx.hash,
                    bridge = %bridge.name,
                    error = %err,
                    "payload decode failed; reporting unknown target"
                );
                Ok(UNKNOWN_TARGET.to_string())
            }
        }
    }
}

/// Chain-specific destination heuristics for bridges that carry no decodable
/// payload. No chain has one yet, so this always fails rather than guess.
fn derive_target_address(tx: &Transaction, bridge: &BridgeConfig) -> Result<String, DetectionError> {
    Err(DetectionError::NoDerivationRule {
        chain: tx.chain,
        bridge: bridge.name.clone(),
    })
}

#[async_trait]
impl DetectionStrategy for BridgeContractStrategy {
    fn name(&self) -> &'static str {
        "bridge_contract"
    }

    async fn try_match(&self, tx: &Transaction) -> Result<Option<CrossChainInfo>, DetectionError> {
        let Some(bridge) = self.registry.lookup(&tx.to, tx.chain) else {
            return Ok(None);
        };
        if bridge.source_chain != tx.chain {
            return Ok(None);
        }

        let target_address = self.target_address(tx, bridge).await?;
        Ok(Some(CrossChainInfo {
            source_chain: tx.chain,
            target_chain: bridge.target_chain,
            target_address,
            swap_id: tx.hash.clone(),
            status: SwapStatus::Pending,
            protocol: bridge.name.clone(),
        }))
    }
}

/// Matches transfers into a wrapped-token contract; the sender is assumed to
/// be the recipient on the original chain.
pub struct WrappedTokenStrategy {
    registry: Arc<WrappedTokenRegistry>,
}

impl WrappedTokenStrategy {
    pub fn new(registry: Arc<WrappedTokenRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl DetectionStrategy for WrappedTokenStrategy {
    fn name(&self) -> &'static str {
        "wrapped_token"
    }

    async fn try_match(&self, tx: &Transaction) -> Result<Option<CrossChainInfo>, DetectionError> {
        Ok(self
            .registry
            .lookup(&tx.to, tx.chain)
            .map(|token| CrossChainInfo {
                source_chain: tx.chain,
                target_chain: token.original_chain,
                target_address: tx.from.clone(),
                swap_id: tx.hash.clone(),
                status: SwapStatus::Completed,
                protocol: token.protocol_label(),
            }))
    }
}

pub struct SwapRegistryStrategy {
    client: Arc<dyn SwapRegistryClient>,
}

impl SwapRegistryStrategy {
    pub fn new(client: Arc<dyn SwapRegistryClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DetectionStrategy for SwapRegistryStrategy {
    fn name(&self) -> &'static str {
        "swap_registry"
    }

    async fn try_match(&self, tx: &Transaction) -> Result<Option<CrossChainInfo>, DetectionError> {
        Ok(self.client.check_swap(&tx.hash).await?)
    }
}
