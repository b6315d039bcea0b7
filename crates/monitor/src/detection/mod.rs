//! Cross-chain detection engine.
//!
//! The engine owns the per-address dedup set and an ordered list of
//! [`DetectionStrategy`] objects. Each new transaction is marked as seen and
//! then offered to the strategies in order; the first match wins and no two
//! strategies ever contribute to the same record.

use std::sync::Arc;

use metrics::{counter, gauge};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use xchain_watch_domain::{
    BridgeRegistry, Chain, CrossChainInfo, DedupSet, Transaction, WrappedTokenRegistry,
};

use crate::{
    decoder::PayloadDecoder,
    swap::{SwapRegistryClient, SwapRegistryError},
};

mod strategies;

pub use strategies::{
    BridgeContractStrategy, DetectionStrategy, SwapRegistryStrategy, WrappedTokenStrategy,
};

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("bridge `{bridge}` on {chain} carries no payload and {chain} has no address derivation rule")]
    NoDerivationRule { chain: Chain, bridge: String },
    #[error("swap registry error: {0}")]
    SwapRegistry(#[from] SwapRegistryError),
    #[error("evaluation cancelled")]
    Cancelled,
}

impl DetectionError {
    /// Collaborator failures degrade to "no match" for the failing strategy;
    /// everything else ends the evaluation.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, DetectionError::SwapRegistry(_))
    }
}

/// Outcome of [`DetectionEngine::process`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// Hash was already evaluated by this engine.
    Duplicate,
    Plain,
    CrossChain(CrossChainInfo),
}

/// Shared, read-only collaborators used to assemble the standard strategy
/// chain. Cheap to clone; one instance can back many monitor loops.
#[derive(Clone)]
pub struct Collaborators {
    pub bridges: Arc<BridgeRegistry>,
    pub wrapped_tokens: Arc<WrappedTokenRegistry>,
    pub decoder: Arc<dyn PayloadDecoder>,
    pub swaps: Arc<dyn SwapRegistryClient>,
}

pub struct DetectionEngine {
    strategies: Vec<Box<dyn DetectionStrategy>>,
    dedup: DedupSet,
}

impl DetectionEngine {
    pub fn new(strategies: Vec<Box<dyn DetectionStrategy>>, dedup: DedupSet) -> Self {
        Self { strategies, dedup }
    }

    /// Bridge contract, then wrapped token, then swap registry.
    pub fn standard(collaborators: &Collaborators, dedup: DedupSet) -> Self {
        Self::new(
            vec![
                Box::new(BridgeContractStrategy::new(
                    collaborators.bridges.clone(),
                    collaborators.decoder.clone(),
                )),
                Box::new(WrappedTokenStrategy::new(
                    collaborators.wrapped_tokens.clone(),
                )),
                Box::new(SwapRegistryStrategy::new(collaborators.swaps.clone())),
            ],
            dedup,
        )
    }

    /// Marks `tx` as seen and evaluates it unless it was seen before.
    pub async fn process(
        &mut self,
        tx: &Transaction,
        cancel: &CancellationToken,
    ) -> Result<Evaluation, DetectionError> {
        if !self.dedup.mark(&tx.dedup_key()) {
            counter!("monitor_transactions_total", "result" => "duplicate").increment(1);
            return Ok(Evaluation::Duplicate);
        }
        gauge!("monitor_dedup_entries").set(self.dedup.len() as f64);

        match self.evaluate(tx, cancel).await? {
            Some(info) => {
                counter!("monitor_transactions_total", "result" => "cross_chain").increment(1);
                Ok(Evaluation::CrossChain(info))
            }
            None => {
                counter!("monitor_transactions_total", "result" => "plain").increment(1);
                Ok(Evaluation::Plain)
            }
        }
    }

    /// Runs the strategies in order without touching the dedup set.
    pub async fn evaluate(
        &self,
        tx: &Transaction,
        cancel: &CancellationToken,
    ) -> Result<Option<CrossChainInfo>, DetectionError> {
        for strategy in &self.strategies {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DetectionError::Cancelled),
                outcome = strategy.try_match(tx) => outcome,
            };

            match outcome {
                Ok(Some(info)) => {
                    debug!(hash = %tx.hash, strategy = strategy.name(), "strategy matched");
                    return Ok(Some(info));
                }
                Ok(None) => {}
                Err(err) if err.is_recoverable() => {
                    counter!("monitor_strategy_errors_total", "strategy" => strategy.name())
                        .increment(1);
                    warn!(
                        hash = %tx.hash,
                        strategy = strategy.name(),
                        error = %err,
                        "strategy failed; treating as no match"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        Ok(None)
    }

    pub fn has_seen(&self, tx: &Transaction) -> bool {
        self.dedup.contains(&tx.dedup_key())
    }

    pub fn seen_count(&self) -> u64 {
        self.dedup.len()
    }
}
