use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, histogram};
use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use xchain_watch_domain::{
    config::{BootstrapConfig, ConfigError, DEFAULT_POLL_INTERVAL_SECS},
    services::telemetry::TelemetryError,
    AddressError, BridgeRegistry, DedupSet, MonitoredAddress, WrappedTokenRegistry,
};

use crate::{
    client::ProviderSetupError,
    decoder::EvmPayloadDecoder,
    detection::{Collaborators, DetectionEngine, DetectionError, Evaluation},
    sink::{ReportSink, TracingSink},
    sources::{build_source, SourceError, TransactionSource},
    swap::{SwapRegistryError, ThorchainClient},
};

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid monitor address: {0}")]
    Address(#[from] AddressError),
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("ethereum provider error: {0}")]
    Provider(#[from] ProviderSetupError),
    #[error("swap registry error: {0}")]
    SwapRegistry(#[from] SwapRegistryError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("monitor task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// How a monitor loop ended. Cancellation is the only way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorOutcome {
    Cancelled,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollSummary {
    pub fetched: usize,
    pub duplicates: usize,
    pub plain: usize,
    pub cross_chain: usize,
    pub failed: usize,
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    #[error("poll cancelled")]
    Cancelled,
}

/// Periodic poller for one address. Constructing it is the idle state;
/// [`MonitorLoop::run`] consumes it and returns once cancelled.
pub struct MonitorLoop<S, R> {
    address: MonitoredAddress,
    source: S,
    engine: DetectionEngine,
    sink: R,
    poll_interval: Duration,
}

impl<S, R> MonitorLoop<S, R>
where
    S: TransactionSource,
    R: ReportSink,
{
    pub fn new(address: MonitoredAddress, source: S, engine: DetectionEngine, sink: R) -> Self {
        Self {
            address,
            source,
            engine,
            sink,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn address(&self) -> &MonitoredAddress {
        &self.address
    }

    /// Polls immediately, then once per interval until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) -> MonitorOutcome {
        info!(
            address = %self.address,
            chain = %self.address.chain(),
            interval_secs = self.poll_interval.as_secs(),
            "monitor started"
        );

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.poll_once(&cancel).await {
                Ok(summary) => {
                    counter!("monitor_polls_total", "result" => "ok").increment(1);
                    if summary.cross_chain > 0 || summary.failed > 0 {
                        info!(address = %self.address, ?summary, "poll finished");
                    }
                }
                Err(PollError::Cancelled) => break,
                Err(PollError::Source(err)) => {
                    counter!("monitor_polls_total", "result" => "error").increment(1);
                    warn!(address = %self.address, error = %err, "transaction fetch failed");
                }
            }
        }

        info!(
            address = %self.address,
            seen = self.engine.seen_count(),
            "monitor stopped"
        );
        MonitorOutcome::Cancelled
    }

    /// Fetches the address's transactions and evaluates the unseen ones in
    /// source order.
    pub async fn poll_once(&mut self, cancel: &CancellationToken) -> Result<PollSummary, PollError> {
        let transactions = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PollError::Cancelled),
            fetched = self.source.address_transactions(self.address.as_str()) => fetched?,
        };
        histogram!("monitor_batch_entries").record(transactions.len() as f64);

        let mut summary = PollSummary {
            fetched: transactions.len(),
            ..PollSummary::default()
        };

        for tx in &transactions {
            match self.engine.process(tx, cancel).await {
                Ok(Evaluation::Duplicate) => summary.duplicates += 1,
                Ok(Evaluation::Plain) => {
                    summary.plain += 1;
                    self.sink.report(tx, None);
                }
                Ok(Evaluation::CrossChain(info)) => {
                    summary.cross_chain += 1;
                    self.sink.report(tx, Some(&info));
                }
                Err(DetectionError::Cancelled) => return Err(PollError::Cancelled),
                Err(err) => {
                    summary.failed += 1;
                    counter!("monitor_transactions_total", "result" => "failed").increment(1);
                    warn!(hash = %tx.hash, error = %err, "evaluation failed");
                }
            }
        }

        Ok(summary)
    }
}

/// Builds the shared registries and HTTP collaborators from configuration.
pub fn build_collaborators(config: &BootstrapConfig) -> Result<Collaborators, MonitorError> {
    let timeout = config.request_timeout();
    Ok(Collaborators {
        bridges: Arc::new(BridgeRegistry::mainnet()),
        wrapped_tokens: Arc::new(WrappedTokenRegistry::mainnet()),
        decoder: Arc::new(EvmPayloadDecoder::new(config.ethereum_rpc_url(), timeout)?),
        swaps: Arc::new(ThorchainClient::new(config.thorchain_api_url(), timeout)?),
    })
}

/// Validates every configured address, then runs one loop per address until
/// `cancel` fires. Address errors surface before any loop starts.
pub async fn run_monitor(
    config: BootstrapConfig,
    cancel: CancellationToken,
) -> Result<(), MonitorError> {
    let addresses = config
        .monitor_addresses()
        .iter()
        .map(|raw| MonitoredAddress::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let collaborators = build_collaborators(&config)?;
    let sink = Arc::new(TracingSink);

    let mut tasks = JoinSet::new();
    for address in addresses {
        let source = build_source(&address, &config)?;
        let engine = DetectionEngine::standard(
            &collaborators,
            DedupSet::from_capacity(config.dedup_capacity()),
        );
        let monitor = MonitorLoop::new(address, source, engine, sink.clone())
            .with_poll_interval(config.poll_interval());
        tasks.spawn(monitor.run(cancel.clone()));
    }

    while let Some(joined) = tasks.join_next().await {
        joined?;
    }
    Ok(())
}
