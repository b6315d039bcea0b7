use tracing::{debug, info};
use xchain_watch_domain::{CrossChainInfo, Transaction};

/// Receives every evaluated transaction. Implementations handle their own
/// failures; nothing propagates back into the monitor loop.
pub trait ReportSink: Send + Sync {
    fn report(&self, tx: &Transaction, info: Option<&CrossChainInfo>);
}

/// Logs detections at `info` and plain transactions at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn report(&self, tx: &Transaction, info: Option<&CrossChainInfo>) {
        match info {
            Some(info) => info!(
                hash = %tx.hash,
                from = %tx.from,
                to = %tx.to,
                value = %tx.value,
                timestamp = tx.timestamp,
                source_chain = %info.source_chain,
                target_chain = %info.target_chain,
                target_address = %info.target_address,
                swap_id = %info.swap_id,
                protocol = %info.protocol,
                status = %info.status,
                "cross-chain transaction detected"
            ),
            None => debug!(hash = %tx.hash, chain = %tx.chain, "plain transaction"),
        }
    }
}

impl<T> ReportSink for std::sync::Arc<T>
where
    T: ReportSink + ?Sized,
{
    fn report(&self, tx: &Transaction, info: Option<&CrossChainInfo>) {
        (**self).report(tx, info)
    }
}
