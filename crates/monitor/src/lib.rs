//! Library entrypoint for the cross-chain monitor: transaction sources,
//! payload decoders, the swap registry client, the detection engine and the
//! per-address polling loop. The binary in `main.rs` wires these together
//! from environment configuration.

pub mod client;
pub mod decoder;
pub mod detection;
pub mod sink;
pub mod sources;
pub mod swap;
pub mod worker;


pub use decoder::{DecodeError, EvmPayloadDecoder, PayloadDecoder};
pub use detection::{Collaborators, DetectionEngine, DetectionError, DetectionStrategy, Evaluation};
pub use sink::{ReportSink, TracingSink};
pub use sources::{build_source, AlchemySource, BlockCypherSource, SourceError, TransactionSource};
pub use swap::{SwapRegistryClient, SwapRegistryError, ThorchainClient};
pub use worker::{
    build_collaborators, run_monitor, MonitorError, MonitorLoop, MonitorOutcome, PollError,
    PollSummary,
};
