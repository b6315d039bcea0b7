//! Domain-level building blocks shared by the monitor crate: the transaction
//! and cross-chain record model, address validation, the immutable bridge and
//! wrapped-token registries, configuration and telemetry wiring.

pub mod address;
pub mod config;
pub mod model;
pub mod registry;
pub mod services;

pub use address::{AddressError, MonitoredAddress};
pub use model::{
    is_valid_chain_pair, normalize_chain_name, normalize_status, Chain, CrossChainInfo,
    SwapStatus, Transaction, UNKNOWN_TARGET,
};
pub use registry::{
    BridgeConfig, BridgeProtocol, BridgeRegistry, WrappedToken, WrappedTokenRegistry,
};
pub use services::dedup::DedupSet;
