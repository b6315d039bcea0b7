//! Shared service helpers such as transaction dedup and telemetry wiring.

pub mod dedup;
pub mod telemetry;

pub use dedup::*;
pub use telemetry::*;
