//! TradeFlow Agents - baseline stage functions
//!
//! Provides a deterministic implementation of the seven stage functions the
//! orchestrator sequences:
//! - Outputs seeded from a SHA-256 digest of the stage input
//! - Optional simulated latency per call
//! - Configurable import tax rate and currency

pub mod baseline;
pub mod catalog;
pub mod config;
pub mod seed;

// Re-export key types
pub use baseline::BaselineAgents;
pub use config::BaselineConfig;
pub use seed::Seed;
