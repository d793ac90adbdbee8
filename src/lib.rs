//! Market Synth
//!
//! Synthetic financial-data generation for fraud-detection testing:
//! customer accounts, baseline trade ledgers, holdings reconciliation, and
//! controlled manipulation scenarios (wash trading, pump and dump, insider
//! trading) with ground-truth tags.

pub mod accounts;
pub mod assets;
pub mod config;
pub mod holdings;
pub mod scenarios;
pub mod store;
pub mod trades;
pub mod types;

pub use config::Config;
pub use types::*;
