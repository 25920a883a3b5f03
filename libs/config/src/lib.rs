//! # Sandwich Core Configuration
//!
//! Centralized configuration schema and loading for the MEV sandwich core:
//! per-chain provider/relay endpoints, gas/tip strategy selection, and the
//! global tuning knobs every chain worker shares.
//!
//! ## Features
//!
//! - **Schema**: [`schema::SandwichConfig`], one entry per chain plus global
//!   and feature-flag sections.
//! - **Loading**: [`loader::load`] reads a TOML file, expands `${VAR}` secrets
//!   from the environment, and validates the result.
//! - **Service Defaults**: [`service`] holds the retry/timeout/gas-strategy
//!   constants a chain config falls back to when a field is left unset.
//!
//! ## Usage
//!
//! ```no_run
//! use sandwich_config::load;
//! use std::path::Path;
//!
//! let config = load(Path::new("config/sandwich.toml")).unwrap();
//! for chain in &config.chains {
//!     println!("{:?}: {} providers", chain.chain, chain.providers.len());
//! }
//! ```

pub mod errors;
pub mod loader;
pub mod schema;
pub mod service;

pub use errors::ConfigError;
pub use loader::load;
pub use schema::{
    ChainConfig, ChainConfigRaw, FeatureFlags, GasMode, GlobalConfig, RelayEndpoint,
    SandwichConfig,
};
