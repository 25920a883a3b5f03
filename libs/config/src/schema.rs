//! Structured configuration matching the recognized options: `chains`,
//! `global`, `features`.

use crate::errors::ConfigError;
use sandwich_types::{Bps, ChainId, NativeAmount, RelayName};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GasMode {
    Conservative,
    Adaptive,
    Aggressive,
}

/// A relay endpoint this chain submits bundles to. `url` and `auth_key_env`
/// may contain `${VAR}` placeholders expanded by [`crate::loader::load`]
/// from the environment, per the "secrets only via env vars" rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayEndpoint {
    pub relay: RelayName,
    pub url: String,
    pub auth_key_env: Option<String>,
}

/// Wire format for one chain's config block. Numeric on-chain amounts are
/// carried as strings because `NativeAmount` is an `i128` and TOML's
/// integer type is only 64 bits wide.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainConfigRaw {
    pub chain: ChainId,
    pub providers: Vec<String>,
    #[serde(default)]
    pub relay_endpoints: Vec<RelayEndpoint>,
    pub min_profit_native: String,
    pub min_priority: f64,
    pub max_front_run_fraction_bps: u32,
    pub gas_mode: GasMode,
    pub bundle_timeout_ms: Option<u64>,
    pub max_tax_bps: u32,
}

/// Per-chain configuration, resolved into domain types and validated.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub chain: ChainId,
    pub providers: Vec<String>,
    pub relay_endpoints: Vec<RelayEndpoint>,
    pub min_profit_native: NativeAmount,
    pub min_priority: f64,
    pub max_front_run_fraction: Bps,
    pub gas_mode: GasMode,
    pub bundle_timeout_ms: u64,
    pub max_tax_bps: Bps,
}

fn default_bundle_timeout_ms(chain: ChainId) -> u64 {
    use crate::service::timeouts;
    match chain {
        ChainId::Ethereum => timeouts::BUNDLE_TIMEOUT_MS_ETHEREUM,
        ChainId::Bsc => timeouts::BUNDLE_TIMEOUT_MS_BSC,
        ChainId::Solana => timeouts::BUNDLE_TIMEOUT_MS_SOLANA,
    }
}

impl ChainConfigRaw {
    pub(crate) fn into_domain(self) -> Result<ChainConfig, ConfigError> {
        let min_profit_native = self
            .min_profit_native
            .parse::<i128>()
            .map(NativeAmount::new)
            .map_err(|_| ConfigError::InvalidAmount {
                chain: self.chain,
                field: "min_profit_native",
                value: self.min_profit_native.clone(),
            })?;

        if self.max_front_run_fraction_bps == 0 {
            return Err(ConfigError::InvalidFrontRunFraction {
                chain: self.chain,
                bps: self.max_front_run_fraction_bps,
            });
        }
        let max_front_run_fraction =
            Bps::checked(self.max_front_run_fraction_bps).map_err(|_| {
                ConfigError::InvalidFrontRunFraction {
                    chain: self.chain,
                    bps: self.max_front_run_fraction_bps,
                }
            })?;

        let max_tax_bps = Bps::checked(self.max_tax_bps).map_err(|_| ConfigError::InvalidAmount {
            chain: self.chain,
            field: "max_tax_bps",
            value: self.max_tax_bps.to_string(),
        })?;

        Ok(ChainConfig {
            chain: self.chain,
            providers: self.providers,
            relay_endpoints: self.relay_endpoints,
            min_profit_native,
            min_priority: self.min_priority,
            max_front_run_fraction,
            gas_mode: self.gas_mode,
            bundle_timeout_ms: self
                .bundle_timeout_ms
                .unwrap_or_else(|| default_bundle_timeout_ms(self.chain)),
            max_tax_bps,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalConfig {
    #[serde(default = "defaults::max_concurrent_opportunities_per_chain")]
    pub max_concurrent_opportunities_per_chain: usize,
    #[serde(default = "defaults::ws_dedup_cache_size")]
    pub ws_dedup_cache_size: usize,
    #[serde(default = "defaults::pool_cache_size_per_chain")]
    pub pool_cache_size_per_chain: usize,
    #[serde(default = "defaults::pool_ttl_ms_per_chain")]
    pub pool_ttl_ms_per_chain: u64,
    #[serde(default = "defaults::shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            max_concurrent_opportunities_per_chain: defaults::max_concurrent_opportunities_per_chain(),
            ws_dedup_cache_size: defaults::ws_dedup_cache_size(),
            pool_cache_size_per_chain: defaults::pool_cache_size_per_chain(),
            pool_ttl_ms_per_chain: defaults::pool_ttl_ms_per_chain(),
            shutdown_grace_ms: defaults::shutdown_grace_ms(),
        }
    }
}

mod defaults {
    pub(super) fn max_concurrent_opportunities_per_chain() -> usize {
        256
    }
    pub(super) fn ws_dedup_cache_size() -> usize {
        10_000
    }
    pub(super) fn pool_cache_size_per_chain() -> usize {
        5_000
    }
    pub(super) fn pool_ttl_ms_per_chain() -> u64 {
        2_000
    }
    pub(super) fn shutdown_grace_ms() -> u64 {
        crate::service::timeouts::SHUTDOWN_GRACE_MS
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct FeatureFlags {
    #[serde(default)]
    pub allow_public_fallback: bool,
    #[serde(default)]
    pub enable_precomputation: bool,
    #[serde(default)]
    pub enable_multi_relay: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawSandwichConfig {
    pub chains: Vec<ChainConfigRaw>,
    #[serde(default)]
    pub global: GlobalConfig,
    #[serde(default)]
    pub features: FeatureFlags,
}

/// The fully resolved, validated configuration the core runs with.
#[derive(Debug, Clone)]
pub struct SandwichConfig {
    pub chains: Vec<ChainConfig>,
    pub global: GlobalConfig,
    pub features: FeatureFlags,
}

impl SandwichConfig {
    pub fn chain(&self, id: ChainId) -> Option<&ChainConfig> {
        self.chains.iter().find(|c| c.chain == id)
    }

    /// Checks the invariants the rest of the core assumes hold: at least one
    /// chain, no duplicate chains, every chain has a provider, and either a
    /// relay endpoint or an explicit opt-in to the public mempool fallback.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chains.is_empty() {
            return Err(ConfigError::NoChains);
        }

        let mut seen = HashSet::new();
        for chain in &self.chains {
            if !seen.insert(chain.chain) {
                return Err(ConfigError::DuplicateChain { chain: chain.chain });
            }
            if chain.providers.is_empty() {
                return Err(ConfigError::NoProviders { chain: chain.chain });
            }
            if chain.relay_endpoints.is_empty() && !self.features.allow_public_fallback {
                return Err(ConfigError::NoRelaysNoFallback { chain: chain.chain });
            }
            if chain.bundle_timeout_ms == 0 {
                return Err(ConfigError::InvalidBundleTimeout { chain: chain.chain });
            }
        }

        Ok(())
    }
}
