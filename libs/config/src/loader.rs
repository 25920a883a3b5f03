//! Loads a [`SandwichConfig`] from a TOML file, expanding `${VAR}` secrets in
//! provider and relay URLs from the environment before validating the result.

use crate::errors::ConfigError;
use crate::schema::{RawSandwichConfig, SandwichConfig};
use anyhow::{Context, Result};
use std::path::Path;

/// Load, expand, and validate configuration from `path`.
///
/// Only `providers` entries and relay `url`/`auth_key_env` fields are
/// expanded — secrets belong in the environment (`*_RPC_URL`,
/// `*_RELAY_AUTH_KEY`, `SIGNER_ENDPOINT`), never in the TOML file itself.
pub fn load(path: &Path) -> Result<SandwichConfig> {
    let raw_toml = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;

    let mut raw: RawSandwichConfig =
        toml::from_str(&raw_toml).with_context(|| format!("failed to parse {:?}", path))?;

    for chain in &mut raw.chains {
        for provider in &mut chain.providers {
            *provider = expand_env(provider)?;
        }
        for endpoint in &mut chain.relay_endpoints {
            endpoint.url = expand_env(&endpoint.url)?;
            if let Some(auth_key_env) = &endpoint.auth_key_env {
                endpoint.auth_key_env = Some(expand_env(auth_key_env)?);
            }
        }
    }

    let chains = raw
        .chains
        .into_iter()
        .map(|c| c.into_domain())
        .collect::<Result<Vec<_>, ConfigError>>()?;

    let config = SandwichConfig {
        chains,
        global: raw.global,
        features: raw.features,
    };

    config.validate()?;
    Ok(config)
}

fn expand_env(value: &str) -> Result<String> {
    let expanded = shellexpand::env(value).with_context(|| format!("failed to expand {value:?}"))?;
    Ok(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const BASE_TOML: &str = r#"
[[chains]]
chain = "ethereum"
providers = ["${TEST_RPC_URL}"]
min_profit_native = "10000000000000000"
min_priority = 0.5
max_front_run_fraction_bps = 4000
gas_mode = "adaptive"
max_tax_bps = 500

[[chains.relay_endpoints]]
relay = "flashbots"
url = "https://relay.flashbots.net"
auth_key_env = "FLASHBOTS_RELAY_AUTH_KEY"

[global]
shutdown_grace_ms = 7000

[features]
allow_public_fallback = false
"#;

    #[test]
    fn loads_and_expands_env_vars() {
        std::env::set_var("TEST_RPC_URL", "https://rpc.example/abc");

        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, BASE_TOML).unwrap();

        let config = load(&path).unwrap();
        let eth = config.chain(sandwich_types::ChainId::Ethereum).unwrap();
        assert_eq!(eth.providers[0], "https://rpc.example/abc");
        assert_eq!(config.global.shutdown_grace_ms, 7000);

        std::env::remove_var("TEST_RPC_URL");
    }

    #[test]
    fn rejects_missing_relays_without_fallback_opt_in() {
        let toml_no_relays = r#"
[[chains]]
chain = "bsc"
providers = ["https://rpc.example"]
min_profit_native = "1000"
min_priority = 0.1
max_front_run_fraction_bps = 4000
gas_mode = "conservative"
max_tax_bps = 0
"#;
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, toml_no_relays).unwrap();

        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("no relay endpoints"));
    }

    #[test]
    fn rejects_malformed_amount_string() {
        let bad_amount = r#"
[[chains]]
chain = "solana"
providers = ["https://rpc.example"]
min_profit_native = "not-a-number"
min_priority = 0.1
max_front_run_fraction_bps = 4000
gas_mode = "aggressive"
max_tax_bps = 0

[[chains.relay_endpoints]]
relay = "jito"
url = "https://jito.example"
"#;
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, bad_amount).unwrap();

        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("min_profit_native"));
    }
}
