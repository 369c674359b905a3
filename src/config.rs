//! Configuration management for the transaction manager
//!
//! Loads configuration from TOML files with environment variable substitution.

use crate::tx::SigningMode;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default gas limit applied when a request does not set one
pub const DEFAULT_GAS_LIMIT: u64 = 21_000;

/// Default receipt polling interval
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub rpc: RpcConfig,
    #[serde(default)]
    pub transactions: TransactionsConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    pub urls: Vec<String>,
    /// Absent means pre-EIP-155 signing
    pub chain_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionsConfig {
    #[serde(default = "default_gas_limit")]
    pub default_gas_limit: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletConfig {
    /// Name of the environment variable holding the hex private key
    pub private_key_env: Option<String>,
}

fn default_gas_limit() -> u64 {
    DEFAULT_GAS_LIMIT
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for TransactionsConfig {
    fn default() -> Self {
        Self {
            default_gas_limit: DEFAULT_GAS_LIMIT,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Settings {
    /// Load settings from the file named by `TX_MANAGER_CONFIG`
    pub fn load() -> Result<Self> {
        let config_path = env::var("TX_MANAGER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        Self::load_from(&config_path)
    }

    /// Load settings from a specific file
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::from_toml_str(&config_str)
    }

    /// Parse settings from TOML text, substituting `${VAR}` references first
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config_str = substitute_env_vars(input)?;

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.rpc.urls.iter().all(|url| url.trim().is_empty()) {
            anyhow::bail!("At least one RPC URL must be configured");
        }

        if self.transactions.poll_interval_ms == 0 {
            anyhow::bail!("poll_interval_ms must be greater than zero");
        }

        if self.transactions.default_gas_limit == 0 {
            anyhow::bail!("default_gas_limit must be greater than zero");
        }

        if self.rpc.chain_id.is_none() {
            tracing::warn!("No chain_id configured - transactions will be signed without replay protection");
        }

        Ok(())
    }

    /// Signing mode implied by the configured chain id
    pub fn signing_mode(&self) -> SigningMode {
        SigningMode::from(self.rpc.chain_id)
    }

    /// Receipt polling interval
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.transactions.poll_interval_ms)
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> Result<String> {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")?;

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_env_var_substitution() {
        env::set_var("TXM_TEST_VAR", "test_value");
        let input = "url = \"https://api.example.com/${TXM_TEST_VAR}/endpoint\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "url = \"https://api.example.com/test_value/endpoint\"");
    }

    #[test]
    fn test_defaults_applied() {
        let settings = Settings::from_toml_str(
            r#"
            [rpc]
            urls = ["http://localhost:8545"]
            "#,
        )
        .unwrap();

        assert_eq!(settings.transactions.default_gas_limit, DEFAULT_GAS_LIMIT);
        assert_eq!(settings.poll_interval(), Duration::from_millis(100));
        assert_eq!(settings.signing_mode(), SigningMode::Legacy);
        assert!(settings.wallet.private_key_env.is_none());
    }

    #[test]
    fn test_chain_id_selects_chain_aware_signing() {
        let settings = Settings::from_toml_str(
            r#"
            [rpc]
            urls = ["http://localhost:8545"]
            chain_id = 1337

            [transactions]
            default_gas_limit = 90000
            poll_interval_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(settings.signing_mode(), SigningMode::ChainAware(1337));
        assert_eq!(settings.transactions.default_gas_limit, 90_000);
        assert_eq!(settings.poll_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_rejects_missing_urls_and_zero_interval() {
        assert!(Settings::from_toml_str("[rpc]\nurls = []\n").is_err());
        assert!(Settings::from_toml_str(
            "[rpc]\nurls = [\"http://localhost:8545\"]\n[transactions]\npoll_interval_ms = 0\n"
        )
        .is_err());
    }

    #[test]
    fn test_load_from_file() {
        env::set_var("TXM_TEST_RPC_HOST", "node.internal");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[rpc]\nurls = [\"http://${{TXM_TEST_RPC_HOST}}:8545\"]\n[wallet]\nprivate_key_env = \"DEPLOYER_KEY\""
        )
        .unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.rpc.urls, vec!["http://node.internal:8545".to_string()]);
        assert_eq!(settings.wallet.private_key_env.as_deref(), Some("DEPLOYER_KEY"));
    }
}
