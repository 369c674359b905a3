//! Signing accounts

use crate::config::WalletConfig;
use crate::error::{TxManagerError, TxResult};

use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use std::fmt;

/// Environment variable read when the wallet config names none
pub const DEFAULT_PRIVATE_KEY_ENV: &str = "TX_MANAGER_PRIVATE_KEY";

/// A private key used for signing.
///
/// Nonces are not tracked here: they depend on the endpoint a transaction is
/// sent through, so each `TransactionManager` holds its own sequencer.
/// The key never leaves the signer; `Debug` only shows the address.
pub struct Account {
    wallet: LocalWallet,
}

impl Account {
    pub fn new(wallet: LocalWallet) -> Self {
        Self { wallet }
    }

    /// Parse a hex private key, with or without `0x`
    pub fn from_private_key(key: &str) -> TxResult<Self> {
        key.trim_start_matches("0x")
            .parse::<LocalWallet>()
            .map(Self::new)
            .map_err(|e| TxManagerError::Config(format!("Invalid private key: {}", e)))
    }

    /// Load the private key from an environment variable
    pub fn from_env(var: &str) -> TxResult<Self> {
        let key = std::env::var(var)
            .map_err(|_| TxManagerError::Config(format!("Environment variable {} not set", var)))?;
        Self::from_private_key(&key)
    }

    /// Load the key named by the wallet configuration, falling back to
    /// `TX_MANAGER_PRIVATE_KEY`
    pub fn from_config(config: &WalletConfig) -> TxResult<Self> {
        let var = config
            .private_key_env
            .as_deref()
            .unwrap_or(DEFAULT_PRIVATE_KEY_ENV);
        Self::from_env(var)
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub(crate) fn wallet(&self) -> &LocalWallet {
        &self.wallet
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[test]
    fn test_debug_hides_key() {
        let account = Account::from_private_key(KEY).unwrap();
        let debug = format!("{:?}", account);
        assert!(debug.contains("address"));
        assert!(!debug.contains("4c0883a69102937d"));
    }

    #[test]
    fn test_invalid_key_is_config_error() {
        assert!(matches!(
            Account::from_private_key("not-a-key"),
            Err(TxManagerError::Config(_))
        ));
        assert!(matches!(
            Account::from_env("TXM_TEST_UNSET_KEY_VAR"),
            Err(TxManagerError::Config(_))
        ));
    }

    #[test]
    fn test_from_config_reads_named_variable() {
        std::env::set_var("TXM_TEST_DEPLOYER_KEY", KEY);
        let config = WalletConfig {
            private_key_env: Some("TXM_TEST_DEPLOYER_KEY".to_string()),
        };
        let account = Account::from_config(&config).unwrap();
        assert_eq!(account.address(), Account::from_private_key(KEY).unwrap().address());
    }
}
