//! Chain provider with multi-RPC support and automatic failover

use super::RpcClient;
use crate::config::RpcConfig;
use crate::error::{TxManagerError, TxResult};

use async_trait::async_trait;
use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Multi-provider wrapper with automatic failover
pub struct ChainProvider {
    /// RPC configuration
    config: RpcConfig,
    /// HTTP providers (multiple for failover)
    http_providers: Vec<Provider<Http>>,
    /// Current active provider index
    current_provider: AtomicUsize,
}

impl ChainProvider {
    /// Create a new chain provider
    pub fn new(config: RpcConfig) -> TxResult<Self> {
        let mut http_providers = Vec::new();

        for url in &config.urls {
            match Provider::<Http>::try_from(url.as_str()) {
                Ok(provider) => {
                    http_providers.push(provider);
                    debug!("Added HTTP provider: {}", url);
                }
                Err(e) => {
                    warn!("Failed to create provider for {}: {}", url, e);
                }
            }
        }

        if http_providers.is_empty() {
            return Err(TxManagerError::Config("No valid RPC providers".to_string()));
        }

        Ok(Self {
            config,
            http_providers,
            current_provider: AtomicUsize::new(0),
        })
    }

    /// Get the active HTTP provider
    pub fn http(&self) -> &Provider<Http> {
        let idx = self.current_provider.load(Ordering::Relaxed);
        &self.http_providers[idx % self.http_providers.len()]
    }

    /// Switch to next available provider
    pub fn failover(&self) {
        let current = self.current_provider.load(Ordering::Relaxed);
        let next = (current + 1) % self.http_providers.len();
        self.current_provider.store(next, Ordering::Relaxed);
        warn!("RPC failover to provider {}", next);
    }

    /// Configured chain id, if any
    pub fn chain_id(&self) -> Option<u64> {
        self.config.chain_id
    }

    /// Number of configured endpoints
    pub fn endpoint_count(&self) -> usize {
        self.http_providers.len()
    }
}

/// Run a read-only call against each endpoint in turn until one answers.
///
/// Broadcasts do not go through here: a raw transaction is sent exactly once.
macro_rules! with_failover {
    ($self:ident, $operation:literal, |$provider:ident| $call:expr) => {{
        let mut last_error = None;
        for _ in 0..$self.http_providers.len() {
            let $provider = $self.http();
            match $call.await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!("{} failed: {}", $operation, e);
                    last_error = Some(e);
                    $self.failover();
                }
            }
        }
        Err(match last_error {
            Some(e) => TxManagerError::network($operation, e),
            None => TxManagerError::network($operation, "all providers failed"),
        })
    }};
}

#[async_trait]
impl RpcClient for ChainProvider {
    async fn get_transaction_count(&self, address: Address) -> TxResult<U256> {
        with_failover!(self, "eth_getTransactionCount", |provider| provider
            .get_transaction_count(address, Some(BlockNumber::Pending.into())))
    }

    async fn get_gas_price(&self) -> TxResult<U256> {
        with_failover!(self, "eth_gasPrice", |provider| provider.get_gas_price())
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> TxResult<H256> {
        let pending = self
            .http()
            .send_raw_transaction(raw)
            .await
            .map_err(|e| TxManagerError::network("eth_sendRawTransaction", e))?;

        Ok(pending.tx_hash())
    }

    async fn get_transaction_receipt(&self, tx_hash: H256) -> TxResult<Option<TransactionReceipt>> {
        with_failover!(self, "eth_getTransactionReceipt", |provider| provider
            .get_transaction_receipt(tx_hash))
    }

    async fn get_code(&self, address: Address) -> TxResult<Bytes> {
        with_failover!(self, "eth_getCode", |provider| provider.get_code(address, None))
    }
}
