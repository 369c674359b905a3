//! Chain module - the RPC boundary the transaction lifecycle depends on
//!
//! This module provides:
//! - The `RpcClient` trait: the handful of JSON-RPC calls nonce sequencing,
//!   submission and receipt polling need
//! - `ChainProvider`: an ethers HTTP implementation with endpoint failover

pub mod provider;

pub use provider::ChainProvider;

use crate::error::TxResult;

use async_trait::async_trait;
use ethers::types::{Address, Bytes, TransactionReceipt, H256, U256};

/// JSON-RPC calls consumed by the transaction lifecycle.
///
/// Implementations must be safe for concurrent use by multiple in-flight calls
/// and report transport failures as `TxManagerError::NetworkUnavailable`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RpcClient: Send + Sync {
    /// `eth_getTransactionCount` at the pending block
    async fn get_transaction_count(&self, address: Address) -> TxResult<U256>;

    /// `eth_gasPrice`
    async fn get_gas_price(&self) -> TxResult<U256>;

    /// `eth_sendRawTransaction`
    async fn send_raw_transaction(&self, raw: Bytes) -> TxResult<H256>;

    /// `eth_getTransactionReceipt`; `None` while the transaction is not mined
    async fn get_transaction_receipt(&self, tx_hash: H256) -> TxResult<Option<TransactionReceipt>>;

    /// `eth_getCode` at the latest block
    async fn get_code(&self, address: Address) -> TxResult<Bytes>;
}
