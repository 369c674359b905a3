//! Error types for the transaction manager

use ethers::types::{Address, TransactionReceipt};
use thiserror::Error;

/// Main error type for transaction lifecycle operations
#[derive(Error, Debug)]
pub enum TxManagerError {
    #[error("Account mismatch: request is from {requested:?} but signing account is {account:?}")]
    AccountMismatch { account: Address, requested: Address },

    #[error("No RPC client configured for {operation}")]
    MissingClient { operation: &'static str },

    #[error("Transaction nonce has not been set")]
    InvalidNonce,

    #[error("Network unavailable during {operation}: {message}")]
    NetworkUnavailable {
        operation: &'static str,
        message: String,
    },

    #[error("Receipt polling cancelled")]
    Cancelled,

    #[error("Contract code not deployed successfully (tx {:?})", .receipt.transaction_hash)]
    ContractDeploymentFailed { receipt: Box<TransactionReceipt> },

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Metrics encoding error: {0}")]
    Metrics(String),
}

impl TxManagerError {
    /// Wrap a transport failure for the given RPC operation
    pub fn network(operation: &'static str, err: impl std::fmt::Display) -> Self {
        TxManagerError::NetworkUnavailable {
            operation,
            message: err.to_string(),
        }
    }

    /// Check if the caller may reasonably retry the operation.
    ///
    /// Nothing in this crate retries on its own except receipt polling, and that
    /// only retries the "not mined yet" outcome, which is not an error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TxManagerError::NetworkUnavailable { .. })
    }

    /// Cancellation is a caller decision, not a failure worth alerting on
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TxManagerError::Cancelled)
    }

    /// The receipt attached to a failed deployment, if any
    pub fn receipt(&self) -> Option<&TransactionReceipt> {
        match self {
            TxManagerError::ContractDeploymentFailed { receipt } => Some(receipt.as_ref()),
            _ => None,
        }
    }
}

/// Result type for transaction manager operations
pub type TxResult<T> = Result<T, TxManagerError>;
