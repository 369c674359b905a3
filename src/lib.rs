//! Tesseract transaction manager - nonce sequencing, signing, submission and
//! receipt confirmation for EVM accounts
//!
//! A `TransactionManager` turns a `TransactionRequest` into a signed and
//! broadcast transaction, allocating nonces from a `NonceSequencer` bound to
//! its RPC endpoint. A `ReceiptPoller` then waits for the receipt, with
//! caller-driven cancellation and deployment verification.

pub mod account;
pub mod chain;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod tx;

#[cfg(test)]
pub(crate) mod test_utils;

pub use account::Account;
pub use chain::{ChainProvider, RpcClient};
pub use config::Settings;
pub use error::{TxManagerError, TxResult};
pub use tx::{
    cancellation, CancelHandle, CancelToken, NonceSequencer, ReceiptPoller, SignedTransaction,
    SigningMode, TransactionManager, TransactionRequest, TransactionStage,
};
