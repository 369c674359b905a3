//! Transaction lifecycle: nonce sequencing, signing, submission and receipt confirmation

mod cancel;
mod gas;
mod manager;
mod nonce;
mod receipt;
mod request;
mod signer;

pub use cancel::{cancellation, CancelHandle, CancelToken};
pub use gas::{calculate_cost, GasLimitSetting, GasPriceSetting};
pub use manager::TransactionManager;
pub use nonce::NonceSequencer;
pub use receipt::{ReceiptPoller, DEFAULT_POLL_INTERVAL};
pub use request::{resolve_request, FetchedDefaults, NonceSetting, ResolvedTransaction, TransactionRequest};
pub use signer::{sign_transaction, SignedTransaction, SigningMode};

use std::fmt;

/// Where a transaction is in its lifecycle.
///
/// `Confirmed` and `Cancelled` are terminal. A mined transaction with a failed
/// status is still `Confirmed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStage {
    Created,
    NonceAssigned,
    Signed,
    Submitted,
    Pending,
    Confirmed,
    Cancelled,
}

impl TransactionStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStage::Confirmed | TransactionStage::Cancelled)
    }
}

impl fmt::Display for TransactionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionStage::Created => "created",
            TransactionStage::NonceAssigned => "nonce_assigned",
            TransactionStage::Signed => "signed",
            TransactionStage::Submitted => "submitted",
            TransactionStage::Pending => "pending",
            TransactionStage::Confirmed => "confirmed",
            TransactionStage::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}
