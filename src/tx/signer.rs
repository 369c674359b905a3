//! Signing boundary: turns a resolved transaction and a wallet into raw bytes

use super::request::ResolvedTransaction;
use crate::error::{TxManagerError, TxResult};

use ethers::signers::LocalWallet;
use ethers::types::{Bytes, H256};
use ethers::utils::keccak256;

/// How the signature binds to a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SigningMode {
    /// Pre-EIP-155 signature, valid on any chain
    #[default]
    Legacy,
    /// EIP-155 signature bound to the given chain id
    ChainAware(u64),
}

impl From<Option<u64>> for SigningMode {
    fn from(chain_id: Option<u64>) -> Self {
        chain_id.map_or(SigningMode::Legacy, SigningMode::ChainAware)
    }
}

/// A signed, encoded transaction ready for `eth_sendRawTransaction`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub raw: Bytes,
    pub hash: H256,
    pub transaction: ResolvedTransaction,
}

impl SignedTransaction {
    /// `0x`-prefixed hex of the raw bytes
    pub fn raw_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.raw))
    }
}

/// Sign `tx` with `wallet`, producing the RLP of the signed transaction.
pub fn sign_transaction(
    wallet: &LocalWallet,
    tx: ResolvedTransaction,
    mode: SigningMode,
) -> TxResult<SignedTransaction> {
    let typed = tx.to_typed(mode);

    let signature = match mode {
        // sign_transaction_sync always applies a chain id, so legacy signing
        // goes straight to the unprotected sighash
        SigningMode::Legacy => wallet.sign_hash(typed.sighash()),
        SigningMode::ChainAware(_) => wallet.sign_transaction_sync(&typed),
    }
    .map_err(|e| TxManagerError::Signing(e.to_string()))?;

    let raw = typed.rlp_signed(&signature);
    let hash = H256::from(keccak256(&raw));

    Ok(SignedTransaction {
        raw,
        hash,
        transaction: tx,
    })
}
