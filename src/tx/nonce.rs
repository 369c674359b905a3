//! Nonce sequencing for reliable transaction submission
//!
//! Handles:
//! - Local nonce tracking so rapid submissions do not wait for confirmations
//! - Lazy initialisation from the on-chain transaction count
//! - Forward-only reconciliation with the chain
//!
//! Every nonce handed out is expected to be consumed by exactly one broadcast.
//! A nonce that is allocated and never broadcast leaves a gap the chain will
//! not fill; nothing here releases it, since rewinding would reorder other
//! in-flight transactions from the same account.

use crate::chain::RpcClient;
use crate::error::TxResult;
use crate::metrics;

use dashmap::DashMap;
use ethers::types::{Address, U256};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Next nonce to hand out; `None` until the chain has been queried
type Counter = Arc<Mutex<Option<U256>>>;

/// Hands out strictly increasing nonces per address.
///
/// Use one sequencer per (account, endpoint) pair. Two sequencers allocating
/// for the same address will hand out the same nonces.
pub struct NonceSequencer {
    /// Client used to seed counters from `eth_getTransactionCount`
    client: Arc<dyn RpcClient>,
    /// Per-address counters
    counters: DashMap<Address, Counter>,
}

impl NonceSequencer {
    /// Create a new nonce sequencer
    pub fn new(client: Arc<dyn RpcClient>) -> Self {
        Self {
            client,
            counters: DashMap::new(),
        }
    }

    fn counter(&self, address: Address) -> Counter {
        // The map guard is dropped before any await on the counter itself
        self.counters.entry(address).or_default().clone()
    }

    /// Get the next nonce for an address.
    ///
    /// The first call for an address adopts the on-chain transaction count.
    /// If that query fails nothing is cached and the next call queries again.
    pub async fn next_nonce(&self, address: Address) -> TxResult<U256> {
        let counter = self.counter(address);
        let mut next = counter.lock().await;

        let nonce = match *next {
            Some(nonce) => nonce,
            None => {
                let on_chain = self.client.get_transaction_count(address).await?;
                debug!("Initialized nonce for {:?}: {}", address, on_chain);
                on_chain
            }
        };
        *next = Some(nonce + U256::one());

        debug!("Allocated nonce {} for {:?}", nonce, address);
        metrics::record_nonce_allocated();
        Ok(nonce)
    }

    /// Seed the counter for an address that has none yet.
    ///
    /// Returns false and leaves the counter alone if one already exists.
    pub async fn reset_from(&self, address: Address, chain_nonce: U256) -> bool {
        let counter = self.counter(address);
        let mut next = counter.lock().await;

        if next.is_some() {
            debug!("Nonce for {:?} already initialized, ignoring reset", address);
            return false;
        }

        *next = Some(chain_nonce);
        true
    }

    /// The nonce the next call would hand out, if the counter is initialized
    pub async fn current(&self, address: Address) -> Option<U256> {
        let counter = self.counters.get(&address)?.clone();
        let next = counter.lock().await;
        *next
    }

    /// Sync with on-chain state.
    ///
    /// Only moves the counter forward, e.g. after another client used the
    /// account. Never rewinds, so pending local transactions keep their slots.
    pub async fn sync(&self, address: Address) -> TxResult<U256> {
        let counter = self.counter(address);
        let mut next = counter.lock().await;

        let on_chain = self.client.get_transaction_count(address).await?;

        match *next {
            Some(local) if local >= on_chain => {}
            Some(local) => {
                warn!(
                    "Nonce for {:?} behind chain: local {}, on-chain {}",
                    address, local, on_chain
                );
                *next = Some(on_chain);
            }
            None => *next = Some(on_chain),
        }

        Ok(next.unwrap_or(on_chain))
    }

    /// Drop the cached counter so the next allocation re-queries the chain.
    ///
    /// Only call with no allocation for `address` in flight.
    pub fn forget(&self, address: Address) {
        self.counters.remove(&address);
    }
}
