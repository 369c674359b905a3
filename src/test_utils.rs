//! Scripted in-memory chain for tests

use crate::account::Account;
use crate::chain::RpcClient;
use crate::error::{TxManagerError, TxResult};

use async_trait::async_trait;
use ethers::types::{Address, Bytes, Transaction, TransactionReceipt, H256, U256, U64};
use ethers::utils::{get_contract_address, keccak256, rlp};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const TEST_PRIVATE_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

pub fn test_account() -> Arc<Account> {
    Arc::new(Account::from_private_key(TEST_PRIVATE_KEY).unwrap())
}

/// An RPC call as seen by the fake chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcCall {
    TransactionCount(Address),
    GasPrice,
    SendRaw(H256),
    Receipt(H256),
    Code(Address),
}

struct PendingReceipt {
    receipt: TransactionReceipt,
    polls_remaining: usize,
}

#[derive(Default)]
struct ChainState {
    transaction_counts: HashMap<Address, U256>,
    gas_price: U256,
    calls: Vec<RpcCall>,
    sent: Vec<Transaction>,
    receipts: HashMap<H256, PendingReceipt>,
    mining_delays: VecDeque<usize>,
    deployed_code: Bytes,
    code: HashMap<Address, Bytes>,
    fail_sends: bool,
    fail_gas_price: bool,
    block_number: u64,
}

/// Records every call, decodes broadcasts, and mines each one after a
/// scripted number of receipt polls (zero unless configured)
pub struct FakeChain {
    state: Mutex<ChainState>,
}

impl FakeChain {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ChainState {
                gas_price: U256::from(1_000_000_000u64),
                block_number: 100,
                ..Default::default()
            }),
        }
    }

    pub fn with_transaction_count(self, address: Address, count: u64) -> Self {
        self.state
            .lock()
            .unwrap()
            .transaction_counts
            .insert(address, U256::from(count));
        self
    }

    pub fn with_gas_price(self, gas_price: U256) -> Self {
        self.state.lock().unwrap().gas_price = gas_price;
        self
    }

    /// Polls before each broadcast, in send order, gets its receipt
    pub fn with_mining_delays(self, delays: impl IntoIterator<Item = usize>) -> Self {
        self.state.lock().unwrap().mining_delays = delays.into_iter().collect();
        self
    }

    /// Code installed at the address of every contract created
    pub fn with_deployed_code(self, code: impl Into<Bytes>) -> Self {
        self.state.lock().unwrap().deployed_code = code.into();
        self
    }

    pub fn fail_sends(&self, fail: bool) {
        self.state.lock().unwrap().fail_sends = fail;
    }

    pub fn fail_gas_price(&self, fail: bool) {
        self.state.lock().unwrap().fail_gas_price = fail;
    }

    pub fn calls(&self) -> Vec<RpcCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn sent_nonces(&self) -> Vec<U256> {
        self.state
            .lock()
            .unwrap()
            .sent
            .iter()
            .map(|tx| tx.nonce)
            .collect()
    }
}

#[async_trait]
impl RpcClient for FakeChain {
    async fn get_transaction_count(&self, address: Address) -> TxResult<U256> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RpcCall::TransactionCount(address));
        Ok(state
            .transaction_counts
            .get(&address)
            .copied()
            .unwrap_or_default())
    }

    async fn get_gas_price(&self) -> TxResult<U256> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RpcCall::GasPrice);
        if state.fail_gas_price {
            return Err(TxManagerError::network("eth_gasPrice", "connection refused"));
        }
        Ok(state.gas_price)
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> TxResult<H256> {
        let mut state = self.state.lock().unwrap();
        let hash = H256::from(keccak256(&raw));
        state.calls.push(RpcCall::SendRaw(hash));

        if state.fail_sends {
            return Err(TxManagerError::network("eth_sendRawTransaction", "connection reset"));
        }

        let tx: Transaction = rlp::decode(&raw)
            .map_err(|e| TxManagerError::network("eth_sendRawTransaction", e))?;
        let from = tx
            .recover_from()
            .map_err(|e| TxManagerError::network("eth_sendRawTransaction", e))?;

        let contract_address = match tx.to {
            Some(_) => None,
            None => Some(get_contract_address(from, tx.nonce)),
        };
        if let Some(address) = contract_address {
            if !state.deployed_code.is_empty() {
                let code = state.deployed_code.clone();
                state.code.insert(address, code);
            }
        }

        state.block_number += 1;
        let receipt = TransactionReceipt {
            transaction_hash: hash,
            from,
            to: tx.to,
            contract_address,
            block_number: Some(U64::from(state.block_number)),
            status: Some(U64::from(1)),
            gas_used: Some(tx.gas),
            ..Default::default()
        };
        let polls_remaining = state.mining_delays.pop_front().unwrap_or(0);
        state.receipts.insert(
            hash,
            PendingReceipt {
                receipt,
                polls_remaining,
            },
        );
        state.sent.push(tx);

        Ok(hash)
    }

    async fn get_transaction_receipt(&self, tx_hash: H256) -> TxResult<Option<TransactionReceipt>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RpcCall::Receipt(tx_hash));

        match state.receipts.get_mut(&tx_hash) {
            Some(pending) if pending.polls_remaining == 0 => Ok(Some(pending.receipt.clone())),
            Some(pending) => {
                pending.polls_remaining -= 1;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn get_code(&self, address: Address) -> TxResult<Bytes> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RpcCall::Code(address));
        Ok(state.code.get(&address).cloned().unwrap_or_default())
    }
}
