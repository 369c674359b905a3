//! Receipt confirmation by polling, with cancellation and deployment checks

use super::cancel::CancelToken;
use super::manager::TransactionManager;
use super::request::TransactionRequest;
use super::TransactionStage;
use crate::chain::RpcClient;
use crate::config::{Settings, DEFAULT_POLL_INTERVAL_MS};
use crate::error::{TxManagerError, TxResult};
use crate::metrics;

use ethers::types::{Address, TransactionReceipt, H256};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default interval between receipt queries
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(DEFAULT_POLL_INTERVAL_MS);

/// Polls for transaction receipts until they exist or the caller cancels.
///
/// There is no built-in timeout: an uncancelled poll for a transaction that
/// is never mined runs forever. Use `CancelHandle::cancel_after` for a deadline.
pub struct ReceiptPoller {
    client: Arc<dyn RpcClient>,
    poll_interval: Duration,
}

impl ReceiptPoller {
    pub fn new(client: Arc<dyn RpcClient>) -> Self {
        Self {
            client,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Create a poller using the configured poll interval
    pub fn from_settings(settings: &Settings, client: Arc<dyn RpcClient>) -> Self {
        Self::new(client).with_poll_interval(settings.poll_interval())
    }

    /// A poller sharing the manager's RPC client
    pub fn for_manager(manager: &TransactionManager) -> TxResult<Self> {
        Ok(Self::new(manager.client()?.clone()))
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Poll until `tx_hash` has a receipt.
    ///
    /// "Not mined yet" is retried every interval; any RPC error is returned
    /// immediately. Cancellation is checked after each wait, before the next
    /// query. The transaction stays broadcast after a cancel.
    pub async fn confirm(&self, tx_hash: H256, cancel: &CancelToken) -> TxResult<TransactionReceipt> {
        let started = Instant::now();
        let mut polls = 1u64;

        loop {
            if let Some(receipt) = self.client.get_transaction_receipt(tx_hash).await? {
                info!(
                    "Transaction {:?} {} in block {:?} after {} polls (status {:?})",
                    tx_hash,
                    TransactionStage::Confirmed,
                    receipt.block_number,
                    polls,
                    receipt.status
                );
                metrics::record_receipt_confirmed(started.elapsed().as_secs_f64());
                return Ok(receipt);
            }

            debug!("Transaction {:?} {} (poll {})", tx_hash, TransactionStage::Pending, polls);

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = cancel.cancelled() => {}
            }

            if cancel.is_cancelled() {
                debug!("Polling for {:?} {} after {} polls", tx_hash, TransactionStage::Cancelled, polls);
                metrics::record_poll_cancelled();
                return Err(TxManagerError::Cancelled);
            }
            polls += 1;
        }
    }

    /// Run `submit` and confirm the hash it returns
    pub async fn submit_and_confirm<F>(&self, submit: F, cancel: &CancelToken) -> TxResult<TransactionReceipt>
    where
        F: Future<Output = TxResult<H256>>,
    {
        let tx_hash = submit.await?;
        self.confirm(tx_hash, cancel).await
    }

    /// Run every submission in order, then confirm each in that same order.
    ///
    /// All broadcasts happen before the first receipt query so nonces go out
    /// back to back; confirmation is sequential to keep one poll in flight.
    /// A failed submission stops the batch; earlier ones remain broadcast.
    pub async fn submit_many_and_confirm<I, F>(
        &self,
        submits: I,
        cancel: &CancelToken,
    ) -> TxResult<Vec<TransactionReceipt>>
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = TxResult<H256>>,
    {
        let mut tx_hashes = Vec::new();
        for submit in submits {
            tx_hashes.push(submit.await?);
        }
        debug!("Submitted batch of {} transactions", tx_hashes.len());

        let mut receipts = Vec::with_capacity(tx_hashes.len());
        for tx_hash in tx_hashes {
            receipts.push(self.confirm(tx_hash, cancel).await?);
        }
        Ok(receipts)
    }

    /// Submit a contract creation, confirm it, and check code landed at the
    /// new address.
    ///
    /// A mined deployment can still leave no code, e.g. when the constructor
    /// ran out of gas. That case fails with the receipt attached.
    pub async fn deploy_and_confirm<F>(&self, deploy: F, cancel: &CancelToken) -> TxResult<TransactionReceipt>
    where
        F: Future<Output = TxResult<H256>>,
    {
        let receipt = self.submit_and_confirm(deploy, cancel).await?;

        let Some(contract_address) = receipt.contract_address else {
            warn!("Receipt for {:?} has no contract address", receipt.transaction_hash);
            return Err(deployment_failed(receipt));
        };

        let code = self.client.get_code(contract_address).await?;
        if code.is_empty() {
            warn!(
                "No code at {:?} after deployment {:?}",
                contract_address, receipt.transaction_hash
            );
            return Err(deployment_failed(receipt));
        }

        info!("Contract deployed at {:?}", contract_address);
        Ok(receipt)
    }

    /// `deploy_and_confirm`, returning only the contract address
    pub async fn deploy_and_get_address<F>(&self, deploy: F, cancel: &CancelToken) -> TxResult<Address>
    where
        F: Future<Output = TxResult<H256>>,
    {
        let receipt = self.deploy_and_confirm(deploy, cancel).await?;
        receipt
            .contract_address
            .ok_or_else(|| deployment_failed(receipt))
    }

    /// Sign and send `request` through `manager`, then confirm it
    pub async fn send_and_confirm(
        &self,
        manager: &TransactionManager,
        request: TransactionRequest,
        cancel: &CancelToken,
    ) -> TxResult<TransactionReceipt> {
        self.submit_and_confirm(manager.sign_and_send(request), cancel).await
    }

    /// Send every request in order, then confirm each in order
    pub async fn send_all_and_confirm(
        &self,
        manager: &TransactionManager,
        requests: Vec<TransactionRequest>,
        cancel: &CancelToken,
    ) -> TxResult<Vec<TransactionReceipt>> {
        let submits = requests
            .into_iter()
            .map(|request| manager.sign_and_send(request));
        self.submit_many_and_confirm(submits, cancel).await
    }

    /// Send a contract creation request and verify the deployment
    pub async fn deploy_request_and_confirm(
        &self,
        manager: &TransactionManager,
        request: TransactionRequest,
        cancel: &CancelToken,
    ) -> TxResult<TransactionReceipt> {
        self.deploy_and_confirm(manager.sign_and_send(request), cancel).await
    }
}

fn deployment_failed(receipt: TransactionReceipt) -> TxManagerError {
    metrics::record_deployment_failed();
    TxManagerError::ContractDeploymentFailed {
        receipt: Box::new(receipt),
    }
}
