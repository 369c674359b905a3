//! Transaction manager: nonce assignment, gas defaulting, signing and submission
//! for a single account

use super::nonce::NonceSequencer;
use super::request::{resolve_request, FetchedDefaults, NonceSetting, TransactionRequest};
use super::signer::{sign_transaction, SignedTransaction, SigningMode};
use super::TransactionStage;
use crate::account::Account;
use crate::chain::RpcClient;
use crate::config::{Settings, DEFAULT_GAS_LIMIT};
use crate::error::{TxManagerError, TxResult};
use crate::metrics;

use ethers::types::{Address, H256, U256};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Signs and submits transactions for one account through one endpoint
pub struct TransactionManager {
    /// Signing account
    account: Arc<Account>,
    /// RPC client; `None` for offline signing
    client: Option<Arc<dyn RpcClient>>,
    /// Allocates nonces against `client`; `None` for offline signing
    nonce_sequencer: Option<Arc<NonceSequencer>>,
    /// Legacy or EIP-155 signatures
    signing_mode: SigningMode,
    /// Gas limit for requests that leave it unset
    default_gas_limit: U256,
}

impl TransactionManager {
    /// Create a new transaction manager with its own nonce sequencer over
    /// `client`
    pub fn new(account: Arc<Account>, client: Arc<dyn RpcClient>, signing_mode: SigningMode) -> Self {
        info!(
            "Transaction manager initialized for {:?} ({:?})",
            account.address(),
            signing_mode
        );

        let nonce_sequencer = Arc::new(NonceSequencer::new(client.clone()));
        Self {
            account,
            client: Some(client),
            nonce_sequencer: Some(nonce_sequencer),
            signing_mode,
            default_gas_limit: U256::from(DEFAULT_GAS_LIMIT),
        }
    }

    /// A manager without a client; only requests with explicit nonce and gas
    /// price can be signed
    pub fn offline(account: Arc<Account>, signing_mode: SigningMode) -> Self {
        Self {
            account,
            client: None,
            nonce_sequencer: None,
            signing_mode,
            default_gas_limit: U256::from(DEFAULT_GAS_LIMIT),
        }
    }

    /// Create a manager using the configured signing mode and gas limit
    pub fn from_settings(settings: &Settings, account: Arc<Account>, client: Arc<dyn RpcClient>) -> Self {
        Self::new(account, client, settings.signing_mode())
            .with_default_gas_limit(settings.transactions.default_gas_limit)
    }

    /// Allocate nonces from `sequencer` instead of a private one.
    ///
    /// Managers sending for the same account through the same endpoint must
    /// share a sequencer. The sequencer must query that same endpoint.
    #[must_use]
    pub fn with_nonce_sequencer(mut self, sequencer: Arc<NonceSequencer>) -> Self {
        self.nonce_sequencer = Some(sequencer);
        self
    }

    #[must_use]
    pub fn with_default_gas_limit(mut self, gas_limit: impl Into<U256>) -> Self {
        self.default_gas_limit = gas_limit.into();
        self
    }

    /// Signing account address
    pub fn address(&self) -> Address {
        self.account.address()
    }

    pub fn signing_mode(&self) -> SigningMode {
        self.signing_mode
    }

    pub fn default_gas_limit(&self) -> U256 {
        self.default_gas_limit
    }

    /// The configured RPC client
    pub fn client(&self) -> TxResult<&Arc<dyn RpcClient>> {
        self.require_client("client access")
    }

    fn require_client(&self, operation: &'static str) -> TxResult<&Arc<dyn RpcClient>> {
        self.client
            .as_ref()
            .ok_or(TxManagerError::MissingClient { operation })
    }

    /// The sequencer nonces are allocated from; `None` when offline
    pub fn nonce_sequencer(&self) -> Option<&Arc<NonceSequencer>> {
        self.nonce_sequencer.as_ref()
    }

    /// Reject requests whose sender is not this account
    fn check_sender(&self, request: &TransactionRequest) -> TxResult<()> {
        let account = self.address();
        if request.from != account {
            return Err(TxManagerError::AccountMismatch {
                account,
                requested: request.from,
            });
        }
        Ok(())
    }

    /// The nonce `request` would be signed with.
    ///
    /// An explicit nonce is returned as-is. Otherwise a nonce is allocated from
    /// the sequencer and is consumed whether or not it is ever used. An offline
    /// manager has no sequencer and fails with `InvalidNonce`.
    pub async fn get_nonce(&self, request: &TransactionRequest) -> TxResult<U256> {
        match (request.nonce, &self.nonce_sequencer) {
            (NonceSetting::Fixed(nonce), _) => Ok(nonce),
            (NonceSetting::Auto, Some(sequencer)) => sequencer.next_nonce(self.address()).await,
            (NonceSetting::Auto, None) => Err(TxManagerError::InvalidNonce),
        }
    }

    /// Sign a transaction without broadcasting it
    pub async fn sign(&self, request: TransactionRequest) -> TxResult<SignedTransaction> {
        self.check_sender(&request)?;

        // Gas price first: a failed price query should not burn a nonce
        let gas_price = if request.gas_price.needs_network() {
            let client = self.require_client("eth_gasPrice")?;
            Some(client.get_gas_price().await?)
        } else {
            None
        };

        // Left unset when offline so resolution reports `InvalidNonce`
        let nonce = match (request.nonce, &self.nonce_sequencer) {
            (NonceSetting::Auto, Some(sequencer)) => Some(sequencer.next_nonce(self.address()).await?),
            _ => None,
        };
        let resolved = resolve_request(
            request,
            FetchedDefaults {
                nonce,
                gas_price,
                default_gas_limit: self.default_gas_limit,
            },
        )?;
        debug!(
            "{:?} -> {}: nonce {}",
            self.address(),
            TransactionStage::NonceAssigned,
            resolved.nonce
        );

        let signed = sign_transaction(self.account.wallet(), resolved, self.signing_mode)?;

        debug!(
            "{:?} -> {}: {:?} (nonce {})",
            self.address(),
            TransactionStage::Signed,
            signed.hash,
            signed.transaction.nonce
        );
        metrics::record_tx_signed();

        Ok(signed)
    }

    /// Sign and broadcast a transaction, returning its hash.
    ///
    /// With an auto nonce, retrying after an error produces a new transaction
    /// with a new nonce; the earlier nonce stays consumed.
    pub async fn sign_and_send(&self, request: TransactionRequest) -> TxResult<H256> {
        self.check_sender(&request)?;
        let client = self.require_client("eth_sendRawTransaction")?.clone();

        let signed = self.sign(request).await?;
        let nonce = signed.transaction.nonce;

        match client.send_raw_transaction(signed.raw).await {
            Ok(tx_hash) => {
                info!(
                    "Transaction sent: {:?} (nonce {}, {})",
                    tx_hash,
                    nonce,
                    TransactionStage::Submitted
                );
                metrics::record_tx_sent();
                Ok(tx_hash)
            }
            Err(e) => {
                warn!(
                    "Broadcast of {:?} failed, nonce {} stays consumed: {}",
                    signed.hash, nonce, e
                );
                metrics::record_tx_send_failed();
                Err(e)
            }
        }
    }
}
