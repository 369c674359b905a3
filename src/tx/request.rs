//! Transaction requests and their resolution into signable transactions

use super::gas::{calculate_cost, GasLimitSetting, GasPriceSetting};
use super::signer::SigningMode;
use crate::error::{TxManagerError, TxResult};

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionRequest as LegacyRequest, U256};

/// Where a transaction's nonce comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NonceSetting {
    /// Allocate the next nonce from the account's sequencer
    #[default]
    Auto,
    /// Use this nonce as-is; the sequencer is not consulted
    Fixed(U256),
}

/// An unsigned transaction as submitted by the caller.
///
/// Signing consumes the request, so it cannot be mutated after a signature
/// has been produced over it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub from: Address,
    /// `None` creates a contract
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    pub nonce: NonceSetting,
    pub gas_price: GasPriceSetting,
    pub gas_limit: GasLimitSetting,
}

impl TransactionRequest {
    /// Create a request sent from `from` with every field left to its default
    pub fn new(from: Address) -> Self {
        Self {
            from,
            to: None,
            value: U256::zero(),
            data: Bytes::default(),
            nonce: NonceSetting::Auto,
            gas_price: GasPriceSetting::Network,
            gas_limit: GasLimitSetting::Default,
        }
    }

    /// A contract creation carrying `bytecode` as init code
    pub fn deploy(from: Address, bytecode: impl Into<Bytes>) -> Self {
        Self::new(from).data(bytecode)
    }

    #[must_use]
    pub fn to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    #[must_use]
    pub fn value(mut self, value: impl Into<U256>) -> Self {
        self.value = value.into();
        self
    }

    #[must_use]
    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }

    #[must_use]
    pub fn nonce(mut self, nonce: impl Into<U256>) -> Self {
        self.nonce = NonceSetting::Fixed(nonce.into());
        self
    }

    #[must_use]
    pub fn gas_price(mut self, gas_price: impl Into<U256>) -> Self {
        self.gas_price = GasPriceSetting::Fixed(gas_price.into());
        self
    }

    #[must_use]
    pub fn gas(mut self, gas_limit: impl Into<U256>) -> Self {
        self.gas_limit = GasLimitSetting::Fixed(gas_limit.into());
        self
    }

    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }
}

/// Values fetched or allocated on behalf of a request before resolution
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchedDefaults {
    /// Nonce handed out by the sequencer, when the request asked for one
    pub nonce: Option<U256>,
    /// Node-suggested gas price, when the request asked for one
    pub gas_price: Option<U256>,
    pub default_gas_limit: U256,
}

/// A transaction with every field decided, ready to sign
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTransaction {
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    pub nonce: U256,
    pub gas_price: U256,
    pub gas_limit: U256,
}

impl ResolvedTransaction {
    /// Build the unsigned legacy transaction the signer works over
    pub fn to_typed(&self, mode: SigningMode) -> TypedTransaction {
        let mut tx = LegacyRequest::new()
            .from(self.from)
            .value(self.value)
            .data(self.data.clone())
            .nonce(self.nonce)
            .gas_price(self.gas_price)
            .gas(self.gas_limit);

        if let Some(to) = self.to {
            tx = tx.to(to);
        }
        if let SigningMode::ChainAware(chain_id) = mode {
            tx = tx.chain_id(chain_id);
        }

        TypedTransaction::Legacy(tx)
    }

    /// Upper bound on the fee this transaction can burn
    pub fn max_fee(&self) -> U256 {
        calculate_cost(self.gas_limit, self.gas_price)
    }
}

/// Decide every field of `request` from its settings and the fetched defaults.
///
/// Explicit values always win. An auto nonce or network gas price that was not
/// fetched is an error rather than a silent zero.
pub fn resolve_request(
    request: TransactionRequest,
    fetched: FetchedDefaults,
) -> TxResult<ResolvedTransaction> {
    let nonce = match request.nonce {
        NonceSetting::Fixed(nonce) => nonce,
        NonceSetting::Auto => fetched.nonce.ok_or(TxManagerError::InvalidNonce)?,
    };

    let gas_price = request
        .gas_price
        .resolve(fetched.gas_price)
        .ok_or(TxManagerError::MissingClient {
            operation: "eth_gasPrice",
        })?;

    Ok(ResolvedTransaction {
        from: request.from,
        to: request.to,
        value: request.value,
        data: request.data,
        nonce,
        gas_price,
        gas_limit: request.gas_limit.resolve(fetched.default_gas_limit),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> FetchedDefaults {
        FetchedDefaults {
            nonce: None,
            gas_price: None,
            default_gas_limit: U256::from(21_000),
        }
    }

    #[test]
    fn test_explicit_fields_win() {
        let request = TransactionRequest::new(Address::repeat_byte(0xaa))
            .to(Address::repeat_byte(0xbb))
            .value(10u64)
            .nonce(3u64)
            .gas_price(9u64)
            .gas(50_000u64);

        let fetched = FetchedDefaults {
            nonce: Some(U256::from(99)),
            gas_price: Some(U256::from(99)),
            ..defaults()
        };
        let resolved = resolve_request(request, fetched).unwrap();

        assert_eq!(resolved.nonce, U256::from(3));
        assert_eq!(resolved.gas_price, U256::from(9));
        assert_eq!(resolved.gas_limit, U256::from(50_000));
        assert_eq!(resolved.max_fee(), U256::from(450_000));
    }

    #[test]
    fn test_auto_nonce_without_allocation_is_invalid() {
        let request = TransactionRequest::new(Address::zero()).gas_price(1u64);
        let result = resolve_request(request, defaults());
        assert!(matches!(result, Err(TxManagerError::InvalidNonce)));
    }

    #[test]
    fn test_defaults_fill_unset_fields() {
        let request = TransactionRequest::new(Address::zero());
        let fetched = FetchedDefaults {
            nonce: Some(U256::from(5)),
            gas_price: Some(U256::from(1_000_000_000u64)),
            ..defaults()
        };
        let resolved = resolve_request(request, fetched).unwrap();

        assert_eq!(resolved.nonce, U256::from(5));
        assert_eq!(resolved.gas_price, U256::from(1_000_000_000u64));
        assert_eq!(resolved.gas_limit, U256::from(21_000));
    }

    #[test]
    fn test_typed_transaction_shape() {
        let resolved = resolve_request(
            TransactionRequest::deploy(Address::repeat_byte(1), vec![0x60u8, 0x00])
                .nonce(0u64)
                .gas_price(1u64),
            defaults(),
        )
        .unwrap();

        let legacy = resolved.to_typed(SigningMode::Legacy);
        assert!(legacy.to().is_none());
        assert!(legacy.chain_id().is_none());

        let chain_aware = resolved.to_typed(SigningMode::ChainAware(1337));
        assert_eq!(chain_aware.chain_id(), Some(1337u64.into()));
        assert_eq!(chain_aware.nonce(), Some(&U256::zero()));
    }
}
