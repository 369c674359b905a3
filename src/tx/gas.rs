//! Gas price and gas limit settings for outgoing transactions

use ethers::types::U256;

/// Where a transaction's gas price comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GasPriceSetting {
    /// Ask the node for its suggested price at signing time
    #[default]
    Network,
    /// Use this price as-is
    Fixed(U256),
}

/// Where a transaction's gas limit comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GasLimitSetting {
    /// Use the manager's default gas limit
    #[default]
    Default,
    /// Use this limit as-is
    Fixed(U256),
}

impl GasPriceSetting {
    /// Whether resolving this setting needs an `eth_gasPrice` call
    pub fn needs_network(&self) -> bool {
        matches!(self, GasPriceSetting::Network)
    }

    /// Resolve against a price fetched from the node, if one was fetched
    pub fn resolve(&self, network_price: Option<U256>) -> Option<U256> {
        match self {
            GasPriceSetting::Fixed(price) => Some(*price),
            GasPriceSetting::Network => network_price,
        }
    }
}

impl GasLimitSetting {
    pub fn resolve(&self, default_limit: U256) -> U256 {
        match self {
            GasLimitSetting::Fixed(limit) => *limit,
            GasLimitSetting::Default => default_limit,
        }
    }
}

impl From<U256> for GasPriceSetting {
    fn from(price: U256) -> Self {
        GasPriceSetting::Fixed(price)
    }
}

impl From<U256> for GasLimitSetting {
    fn from(limit: U256) -> Self {
        GasLimitSetting::Fixed(limit)
    }
}

/// Calculate the maximum cost in wei of spending the whole gas limit
pub fn calculate_cost(gas_limit: U256, gas_price: U256) -> U256 {
    gas_limit.saturating_mul(gas_price)
}
