//! Transaction request types.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::constants::tx::DEFAULT_GAS_PER_PUBDATA_LIMIT;

/// Sponsor (paymaster) reference of a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymasterParams {
    /// The sponsor contract paying for the transaction.
    pub paymaster: Address,
    /// Sponsor-specific input, passed verbatim to the sponsor contract.
    pub paymaster_input: Bytes,
}

/// The fee-payment extension block of a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Meta {
    /// The per-byte publishing cost limit. Falls back to [`DEFAULT_GAS_PER_PUBDATA_LIMIT`] only
    /// when absent.
    #[serde(default, with = "alloy_serde::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub gas_per_pubdata: Option<u64>,
    /// Full bytecodes of the contracts the transaction depends on.
    #[serde(default)]
    pub factory_deps: Vec<Bytes>,
    /// The signature carried by the envelope. Set by the signer, never by the caller.
    pub custom_signature: Option<Bytes>,
    /// Optional sponsor reference.
    pub paymaster_params: Option<PaymasterParams>,
}

/// A transaction request sent from a wallet account.
///
/// Every field is optional while the request is being built; [`crate::AccountSigner::populate`]
/// fills the unset ones from chain state. An explicitly set field is never overwritten, and an
/// explicit zero is a value, not an absence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    /// Transaction type.
    #[serde(
        rename = "type",
        default,
        with = "alloy_serde::quantity::opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub tx_type: Option<u8>,
    /// The sender; must be the wallet account if set.
    pub from: Option<Address>,
    /// The destination, `None` for deployments.
    pub to: Option<Address>,
    /// Value transferred with the call.
    pub value: Option<U256>,
    /// Call data.
    pub data: Option<Bytes>,
    /// Chain id of the network.
    #[serde(default, with = "alloy_serde::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    /// Account nonce.
    #[serde(default, with = "alloy_serde::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    /// Gas limit.
    #[serde(default, with = "alloy_serde::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<u64>,
    /// Legacy gas price, used as the fee cap only when no explicit fee cap is set.
    #[serde(default, with = "alloy_serde::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<u128>,
    /// Fee cap per unit of gas.
    #[serde(default, with = "alloy_serde::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<u128>,
    /// Priority fee per unit of gas.
    #[serde(default, with = "alloy_serde::quantity::opt", skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<u128>,
    /// Fee-payment extension block.
    #[serde(default)]
    pub custom_data: Eip712Meta,
}

impl TransactionRequest {
    /// Sets the destination.
    pub fn to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    /// Sets the sender.
    pub fn from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    /// Sets the call data.
    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Sets the transferred value.
    pub fn value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    /// Sets the nonce.
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Sets the gas limit.
    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    /// Sets the legacy gas price.
    pub fn gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    /// Sets the fee cap.
    pub fn max_fee_per_gas(mut self, max_fee_per_gas: u128) -> Self {
        self.max_fee_per_gas = Some(max_fee_per_gas);
        self
    }

    /// Sets the priority fee.
    pub fn max_priority_fee_per_gas(mut self, max_priority_fee_per_gas: u128) -> Self {
        self.max_priority_fee_per_gas = Some(max_priority_fee_per_gas);
        self
    }

    /// Sets the chain id.
    pub fn chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// Sets the per-byte publishing cost limit.
    pub fn gas_per_pubdata(mut self, gas_per_pubdata: u64) -> Self {
        self.custom_data.gas_per_pubdata = Some(gas_per_pubdata);
        self
    }

    /// Sets the sponsor reference.
    pub fn paymaster(mut self, paymaster: Address, paymaster_input: impl Into<Bytes>) -> Self {
        self.custom_data.paymaster_params =
            Some(PaymasterParams { paymaster, paymaster_input: paymaster_input.into() });
        self
    }

    /// Adds a dependency bytecode.
    pub fn factory_dep(mut self, bytecode: impl Into<Bytes>) -> Self {
        self.custom_data.factory_deps.push(bytecode.into());
        self
    }

    /// Returns the fee cap used for signing and encoding: the explicit fee cap, else the legacy
    /// gas price, else zero. Only an absent value falls back; an explicit zero is kept.
    pub fn resolved_max_fee_per_gas(&self) -> u128 {
        self.max_fee_per_gas.or(self.gas_price).unwrap_or_default()
    }

    /// Returns the priority fee used for signing and encoding: the explicit priority fee, else
    /// the resolved fee cap.
    pub fn resolved_max_priority_fee_per_gas(&self) -> u128 {
        self.max_priority_fee_per_gas.unwrap_or_else(|| self.resolved_max_fee_per_gas())
    }

    /// Returns the per-byte publishing cost limit, falling back to the network default only when
    /// absent.
    pub fn resolved_gas_per_pubdata(&self) -> u64 {
        self.custom_data.gas_per_pubdata.unwrap_or(DEFAULT_GAS_PER_PUBDATA_LIMIT)
    }

    /// Returns the sponsor address, or the zero address without a sponsor.
    pub fn paymaster_address(&self) -> Address {
        self.custom_data.paymaster_params.as_ref().map(|p| p.paymaster).unwrap_or_default()
    }

    /// Returns the sponsor input, or empty bytes without a sponsor.
    pub fn paymaster_input(&self) -> Bytes {
        self.custom_data
            .paymaster_params
            .as_ref()
            .map(|p| p.paymaster_input.clone())
            .unwrap_or_default()
    }
}
