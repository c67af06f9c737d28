//! Transaction digest computation under the fixed typed-data schema.
//!
//! Transactions are signed as the EIP-712 struct
//!
//! ```text
//! Transaction(uint256 txType,uint256 from,uint256 to,uint256 gasLimit,
//!             uint256 gasPerPubdataByteLimit,uint256 maxFeePerGas,uint256 maxPriorityFeePerGas,
//!             uint256 paymaster,uint256 nonce,uint256 value,bytes data,bytes32[] factoryDeps,
//!             bytes paymasterInput)
//! ```
//!
//! under the domain `EIP712Domain(string name,string version,uint256 chainId)`.
//!
//! ## Fee fields
//!
//! Fee fields are taken literally. An explicit zero `maxFeePerGas` stays zero even when a legacy
//! gas price is present; the gas price is used only when no fee cap was set at all. Zero-fee
//! transactions (outside execution) depend on this: substituting the gas price for an explicit
//! zero would sign a different digest than the one the account recomputes on-chain.

use std::borrow::Cow;

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{Eip712Domain, SolStruct};

use crate::{
    bytecode::hash_bytecode,
    constants::eip712::{DOMAIN_NAME, DOMAIN_VERSION},
    Result, TransactionRequest, WalletError,
};

/// The typed-data struct transactions are signed as.
pub mod eip712 {
    alloy_sol_types::sol! {
        /// The signed fields of a wallet transaction.
        #[derive(Debug, PartialEq, Eq)]
        struct Transaction {
            uint256 txType;
            uint256 from;
            uint256 to;
            uint256 gasLimit;
            uint256 gasPerPubdataByteLimit;
            uint256 maxFeePerGas;
            uint256 maxPriorityFeePerGas;
            uint256 paymaster;
            uint256 nonce;
            uint256 value;
            bytes data;
            bytes32[] factoryDeps;
            bytes paymasterInput;
        }
    }
}

pub use eip712::Transaction as SignInput;

/// Returns the signing domain for the given chain.
pub fn eip712_domain(chain_id: u64) -> Eip712Domain {
    Eip712Domain::new(
        Some(Cow::Borrowed(DOMAIN_NAME)),
        Some(Cow::Borrowed(DOMAIN_VERSION)),
        Some(U256::from(chain_id)),
        None,
        None,
    )
}

/// Left-pads an address into a `uint256`.
pub(crate) fn address_to_uint(address: Address) -> U256 {
    U256::from_be_bytes(address.into_word().0)
}

/// Computes signing digests of populated transactions.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestComputer;

impl DigestComputer {
    /// Builds the typed sign input of a populated transaction.
    ///
    /// Fails with [`WalletError::MissingField`] if a field that has no schema default (type,
    /// sender, gas limit, nonce) is absent, and with [`WalletError::Bytecode`] if a dependency
    /// cannot be hashed.
    pub fn sign_input(tx: &TransactionRequest) -> Result<SignInput> {
        let tx_type = tx.tx_type.ok_or(WalletError::MissingField("tx_type"))?;
        let from = tx.from.ok_or(WalletError::MissingField("from"))?;
        let gas_limit = tx.gas_limit.ok_or(WalletError::MissingField("gas_limit"))?;
        let nonce = tx.nonce.ok_or(WalletError::MissingField("nonce"))?;

        let factory_deps = tx
            .custom_data
            .factory_deps
            .iter()
            .map(|dep| hash_bytecode(dep))
            .collect::<Result<Vec<B256>, _>>()?;

        Ok(SignInput {
            txType: U256::from(tx_type),
            from: address_to_uint(from),
            to: address_to_uint(tx.to.unwrap_or_default()),
            gasLimit: U256::from(gas_limit),
            gasPerPubdataByteLimit: U256::from(tx.resolved_gas_per_pubdata()),
            maxFeePerGas: U256::from(tx.resolved_max_fee_per_gas()),
            maxPriorityFeePerGas: U256::from(tx.resolved_max_priority_fee_per_gas()),
            paymaster: address_to_uint(tx.paymaster_address()),
            nonce: U256::from(nonce),
            value: tx.value.unwrap_or_default(),
            data: tx.data.clone().unwrap_or_default(),
            factoryDeps: factory_deps,
            paymasterInput: tx.paymaster_input(),
        })
    }

    /// Computes the signing digest of a populated transaction.
    pub fn digest(tx: &TransactionRequest) -> Result<B256> {
        let chain_id = tx.chain_id.ok_or(WalletError::MissingField("chain_id"))?;
        Ok(Self::sign_input(tx)?.eip712_signing_hash(&eip712_domain(chain_id)))
    }

    /// Returns the typed sign input together with its digest.
    pub fn compute(tx: &TransactionRequest) -> Result<(SignInput, B256)> {
        let chain_id = tx.chain_id.ok_or(WalletError::MissingField("chain_id"))?;
        let input = Self::sign_input(tx)?;
        let digest = input.eip712_signing_hash(&eip712_domain(chain_id));
        Ok((input, digest))
    }
}
