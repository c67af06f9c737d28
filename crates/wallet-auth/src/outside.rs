//! Transactions executed from outside the account, on behalf of a relayer.
//!
//! The relayer submits the account's `executeTransactionFromOutside` entry point and pays for
//! gas, so the inner transaction declares a zero gas price, gas limit and gas per pubdata byte.
//! The signatories do not sign the transaction digest directly but the EIP-191 message
//!
//! ```text
//! keccak256(abi.encode(executeTransactionFromOutside.selector, digest, relayer))
//! ```
//!
//! which binds the authorization to the relayer allowed to submit it.

use alloy_primitives::{keccak256, Address, Bytes, FixedBytes, B256, U256};
use alloy_sol_types::{SolCall, SolValue};
use tracing::debug;

use crate::{
    contracts::IAccount, AccountSigner, ChainProvider, DigestComputer, Result,
    SignatureAggregator, TransactionRequest,
};

/// Returns the message the signatories sign to authorize the transaction with `digest` for
/// submission by `relayer`.
pub fn outside_message_hash(digest: B256, relayer: Address) -> B256 {
    let selector = FixedBytes(IAccount::executeTransactionFromOutsideCall::SELECTOR);
    keccak256((selector, digest, relayer).abi_encode())
}

/// A signed transaction ready for outside execution.
#[derive(Debug, Clone)]
pub struct OutsideTransaction {
    /// The populated inner transaction.
    pub request: TransactionRequest,
    /// The digest of the inner transaction.
    pub digest: B256,
    /// The message signed by the signatories, before EIP-191 prefixing.
    pub message_hash: B256,
    /// The aggregated signature.
    pub signature: Bytes,
    /// The transaction as passed to the account.
    pub call: IAccount::Transaction,
}

impl OutsideTransaction {
    /// Returns the `executeTransactionFromOutside` call data.
    pub fn calldata(&self) -> Bytes {
        IAccount::executeTransactionFromOutsideCall { transaction: self.call.clone() }
            .abi_encode()
            .into()
    }

    /// Returns the request the relayer submits.
    pub fn relay_request(&self) -> TransactionRequest {
        let account = self.request.from.unwrap_or_default();
        TransactionRequest::default().to(account).data(self.calldata())
    }
}

/// Builds outside transactions of an account for one relayer.
#[derive(Debug)]
pub struct OutsideTransactionBuilder<'a, P> {
    signer: &'a AccountSigner<P>,
    relayer: Address,
}

impl<'a, P: ChainProvider> OutsideTransactionBuilder<'a, P> {
    /// Creates a builder signing with `signer`'s signatories for submission by `relayer`.
    pub const fn new(signer: &'a AccountSigner<P>, relayer: Address) -> Self {
        Self { signer, relayer }
    }

    /// Zeroes the gas fields of a request, populates the rest and signs it.
    ///
    /// No validation happens here: a wrong signatory set or relayer only shows when the account
    /// rejects the call.
    pub async fn build(&self, mut tx: TransactionRequest) -> Result<OutsideTransaction> {
        tx.gas_price = Some(0);
        tx.max_fee_per_gas = None;
        tx.max_priority_fee_per_gas = None;
        tx.gas_limit = Some(0);
        tx.custom_data.gas_per_pubdata = Some(0);
        let request = self.signer.populate(tx).await?;

        let (input, digest) = DigestComputer::compute(&request)?;
        let message_hash = outside_message_hash(digest, self.relayer);
        let signature = SignatureAggregator::new(self.signer.signatories())
            .sign_message(message_hash.as_slice())
            .await?;
        debug!(relayer = %self.relayer, %digest, %message_hash, "Signed outside transaction");

        let call = IAccount::Transaction {
            txType: input.txType,
            from: input.from,
            to: input.to,
            gasLimit: input.gasLimit,
            gasPerPubdataByteLimit: input.gasPerPubdataByteLimit,
            maxFeePerGas: input.maxFeePerGas,
            maxPriorityFeePerGas: input.maxPriorityFeePerGas,
            paymaster: input.paymaster,
            nonce: input.nonce,
            value: input.value,
            reserved: [U256::ZERO; 4],
            data: input.data,
            signature: signature.clone(),
            factoryDeps: input.factoryDeps,
            paymasterInput: input.paymasterInput,
            reservedDynamic: Bytes::new(),
        };

        Ok(OutsideTransaction { request, digest, message_hash, signature, call })
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;

    use super::*;

    #[test]
    fn test_message_binds_relayer() {
        let digest = keccak256("digest");
        let a = outside_message_hash(digest, address!("00000000000000000000000000000000000000aa"));
        let b = outside_message_hash(digest, address!("00000000000000000000000000000000000000bb"));
        assert_ne!(a, b);
        assert_ne!(a, outside_message_hash(keccak256("other"), Address::ZERO));
    }

    #[test]
    fn test_message_layout() {
        let digest = keccak256("digest");
        let relayer = address!("00000000000000000000000000000000000000aa");

        let mut preimage = [0u8; 96];
        preimage[..4].copy_from_slice(&IAccount::executeTransactionFromOutsideCall::SELECTOR);
        preimage[32..64].copy_from_slice(digest.as_slice());
        preimage[76..].copy_from_slice(relayer.as_slice());
        assert_eq!(outside_message_hash(digest, relayer), keccak256(preimage));
    }
}
