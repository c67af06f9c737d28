//! Wire encoding of signed account-abstraction transactions.
//!
//! A signed envelope is serialized as
//!
//! ```text
//! 0x71 || rlp([nonce, maxPriorityFeePerGas, maxFeePerGas, gasLimit, to, value, data,
//!              chainId, "", "", chainId, from, gasPerPubdata, [factoryDeps...],
//!              customSignature, [paymaster, paymasterInput] | []])
//! ```
//!
//! The two empty strings stand in for the `r`/`s` fields of an ECDSA-signed transaction; the
//! actual authorization is the aggregated `customSignature`. A contract creation carries an empty
//! string as `to`.

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_rlp::{Decodable, Encodable, Header, EMPTY_LIST_CODE, EMPTY_STRING_CODE};
use tracing::trace;

use crate::{
    constants::tx::EIP712_TX_TYPE, DigestComputer, PaymasterParams, Result, TransactionRequest,
    WalletError,
};

/// A populated transaction together with its aggregated signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    tx: TransactionRequest,
}

impl SignedEnvelope {
    /// Attaches an aggregated signature to a populated transaction.
    pub fn new(mut tx: TransactionRequest, signature: Bytes) -> Self {
        tx.custom_data.custom_signature = Some(signature);
        Self { tx }
    }

    /// Returns the signed transaction.
    pub const fn tx(&self) -> &TransactionRequest {
        &self.tx
    }

    /// Returns the aggregated signature.
    pub fn signature(&self) -> &[u8] {
        match &self.tx.custom_data.custom_signature {
            Some(signature) => &signature[..],
            None => &[],
        }
    }

    /// Consumes the envelope and returns the signed transaction.
    pub fn into_tx(self) -> TransactionRequest {
        self.tx
    }

    /// Recomputes the signing digest from the enveloped fields.
    pub fn digest(&self) -> Result<B256> {
        DigestComputer::digest(&self.tx)
    }

    /// Serializes the envelope into its typed-transaction wire form.
    ///
    /// Fails with [`WalletError::EmptySignature`] if the signature is empty, and with
    /// [`WalletError::MissingField`] if the transaction is not populated.
    pub fn encoded(&self) -> Result<Bytes> {
        let tx = &self.tx;
        let signature = match &tx.custom_data.custom_signature {
            Some(signature) if !signature.is_empty() => signature,
            _ => return Err(WalletError::EmptySignature),
        };
        let nonce = tx.nonce.ok_or(WalletError::MissingField("nonce"))?;
        let gas_limit = tx.gas_limit.ok_or(WalletError::MissingField("gas_limit"))?;
        let chain_id = tx.chain_id.ok_or(WalletError::MissingField("chain_id"))?;
        let from = tx.from.ok_or(WalletError::MissingField("from"))?;

        let mut payload = Vec::new();
        nonce.encode(&mut payload);
        tx.resolved_max_priority_fee_per_gas().encode(&mut payload);
        tx.resolved_max_fee_per_gas().encode(&mut payload);
        gas_limit.encode(&mut payload);
        match tx.to {
            Some(to) => to.encode(&mut payload),
            None => payload.push(EMPTY_STRING_CODE),
        }
        tx.value.unwrap_or_default().encode(&mut payload);
        tx.data.clone().unwrap_or_default().encode(&mut payload);
        chain_id.encode(&mut payload);
        payload.push(EMPTY_STRING_CODE);
        payload.push(EMPTY_STRING_CODE);
        chain_id.encode(&mut payload);
        from.encode(&mut payload);
        tx.resolved_gas_per_pubdata().encode(&mut payload);
        tx.custom_data.factory_deps.encode(&mut payload);
        signature.encode(&mut payload);
        match &tx.custom_data.paymaster_params {
            Some(params) => {
                let payload_length = params.paymaster.length() + params.paymaster_input.length();
                Header { list: true, payload_length }.encode(&mut payload);
                params.paymaster.encode(&mut payload);
                params.paymaster_input.encode(&mut payload);
            }
            None => payload.push(EMPTY_LIST_CODE),
        }

        let mut out = Vec::with_capacity(payload.len() + 10);
        out.push(EIP712_TX_TYPE);
        Header { list: true, payload_length: payload.len() }.encode(&mut out);
        out.extend_from_slice(&payload);

        trace!(nonce, %from, chain_id, length = out.len(), "Encoded signed envelope");
        Ok(out.into())
    }

    /// Decodes an envelope from its typed-transaction wire form.
    pub fn decode(encoded: &[u8]) -> Result<Self> {
        let (&tx_type, mut buf) =
            encoded.split_first().ok_or(WalletError::Decode(alloy_rlp::Error::InputTooShort))?;
        if tx_type != EIP712_TX_TYPE {
            return Err(WalletError::UnexpectedTxType(tx_type));
        }

        let header = Header::decode(&mut buf)?;
        if !header.list {
            return Err(alloy_rlp::Error::UnexpectedString.into());
        }
        if buf.len() != header.payload_length {
            return Err(alloy_rlp::Error::UnexpectedLength.into());
        }

        let nonce = u64::decode(&mut buf)?;
        let max_priority_fee_per_gas = u128::decode(&mut buf)?;
        let max_fee_per_gas = u128::decode(&mut buf)?;
        let gas_limit = u64::decode(&mut buf)?;
        let to = Bytes::decode(&mut buf)?;
        let to = if to.is_empty() {
            None
        } else {
            Some(Address::try_from(&to[..]).map_err(|_| alloy_rlp::Error::UnexpectedLength)?)
        };
        let value = U256::decode(&mut buf)?;
        let data = Bytes::decode(&mut buf)?;
        let chain_id = u64::decode(&mut buf)?;
        // Unused `r` and `s`.
        Bytes::decode(&mut buf)?;
        Bytes::decode(&mut buf)?;
        let _ = u64::decode(&mut buf)?;
        let from = Address::decode(&mut buf)?;
        let gas_per_pubdata = u64::decode(&mut buf)?;
        let factory_deps = Vec::<Bytes>::decode(&mut buf)?;
        let signature = Bytes::decode(&mut buf)?;

        let paymaster_header = Header::decode(&mut buf)?;
        if !paymaster_header.list {
            return Err(alloy_rlp::Error::UnexpectedString.into());
        }
        let paymaster_params = if paymaster_header.payload_length == 0 {
            None
        } else {
            Some(PaymasterParams {
                paymaster: Address::decode(&mut buf)?,
                paymaster_input: Bytes::decode(&mut buf)?,
            })
        };

        if !buf.is_empty() {
            return Err(alloy_rlp::Error::ListLengthMismatch {
                expected: header.payload_length,
                got: header.payload_length - buf.len(),
            }
            .into());
        }

        let mut tx = TransactionRequest {
            tx_type: Some(tx_type),
            from: Some(from),
            to,
            value: Some(value),
            data: Some(data),
            chain_id: Some(chain_id),
            nonce: Some(nonce),
            gas_limit: Some(gas_limit),
            gas_price: None,
            max_fee_per_gas: Some(max_fee_per_gas),
            max_priority_fee_per_gas: Some(max_priority_fee_per_gas),
            custom_data: Default::default(),
        };
        tx.custom_data.gas_per_pubdata = Some(gas_per_pubdata);
        tx.custom_data.factory_deps = factory_deps;
        tx.custom_data.paymaster_params = paymaster_params;

        Ok(Self::new(tx, signature))
    }
}
