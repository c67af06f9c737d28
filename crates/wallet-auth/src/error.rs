use alloy_json_rpc::ErrorPayload;
use alloy_primitives::Address;
use alloy_transport::TransportError;

use crate::{bytecode::BytecodeError, escape::EscapeError};

/// Where a contract-side deterministic address was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum AddressOrigin {
    /// The factory's own prediction entry point.
    #[display("factory prediction")]
    Factory,
    /// The contract-creation record of the deployment transaction.
    #[display("deployment record")]
    Deployment,
}

/// Error types of the wallet client.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// The request carries an explicit sender that is not the wallet account.
    #[error("transaction from {from} does not match signer address {signer}")]
    SignerMismatch {
        /// The sender set on the request
        from: Address,
        /// The wallet account the signer signs for
        signer: Address,
    },

    /// A field required by the signing schema was not populated.
    #[error("transaction field `{0}` is not populated")]
    MissingField(&'static str),

    /// A signatory failed to sign.
    #[error("signing failed: {0}")]
    Signing(#[from] alloy_signer::Error),

    /// RPC transport error.
    #[error("RPC transport error: {0}")]
    Rpc(TransportError),

    /// The node rejected the request, e.g. the destination contract reverted during estimation
    /// or submission. Carries the node's message verbatim.
    #[error("rejected by the chain: {0}")]
    Reverted(String),

    /// The envelope has no signature bytes.
    #[error("empty signatures are not supported")]
    EmptySignature,

    /// The envelope bytes are not a valid typed transaction.
    #[error("invalid transaction encoding: {0}")]
    Decode(#[from] alloy_rlp::Error),

    /// The envelope type byte is not the account-abstraction type.
    #[error("unexpected transaction type {0:#x}")]
    UnexpectedTxType(u8),

    /// A dependency or proxy bytecode cannot be hashed.
    #[error("invalid bytecode: {0}")]
    Bytecode(#[from] BytecodeError),

    /// Contract return data cannot be decoded.
    #[error("ABI decoding failed: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    /// The client-side and contract-side deterministic addresses disagree.
    #[error("predicted address {predicted} does not match {observed} from {origin}")]
    AddressPredictionMismatch {
        /// The address computed by the client
        predicted: Address,
        /// The address reported by the chain
        observed: Address,
        /// Where the chain-side address came from
        origin: AddressOrigin,
    },

    /// No contract-creation record was found in the deployment transaction.
    #[error("no contract deployment recorded for deployer {0}")]
    DeploymentNotFound(Address),

    /// An escape transition was rejected.
    #[error(transparent)]
    Escape(#[from] EscapeError),

    /// The stored escape type is not a known value.
    #[error("unknown escape type {0}")]
    UnknownEscapeType(u8),

    /// The chain did not reach the target timestamp within the wait bound.
    #[error("timed out waiting for block timestamp {target} (latest {latest})")]
    TimestampWaitTimeout {
        /// The awaited block timestamp
        target: u64,
        /// The latest block timestamp observed
        latest: u64,
    },
}

impl From<TransportError> for WalletError {
    fn from(err: TransportError) -> Self {
        match err.as_error_resp() {
            Some(payload) => Self::Reverted(revert_reason(payload)),
            None => Self::Rpc(err),
        }
    }
}

/// The node's message, followed by the raw revert data when the node returns any.
fn revert_reason(payload: &ErrorPayload) -> String {
    match &payload.data {
        Some(data) => format!("{} ({})", payload.message, data.get()),
        None => payload.message.to_string(),
    }
}

/// Result type of the wallet client.
pub type Result<T, E = WalletError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use alloy_transport::{RpcError, TransportErrorKind};

    use super::*;

    #[test]
    fn test_error_response_is_reverted() {
        let err: TransportError = RpcError::ErrorResp(ErrorPayload {
            code: 3,
            message: "execution reverted: argent/invalid-signature-length".into(),
            data: None,
        });
        assert!(matches!(
            WalletError::from(err),
            WalletError::Reverted(reason) if reason.contains("invalid-signature-length")
        ));

        let err = TransportErrorKind::custom_str("connection refused");
        assert!(matches!(WalletError::from(err), WalletError::Rpc(_)));
    }
}
