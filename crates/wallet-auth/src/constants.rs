//! Constants of the account-abstraction network the wallet is deployed on.
//!
//! They are grouped as sub-modules by the protocol surface they belong to.

use alloy_primitives::{address, Address};

/// Constants of the native typed transaction.
pub mod tx {
    /// The transaction type of the network's native account-abstraction transaction. Every
    /// transaction sent from a wallet account carries this type.
    pub const EIP712_TX_TYPE: u8 = 0x71;

    /// The default per-byte publishing cost limit (gas per pubdata byte) used when the caller does
    /// not provide one.
    pub const DEFAULT_GAS_PER_PUBDATA_LIMIT: u64 = 50_000;
}

/// Constants of the typed-data signing domain.
pub mod eip712 {
    /// The `name` field of the EIP-712 domain under which transactions are signed.
    pub const DOMAIN_NAME: &str = "zkSync";

    /// The `version` field of the EIP-712 domain under which transactions are signed.
    pub const DOMAIN_VERSION: &str = "2";
}

/// Constants of the signature format.
pub mod signature {
    /// The length of one ECDSA signature slot: `r (32) || s (32) || v (1)`.
    pub const SIGNATURE_LENGTH: usize = 65;
}

/// Constants of deterministic deployment.
pub mod create2 {
    /// The string whose keccak256 hash prefixes every deterministic address preimage.
    pub const CREATE2_PREFIX_PREIMAGE: &[u8] = b"zksyncCreate2";
}

/// The system contract that records every contract creation with a `ContractDeployed` log.
pub const CONTRACT_DEPLOYER_ADDRESS: Address =
    address!("0x0000000000000000000000000000000000008006");
