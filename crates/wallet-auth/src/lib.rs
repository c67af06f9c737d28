//! Client-side authorization for guardian-protected smart-contract wallets on rollups with
//! native account abstraction.
//!
//! A wallet account is controlled by an owner and an optional guardian. Transactions are typed
//! `0x71` envelopes carrying one 65-byte signature slot per signatory, signed over the EIP-712
//! digest of the transaction. The crate builds, signs and sends such transactions, predicts the
//! deterministic addresses accounts are deployed at, authorizes transactions relayed from
//! outside the account, and drives the escape protocol that lets either signer replace the other.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod bytecode;
pub mod constants;
pub mod contracts;
pub mod escape;
pub use escape::*;

mod types;
pub use types::*;

mod error;
pub use error::*;

mod digest;
pub use digest::*;

mod signatory;
pub use signatory::*;

mod aggregator;
pub use aggregator::*;

mod envelope;
pub use envelope::*;

mod provider;
pub use provider::*;

mod builder;
pub use builder::*;

mod outside;
pub use outside::*;

mod address;
pub use address::*;

mod context;
pub use context::*;

mod config;
pub use config::*;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
