//! The escape (social recovery) protocol of the account.
//!
//! An escape replaces the owner or the guardian after a security period, without the escaped
//! party's signature. The account stores at most one pending escape; its status is derived from the
//! block timestamp on every query.

mod client;
mod model;
mod types;
mod wait;

pub use client::*;
pub use model::*;
pub use types::*;
pub use wait::*;
