//! Test utilities for the wallet client.

mod keys;
mod provider;

pub use keys::*;
pub use provider::*;
