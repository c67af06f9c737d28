use alloy_primitives::{Address, B256};

use crate::{
    bytecode::hash_bytecode, AddressPredictor, ChainProvider, EscapeClient, EscapeConfig,
    NetworkConfig, Result,
};

/// The deployed wallet infrastructure an account lives in.
///
/// Built once per session, from a loaded [`NetworkConfig`] and the proxy bytecode, and passed
/// explicitly to the operations that need it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountContext {
    /// The account implementation behind every proxy.
    pub implementation: Address,
    /// The proxy factory.
    pub factory: Address,
    /// The versioned hash of the proxy bytecode.
    pub proxy_bytecode_hash: B256,
    /// Escape timing and limits of the implementation.
    pub escape: EscapeConfig,
}

impl AccountContext {
    /// Creates a context with the default escape configuration.
    pub fn new(implementation: Address, factory: Address, proxy_bytecode_hash: B256) -> Self {
        Self { implementation, factory, proxy_bytecode_hash, escape: EscapeConfig::default() }
    }

    /// Creates a context from a network configuration and the proxy bytecode.
    pub fn from_config(config: &NetworkConfig, proxy_bytecode: &[u8]) -> Result<Self> {
        Ok(Self::new(config.implementation, config.factory, hash_bytecode(proxy_bytecode)?))
    }

    /// Sets the escape configuration.
    pub const fn with_escape_config(mut self, escape: EscapeConfig) -> Self {
        self.escape = escape;
        self
    }

    /// Returns the predictor of account addresses.
    pub const fn address_predictor(&self) -> AddressPredictor {
        AddressPredictor::new(self.factory, self.implementation, self.proxy_bytecode_hash)
    }

    /// Returns an escape client for `account`.
    pub fn escape_client<P: ChainProvider>(
        &self,
        provider: P,
        account: Address,
    ) -> EscapeClient<P> {
        EscapeClient::new(provider, account, self.escape)
    }
}
