use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use alloy_json_rpc::ErrorPayload;
use alloy_primitives::{keccak256, Address, Bytes, Log, B256};
use alloy_transport::{RpcError, TransportErrorKind, TransportResult};

use crate::{ChainProvider, TransactionRequest};

/// The chain id a [`MockChainProvider`] reports by default.
pub const MOCK_CHAIN_ID: u64 = 300;

/// The gas price a [`MockChainProvider`] reports by default.
pub const MOCK_GAS_PRICE: u128 = 250_000_000;

/// The gas estimate a [`MockChainProvider`] reports by default.
pub const MOCK_GAS_ESTIMATE: u64 = 1_000_000;

/// The block timestamp a [`MockChainProvider`] starts at by default.
pub const MOCK_GENESIS_TIMESTAMP: u64 = 1_700_000_000;

/// An in-memory [`ChainProvider`] with scripted responses that records what it is asked.
///
/// Every latest-timestamp query observes a new block: the timestamp advances by the configured
/// step after being reported.
#[derive(Debug)]
pub struct MockChainProvider {
    state: Mutex<MockState>,
}

#[derive(Debug)]
struct MockState {
    chain_id: u64,
    gas_price: u128,
    gas_estimate: u64,
    nonces: HashMap<Address, u64>,
    timestamp: u64,
    timestamp_step: u64,
    calls: HashMap<(Address, Bytes), Bytes>,
    logs: HashMap<B256, Vec<Log>>,
    revert_reason: Option<String>,
    sent: Vec<Bytes>,
    estimate_requests: Vec<TransactionRequest>,
    chain_id_queries: usize,
    gas_price_queries: usize,
    nonce_queries: usize,
    timestamp_queries: usize,
}

impl Default for MockChainProvider {
    fn default() -> Self {
        Self {
            state: Mutex::new(MockState {
                chain_id: MOCK_CHAIN_ID,
                gas_price: MOCK_GAS_PRICE,
                gas_estimate: MOCK_GAS_ESTIMATE,
                nonces: HashMap::new(),
                timestamp: MOCK_GENESIS_TIMESTAMP,
                timestamp_step: 0,
                calls: HashMap::new(),
                logs: HashMap::new(),
                revert_reason: None,
                sent: Vec::new(),
                estimate_requests: Vec::new(),
                chain_id_queries: 0,
                gas_price_queries: 0,
                nonce_queries: 0,
                timestamp_queries: 0,
            }),
        }
    }
}

impl MockChainProvider {
    /// Creates a provider with the default responses.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Sets the chain id.
    pub fn with_chain_id(self, chain_id: u64) -> Self {
        self.state().chain_id = chain_id;
        self
    }

    /// Sets the gas price.
    pub fn with_gas_price(self, gas_price: u128) -> Self {
        self.state().gas_price = gas_price;
        self
    }

    /// Sets the gas estimate.
    pub fn with_gas_estimate(self, gas_estimate: u64) -> Self {
        self.state().gas_estimate = gas_estimate;
        self
    }

    /// Sets the pending nonce of an account.
    pub fn with_nonce(self, address: Address, nonce: u64) -> Self {
        self.state().nonces.insert(address, nonce);
        self
    }

    /// Sets the block timestamp.
    pub fn with_timestamp(self, timestamp: u64) -> Self {
        self.set_timestamp(timestamp);
        self
    }

    /// Sets how far the block timestamp advances after every query.
    pub fn with_timestamp_step(self, step: u64) -> Self {
        self.state().timestamp_step = step;
        self
    }

    /// Sets the output of a call.
    pub fn with_call(self, to: Address, data: impl Into<Bytes>, output: impl Into<Bytes>) -> Self {
        self.set_call(to, data, output);
        self
    }

    /// Sets the logs of a transaction.
    pub fn with_logs(self, hash: B256, logs: Vec<Log>) -> Self {
        self.state().logs.insert(hash, logs);
        self
    }

    /// Makes estimation and submission fail with an error response carrying `reason`.
    pub fn with_revert(self, reason: impl Into<String>) -> Self {
        self.state().revert_reason = Some(reason.into());
        self
    }

    /// Sets the block timestamp.
    pub fn set_timestamp(&self, timestamp: u64) {
        self.state().timestamp = timestamp;
    }

    /// Sets the output of a call.
    pub fn set_call(&self, to: Address, data: impl Into<Bytes>, output: impl Into<Bytes>) {
        self.state().calls.insert((to, data.into()), output.into());
    }

    /// Returns the raw transactions sent so far.
    pub fn sent_transactions(&self) -> Vec<Bytes> {
        self.state().sent.clone()
    }

    /// Returns the requests gas was estimated for so far.
    pub fn estimate_requests(&self) -> Vec<TransactionRequest> {
        self.state().estimate_requests.clone()
    }

    /// Returns how often the chain id was queried.
    pub fn chain_id_queries(&self) -> usize {
        self.state().chain_id_queries
    }

    /// Returns how often the gas price was queried.
    pub fn gas_price_queries(&self) -> usize {
        self.state().gas_price_queries
    }

    /// Returns how often a pending nonce was queried.
    pub fn nonce_queries(&self) -> usize {
        self.state().nonce_queries
    }

    /// Returns how often the latest block timestamp was queried.
    pub fn timestamp_queries(&self) -> usize {
        self.state().timestamp_queries
    }

    /// Returns the total number of queries and submissions.
    pub fn total_queries(&self) -> usize {
        let state = self.state();
        state.chain_id_queries
            + state.gas_price_queries
            + state.nonce_queries
            + state.timestamp_queries
            + state.estimate_requests.len()
            + state.sent.len()
    }

    fn revert(&self) -> TransportResult<()> {
        match &self.state().revert_reason {
            Some(reason) => Err(RpcError::ErrorResp(ErrorPayload {
                code: 3,
                message: reason.clone().into(),
                data: None,
            })),
            None => Ok(()),
        }
    }
}

impl ChainProvider for MockChainProvider {
    async fn chain_id(&self) -> TransportResult<u64> {
        let mut state = self.state();
        state.chain_id_queries += 1;
        Ok(state.chain_id)
    }

    async fn gas_price(&self) -> TransportResult<u128> {
        let mut state = self.state();
        state.gas_price_queries += 1;
        Ok(state.gas_price)
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> TransportResult<u64> {
        self.state().estimate_requests.push(tx.clone());
        self.revert()?;
        Ok(self.state().gas_estimate)
    }

    async fn pending_nonce(&self, address: Address) -> TransportResult<u64> {
        let mut state = self.state();
        state.nonce_queries += 1;
        Ok(state.nonces.get(&address).copied().unwrap_or_default())
    }

    async fn latest_timestamp(&self) -> TransportResult<u64> {
        let mut state = self.state();
        state.timestamp_queries += 1;
        let timestamp = state.timestamp;
        state.timestamp += state.timestamp_step;
        Ok(timestamp)
    }

    async fn call(&self, to: Address, data: Bytes) -> TransportResult<Bytes> {
        self.state()
            .calls
            .get(&(to, data))
            .cloned()
            .ok_or_else(|| TransportErrorKind::custom_str("no mock output for call"))
    }

    async fn send_raw_transaction(&self, encoded: Bytes) -> TransportResult<B256> {
        self.revert()?;
        let hash = keccak256(&encoded);
        self.state().sent.push(encoded);
        Ok(hash)
    }

    async fn transaction_logs(&self, hash: B256) -> TransportResult<Vec<Log>> {
        self.state()
            .logs
            .get(&hash)
            .cloned()
            .ok_or_else(|| TransportErrorKind::custom_str("transaction receipt not found"))
    }
}
