//! The chain access the wallet client needs, and its JSON-RPC implementation.

use std::{future::Future, sync::Arc};

use alloy_primitives::{Address, Bytes, Log, B256, U64};
use alloy_provider::Provider;
use alloy_rpc_types_eth::{BlockNumberOrTag, TransactionInput};
use alloy_transport::{TransportErrorKind, TransportResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::TransactionRequest;

/// Asynchronous access to chain state. Every method is one round trip to the node.
pub trait ChainProvider: Send + Sync {
    /// Returns the chain id.
    fn chain_id(&self) -> impl Future<Output = TransportResult<u64>> + Send;

    /// Returns the current gas price.
    fn gas_price(&self) -> impl Future<Output = TransportResult<u128>> + Send;

    /// Estimates the gas of a transaction by simulating it.
    fn estimate_gas(
        &self,
        tx: &TransactionRequest,
    ) -> impl Future<Output = TransportResult<u64>> + Send;

    /// Returns the pending transaction count of an account.
    fn pending_nonce(&self, address: Address) -> impl Future<Output = TransportResult<u64>> + Send;

    /// Returns the timestamp of the latest block.
    fn latest_timestamp(&self) -> impl Future<Output = TransportResult<u64>> + Send;

    /// Executes a read-only call against the latest block.
    fn call(&self, to: Address, data: Bytes) -> impl Future<Output = TransportResult<Bytes>> + Send;

    /// Broadcasts a signed transaction and returns its hash.
    fn send_raw_transaction(
        &self,
        encoded: Bytes,
    ) -> impl Future<Output = TransportResult<B256>> + Send;

    /// Returns the logs emitted by a mined transaction.
    fn transaction_logs(&self, hash: B256)
        -> impl Future<Output = TransportResult<Vec<Log>>> + Send;
}

macro_rules! forward_chain_provider {
    ($($ty:ty),*) => {$(
        impl<T: ChainProvider> ChainProvider for $ty {
            fn chain_id(&self) -> impl Future<Output = TransportResult<u64>> + Send {
                (**self).chain_id()
            }

            fn gas_price(&self) -> impl Future<Output = TransportResult<u128>> + Send {
                (**self).gas_price()
            }

            fn estimate_gas(
                &self,
                tx: &TransactionRequest,
            ) -> impl Future<Output = TransportResult<u64>> + Send {
                (**self).estimate_gas(tx)
            }

            fn pending_nonce(
                &self,
                address: Address,
            ) -> impl Future<Output = TransportResult<u64>> + Send {
                (**self).pending_nonce(address)
            }

            fn latest_timestamp(&self) -> impl Future<Output = TransportResult<u64>> + Send {
                (**self).latest_timestamp()
            }

            fn call(
                &self,
                to: Address,
                data: Bytes,
            ) -> impl Future<Output = TransportResult<Bytes>> + Send {
                (**self).call(to, data)
            }

            fn send_raw_transaction(
                &self,
                encoded: Bytes,
            ) -> impl Future<Output = TransportResult<B256>> + Send {
                (**self).send_raw_transaction(encoded)
            }

            fn transaction_logs(
                &self,
                hash: B256,
            ) -> impl Future<Output = TransportResult<Vec<Log>>> + Send {
                (**self).transaction_logs(hash)
            }
        }
    )*};
}

forward_chain_provider!(&T, Arc<T>);

/// [`ChainProvider`] over an alloy JSON-RPC provider.
#[derive(Debug, Clone)]
pub struct RpcChainProvider<P> {
    provider: P,
}

impl<P: Provider> RpcChainProvider<P> {
    /// Wraps an alloy provider.
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Returns the wrapped provider.
    pub const fn inner(&self) -> &P {
        &self.provider
    }
}

impl<P: Provider> ChainProvider for RpcChainProvider<P> {
    async fn chain_id(&self) -> TransportResult<u64> {
        let chain_id = self.provider.get_chain_id().await?;
        trace!(chain_id, "Fetched chain id");
        Ok(chain_id)
    }

    async fn gas_price(&self) -> TransportResult<u128> {
        let gas_price = self.provider.get_gas_price().await?;
        trace!(gas_price, "Fetched gas price");
        Ok(gas_price)
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> TransportResult<u64> {
        let request = EstimateGasRequest::from(tx);
        let gas: U64 = self.provider.raw_request("eth_estimateGas".into(), (request,)).await?;
        let gas = gas.saturating_to::<u64>();
        debug!(gas, from = ?tx.from, to = ?tx.to, "Estimated gas");
        Ok(gas)
    }

    async fn pending_nonce(&self, address: Address) -> TransportResult<u64> {
        let nonce = self.provider.get_transaction_count(address).pending().await?;
        trace!(%address, nonce, "Fetched pending nonce");
        Ok(nonce)
    }

    async fn latest_timestamp(&self) -> TransportResult<u64> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await?
            .ok_or_else(|| TransportErrorKind::custom_str("latest block not found"))?;
        Ok(block.header.timestamp)
    }

    async fn call(&self, to: Address, data: Bytes) -> TransportResult<Bytes> {
        let request = alloy_rpc_types_eth::TransactionRequest::default()
            .to(to)
            .input(TransactionInput::new(data));
        self.provider.call(request).await
    }

    async fn send_raw_transaction(&self, encoded: Bytes) -> TransportResult<B256> {
        let pending = self.provider.send_raw_transaction(&encoded).await?;
        let hash = *pending.tx_hash();
        debug!(%hash, "Broadcast transaction");
        Ok(hash)
    }

    async fn transaction_logs(&self, hash: B256) -> TransportResult<Vec<Log>> {
        let receipt: Option<ReceiptLogs> =
            self.provider.raw_request("eth_getTransactionReceipt".into(), (hash,)).await?;
        let receipt = receipt
            .ok_or_else(|| TransportErrorKind::custom_str("transaction receipt not found"))?;
        trace!(%hash, logs = receipt.logs.len(), "Fetched transaction logs");
        Ok(receipt.into_logs())
    }
}

/// The logs of a transaction receipt.
///
/// Receipts of native `0x71` transactions are outside the Ethereum receipt envelope, so only the
/// logs are read.
#[derive(Debug, Clone, Deserialize)]
struct ReceiptLogs {
    logs: Vec<alloy_rpc_types_eth::Log>,
}

impl ReceiptLogs {
    fn into_logs(self) -> Vec<Log> {
        self.logs.into_iter().map(|log| log.inner).collect()
    }
}

/// The `eth_estimateGas` request body, including the fee-payment extension block.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct EstimateGasRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Bytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<alloy_primitives::U256>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    tx_type: Option<U64>,
    eip712_meta: EstimateGasMeta,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct EstimateGasMeta {
    gas_per_pubdata: U64,
    // The node expects byte arrays, not hex strings.
    factory_deps: Vec<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    paymaster_params: Option<EstimateGasPaymaster>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct EstimateGasPaymaster {
    paymaster: Address,
    paymaster_input: Vec<u8>,
}

impl From<&TransactionRequest> for EstimateGasRequest {
    fn from(tx: &TransactionRequest) -> Self {
        Self {
            from: tx.from,
            to: tx.to,
            data: tx.data.clone(),
            value: tx.value,
            tx_type: tx.tx_type.map(U64::from),
            eip712_meta: EstimateGasMeta {
                gas_per_pubdata: U64::from(tx.resolved_gas_per_pubdata()),
                factory_deps: tx.custom_data.factory_deps.iter().map(|dep| dep.to_vec()).collect(),
                paymaster_params: tx.custom_data.paymaster_params.as_ref().map(|params| {
                    EstimateGasPaymaster {
                        paymaster: params.paymaster,
                        paymaster_input: params.paymaster_input.to_vec(),
                    }
                }),
            },
        }
    }
}
