//! Signing and sending transactions from a wallet account.

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::{Eip712Domain, SolStruct};
use tokio::sync::OnceCell;
use tracing::{debug, info, trace};

use crate::{
    constants::tx::EIP712_TX_TYPE,
    ChainProvider, DigestComputer, Result, Signatory, SignatureAggregator, SignedEnvelope,
    TransactionRequest, WalletError,
};

/// Signs transactions for one wallet account with an ordered list of signatories.
///
/// The signatories must be listed in the order the account expects, owner first. Their number is
/// not checked; the account rejects a signature with the wrong number of slots.
///
/// The chain id is fetched on first use and cached for the lifetime of the signer.
#[derive(Debug, Clone)]
pub struct AccountSigner<P> {
    address: Address,
    provider: P,
    signatories: Vec<Signatory>,
    chain_id: OnceCell<u64>,
}

impl<P: ChainProvider> AccountSigner<P> {
    /// Creates a signer for the account at `address`.
    pub fn new(
        address: Address,
        provider: P,
        signatories: impl IntoIterator<Item = Signatory>,
    ) -> Self {
        Self {
            address,
            provider,
            signatories: signatories.into_iter().collect(),
            chain_id: OnceCell::new(),
        }
    }

    /// Returns the account address.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Returns the chain provider.
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// Returns the signatories.
    pub fn signatories(&self) -> &[Signatory] {
        &self.signatories
    }

    /// Returns a signer for the same account signing with other signatories. The cached chain id
    /// is kept.
    pub fn with_signatories(&self, signatories: impl IntoIterator<Item = Signatory>) -> Self
    where
        P: Clone,
    {
        Self {
            address: self.address,
            provider: self.provider.clone(),
            signatories: signatories.into_iter().collect(),
            chain_id: self.chain_id.clone(),
        }
    }

    /// Returns the chain id, fetching it on first use.
    pub async fn chain_id(&self) -> Result<u64> {
        let chain_id = self.chain_id.get_or_try_init(|| self.provider.chain_id()).await?;
        Ok(*chain_id)
    }

    /// Fills the unset fields of a request from chain state.
    ///
    /// Set fields are kept as they are, including explicit zeros. The gas price is fetched only
    /// when neither a gas price nor a fee cap is set, the gas limit is estimated only when unset,
    /// and the nonce is the pending transaction count of the account.
    ///
    /// Fails with [`WalletError::SignerMismatch`] before any chain query if the request carries a
    /// sender other than the account.
    pub async fn populate(&self, mut tx: TransactionRequest) -> Result<TransactionRequest> {
        if let Some(from) = tx.from {
            if from != self.address {
                return Err(WalletError::SignerMismatch { from, signer: self.address });
            }
        }

        tx.from = Some(self.address);
        tx.tx_type = Some(EIP712_TX_TYPE);
        tx.data = Some(tx.data.unwrap_or_default());
        tx.value = Some(tx.value.unwrap_or_default());
        tx.custom_data.gas_per_pubdata = Some(tx.resolved_gas_per_pubdata());

        if tx.chain_id.is_none() {
            tx.chain_id = Some(self.chain_id().await?);
        }
        if tx.gas_price.is_none() && tx.max_fee_per_gas.is_none() {
            tx.gas_price = Some(self.provider.gas_price().await?);
        }
        if tx.nonce.is_none() {
            tx.nonce = Some(self.provider.pending_nonce(self.address).await?);
        }
        if tx.gas_limit.is_none() {
            tx.gas_limit = Some(self.provider.estimate_gas(&tx).await?);
        }

        trace!(
            account = %self.address,
            to = ?tx.to,
            nonce = tx.nonce,
            gas_limit = tx.gas_limit,
            chain_id = tx.chain_id,
            "Populated transaction"
        );
        Ok(tx)
    }

    /// Populates a request and signs it with every signatory.
    pub async fn sign_transaction(&self, tx: TransactionRequest) -> Result<SignedEnvelope> {
        let tx = self.populate(tx).await?;
        let digest = DigestComputer::digest(&tx)?;
        let signature = self.aggregator().sign_hash(digest).await?;
        debug!(
            account = %self.address,
            %digest,
            signatories = self.signatories.len(),
            "Signed transaction"
        );
        Ok(SignedEnvelope::new(tx, signature))
    }

    /// Signs a request and broadcasts it, returning the transaction hash.
    ///
    /// The transaction is sent once; a rejection is returned to the caller, never retried.
    pub async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256> {
        let envelope = self.sign_transaction(tx).await?;
        let hash = self.provider.send_raw_transaction(envelope.encoded()?).await?;
        info!(account = %self.address, %hash, nonce = envelope.tx().nonce, "Sent transaction");
        Ok(hash)
    }

    /// Signs a prehashed message with every signatory.
    pub async fn sign_hash(&self, hash: B256) -> Result<Bytes> {
        self.aggregator().sign_hash(hash).await
    }

    /// Signs a message with the EIP-191 prefix with every signatory.
    pub async fn sign_message(&self, message: &[u8]) -> Result<Bytes> {
        self.aggregator().sign_message(message).await
    }

    /// Signs a typed-data struct with every signatory.
    pub async fn sign_typed_data<T: SolStruct>(
        &self,
        payload: &T,
        domain: &Eip712Domain,
    ) -> Result<Bytes> {
        self.aggregator().sign_typed_data(payload, domain).await
    }

    fn aggregator(&self) -> SignatureAggregator<'_> {
        SignatureAggregator::new(&self.signatories)
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, keccak256};

    use super::*;
    use crate::{
        constants::tx::DEFAULT_GAS_PER_PUBDATA_LIMIT,
        eip712_domain, recover_signers,
        test_utils::{MockChainProvider, TestParties},
    };

    const ACCOUNT: Address = address!("00000000000000000000000000000000000a11ce");
    const DAPP: Address = address!("00000000000000000000000000000000000da999");

    #[tokio::test]
    async fn test_populate_forces_type_and_keeps_fee_cap() {
        let parties = TestParties::default();
        let provider = MockChainProvider::new();
        let signer = AccountSigner::new(ACCOUNT, &provider, parties.owner_only());

        let tx = TransactionRequest { tx_type: Some(0x02), ..Default::default() }
            .to(DAPP)
            .max_fee_per_gas(7);
        let populated = signer.populate(tx).await.unwrap();

        assert_eq!(populated.tx_type, Some(EIP712_TX_TYPE));
        assert_eq!(populated.gas_price, None);
        assert_eq!(populated.max_fee_per_gas, Some(7));
        assert_eq!(provider.gas_price_queries(), 0);

        let estimated = provider.estimate_requests();
        assert_eq!(estimated[0].custom_data.gas_per_pubdata, Some(DEFAULT_GAS_PER_PUBDATA_LIMIT));
        assert_eq!(estimated[0].tx_type, Some(EIP712_TX_TYPE));
    }

    #[tokio::test]
    async fn test_signs_hashes_and_typed_data() {
        let parties = TestParties::default();
        let provider = MockChainProvider::new();
        let signer = AccountSigner::new(ACCOUNT, &provider, parties.owner_and_guardian());
        let expected = vec![Some(parties.owner.address()), Some(parties.guardian.address())];

        let hash = keccak256("session key");
        let signature = signer.sign_hash(hash).await.unwrap();
        assert_eq!(recover_signers(&hash, &signature), expected);

        let tx = TransactionRequest { tx_type: Some(EIP712_TX_TYPE), ..Default::default() }
            .from(ACCOUNT)
            .to(DAPP)
            .nonce(0)
            .gas_limit(21_000);
        let payload = DigestComputer::sign_input(&tx).unwrap();
        let domain = eip712_domain(270);
        let signature = signer.sign_typed_data(&payload, &domain).await.unwrap();
        assert_eq!(recover_signers(&payload.eip712_signing_hash(&domain), &signature), expected);
        assert_eq!(provider.total_queries(), 0);
    }
}
