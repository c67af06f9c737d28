//! Deterministic addresses of account proxies.
//!
//! The factory deploys every account as a proxy through the network's `CREATE2`, whose address
//! formula differs from Ethereum's:
//!
//! ```text
//! keccak256(
//!     keccak256("zksyncCreate2") || pad32(factory) || salt || proxyBytecodeHash
//!         || keccak256(constructorInput)
//! )[12..]
//! ```
//!
//! The proxy constructor takes the implementation address and the `initialize(owner, guardian)`
//! call it forwards, so the address commits to the initial signers.

use alloy_primitives::{keccak256, Address, Bytes, Log, B256};
use alloy_sol_types::{SolCall, SolEvent, SolValue};
use tracing::debug;

use crate::{
    constants::{create2::CREATE2_PREFIX_PREIMAGE, CONTRACT_DEPLOYER_ADDRESS},
    contracts::{IAccount, IAccountFactory, IContractDeployer},
    AddressOrigin, ChainProvider, Result, TransactionRequest, WalletError,
};

/// Computes the address a `CREATE2` deployment by `sender` lands at.
///
/// `bytecode_hash` is the versioned hash of the deployed code and `input` the raw constructor
/// input. The salt is taken as is and is 32 bytes for every factory deployment.
pub fn create2_address(
    sender: Address,
    bytecode_hash: B256,
    salt: &[u8],
    input: &[u8],
) -> Address {
    let mut preimage = Vec::with_capacity(4 * 32 + salt.len());
    preimage.extend_from_slice(keccak256(CREATE2_PREFIX_PREIMAGE).as_slice());
    preimage.extend_from_slice(sender.into_word().as_slice());
    preimage.extend_from_slice(salt);
    preimage.extend_from_slice(bytecode_hash.as_slice());
    preimage.extend_from_slice(keccak256(input).as_slice());

    Address::from_word(keccak256(&preimage))
}

/// Computes and cross-checks the addresses the factory deploys accounts at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressPredictor {
    factory: Address,
    implementation: Address,
    proxy_bytecode_hash: B256,
}

impl AddressPredictor {
    /// Creates a predictor for proxies deployed by `factory` pointing to `implementation`.
    pub const fn new(factory: Address, implementation: Address, proxy_bytecode_hash: B256) -> Self {
        Self { factory, implementation, proxy_bytecode_hash }
    }

    /// Returns the factory address.
    pub const fn factory(&self) -> Address {
        self.factory
    }

    /// Returns the ABI-encoded proxy constructor input.
    pub fn constructor_input(&self, owner: Address, guardian: Address) -> Bytes {
        let initialize = IAccount::initializeCall { owner, guardian }.abi_encode();
        (self.implementation, Bytes::from(initialize)).abi_encode_params().into()
    }

    /// Computes the address of the account with the given salt and initial signers.
    pub fn predict(&self, salt: B256, owner: Address, guardian: Address) -> Address {
        create2_address(
            self.factory,
            self.proxy_bytecode_hash,
            salt.as_slice(),
            &self.constructor_input(owner, guardian),
        )
    }

    /// Asks the factory for the address of the account with the given salt and initial signers.
    pub async fn predict_on_chain<P: ChainProvider>(
        &self,
        provider: &P,
        salt: B256,
        owner: Address,
        guardian: Address,
    ) -> Result<Address> {
        let call = IAccountFactory::computeCreate2AddressCall {
            salt,
            implementation: self.implementation,
            owner,
            guardian,
        };
        let output = provider.call(self.factory, call.abi_encode().into()).await?;
        Ok(IAccountFactory::computeCreate2AddressCall::abi_decode_returns(&output)?)
    }

    /// Checks that the local prediction matches the factory's and returns the address.
    ///
    /// Fails with [`WalletError::AddressPredictionMismatch`] otherwise.
    pub async fn verify<P: ChainProvider>(
        &self,
        provider: &P,
        salt: B256,
        owner: Address,
        guardian: Address,
    ) -> Result<Address> {
        let predicted = self.predict(salt, owner, guardian);
        let observed = self.predict_on_chain(provider, salt, owner, guardian).await?;
        debug!(%salt, %predicted, %observed, "Verified address prediction");
        check(predicted, observed, AddressOrigin::Factory)
    }

    /// Returns the request deploying the account with the given salt and initial signers.
    pub fn deploy_request(
        &self,
        salt: B256,
        owner: Address,
        guardian: Address,
    ) -> TransactionRequest {
        let call = IAccountFactory::deployProxyAccountCall {
            salt,
            implementation: self.implementation,
            owner,
            guardian,
        };
        TransactionRequest::default().to(self.factory).data(call.abi_encode())
    }

    /// Returns the address the factory deployed a contract at, according to the contract-creation
    /// records among `logs`.
    pub fn deployed_address_from_logs(&self, logs: &[Log]) -> Option<Address> {
        logs.iter()
            .filter(|log| log.address == CONTRACT_DEPLOYER_ADDRESS)
            .filter_map(|log| IContractDeployer::ContractDeployed::decode_log_data(&log.data).ok())
            .find(|deployed| deployed.deployerAddress == self.factory)
            .map(|deployed| deployed.contractAddress)
    }

    /// Checks that the deployment transaction `tx_hash` created the predicted account and returns
    /// its address.
    ///
    /// Fails with [`WalletError::DeploymentNotFound`] if the transaction recorded no deployment by
    /// the factory, and with [`WalletError::AddressPredictionMismatch`] if the address differs.
    pub async fn verify_deployment<P: ChainProvider>(
        &self,
        provider: &P,
        tx_hash: B256,
        salt: B256,
        owner: Address,
        guardian: Address,
    ) -> Result<Address> {
        let logs = provider.transaction_logs(tx_hash).await?;
        let observed = self
            .deployed_address_from_logs(&logs)
            .ok_or(WalletError::DeploymentNotFound(self.factory))?;
        let predicted = self.predict(salt, owner, guardian);
        debug!(%tx_hash, %predicted, %observed, "Verified deployed address");
        check(predicted, observed, AddressOrigin::Deployment)
    }
}

fn check(predicted: Address, observed: Address, origin: AddressOrigin) -> Result<Address> {
    if predicted == observed {
        Ok(predicted)
    } else {
        Err(WalletError::AddressPredictionMismatch { predicted, observed, origin })
    }
}
