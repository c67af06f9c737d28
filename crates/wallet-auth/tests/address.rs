//! Tests for deterministic account addresses and deployment checks.

use std::collections::HashSet;

use alloy_primitives::{address, b256, keccak256, Address, Bytes, Log, LogData, B256};
use alloy_sol_types::{SolCall, SolEvent, SolValue};
use wallet_auth::{
    constants::CONTRACT_DEPLOYER_ADDRESS,
    contracts::{IAccountFactory, IContractDeployer},
    test_utils::MockChainProvider,
    AccountContext, AddressOrigin, AddressPredictor, NetworkConfig, WalletError,
};

const FACTORY: Address = address!("00000000000000000000000000000000000000f0");
const IMPLEMENTATION: Address = address!("00000000000000000000000000000000000000e0");
const OWNER: Address = address!("000000000000000000000000000000000000000a");
const GUARDIAN: Address = address!("000000000000000000000000000000000000000b");
const SALT: B256 = b256!("0101010101010101010101010101010101010101010101010101010101010101");

fn proxy_bytecode() -> Vec<u8> {
    vec![0x5a; 5 * 32]
}

fn predictor() -> AddressPredictor {
    let config =
        NetworkConfig { implementation: IMPLEMENTATION, factory: FACTORY, ..Default::default() };
    AccountContext::from_config(&config, &proxy_bytecode()).unwrap().address_predictor()
}

/// Makes the mocked factory answer `computeCreate2Address` with `address`.
fn factory_answers(provider: &MockChainProvider, salt: B256, address: Address) {
    let call = IAccountFactory::computeCreate2AddressCall {
        salt,
        implementation: IMPLEMENTATION,
        owner: OWNER,
        guardian: GUARDIAN,
    };
    provider.set_call(FACTORY, call.abi_encode(), address.abi_encode());
}

fn deployment_log(deployer: Address, contract: Address) -> Log {
    Log {
        address: CONTRACT_DEPLOYER_ADDRESS,
        data: LogData::new_unchecked(
            vec![
                IContractDeployer::ContractDeployed::SIGNATURE_HASH,
                deployer.into_word(),
                keccak256(proxy_bytecode()),
                contract.into_word(),
            ],
            Bytes::new(),
        ),
    }
}

#[test]
fn test_prediction_is_deterministic() {
    let mut seen = HashSet::new();
    for _ in 0..5 {
        let salt = B256::from(rand::random::<[u8; 32]>());
        let predicted = predictor().predict(salt, OWNER, GUARDIAN);
        assert_ne!(predicted, Address::ZERO);
        assert_eq!(predictor().predict(salt, OWNER, GUARDIAN), predicted);
        assert!(seen.insert(predicted));
    }
}

#[tokio::test]
async fn test_prediction_matches_factory_answer() {
    // Address the factory reports for these inputs.
    let deployed = address!("8588f8a53973c83b16f6879ff3eb991b839cce27");
    let provider = MockChainProvider::new();
    let predictor = predictor();
    factory_answers(&provider, SALT, deployed);

    assert_eq!(predictor.predict(SALT, OWNER, GUARDIAN), deployed);
    let on_chain = predictor.predict_on_chain(&provider, SALT, OWNER, GUARDIAN).await;
    assert_eq!(on_chain.unwrap(), deployed);
    assert_eq!(predictor.verify(&provider, SALT, OWNER, GUARDIAN).await.unwrap(), deployed);
}

#[tokio::test]
async fn test_factory_disagreement_is_reported() {
    let provider = MockChainProvider::new();
    let predictor = predictor();
    let wrong = address!("00000000000000000000000000000000000000ff");
    factory_answers(&provider, SALT, wrong);

    let err = predictor.verify(&provider, SALT, OWNER, GUARDIAN).await.unwrap_err();
    assert!(matches!(
        err,
        WalletError::AddressPredictionMismatch { observed, origin: AddressOrigin::Factory, .. }
            if observed == wrong
    ));
}

#[tokio::test]
async fn test_deployment_is_verified_from_logs() {
    let predictor = predictor();
    let predicted = predictor.predict(SALT, OWNER, GUARDIAN);
    let good = keccak256("good deployment");
    let wrong = keccak256("wrong deployment");
    let missing = keccak256("no deployment");

    let provider = MockChainProvider::new()
        .with_logs(good, vec![deployment_log(FACTORY, predicted)])
        .with_logs(wrong, vec![deployment_log(FACTORY, IMPLEMENTATION)])
        .with_logs(missing, vec![deployment_log(IMPLEMENTATION, predicted)]);

    let deployed = predictor.verify_deployment(&provider, good, SALT, OWNER, GUARDIAN).await;
    assert_eq!(deployed.unwrap(), predicted);

    let err =
        predictor.verify_deployment(&provider, wrong, SALT, OWNER, GUARDIAN).await.unwrap_err();
    assert!(matches!(
        err,
        WalletError::AddressPredictionMismatch { origin: AddressOrigin::Deployment, .. }
    ));

    let err =
        predictor.verify_deployment(&provider, missing, SALT, OWNER, GUARDIAN).await.unwrap_err();
    assert!(matches!(err, WalletError::DeploymentNotFound(factory) if factory == FACTORY));

    // Unknown transactions are a transport failure, not a mismatch.
    let unknown = keccak256("unknown");
    let err =
        predictor.verify_deployment(&provider, unknown, SALT, OWNER, GUARDIAN).await.unwrap_err();
    assert!(matches!(err, WalletError::Rpc(_)));
}

#[test]
fn test_deploy_request_targets_factory() {
    let request = predictor().deploy_request(SALT, OWNER, GUARDIAN);
    assert_eq!(request.to, Some(FACTORY));

    let call = IAccountFactory::deployProxyAccountCall::abi_decode(&request.data.unwrap()).unwrap();
    assert_eq!(call.salt, SALT);
    assert_eq!(call.implementation, IMPLEMENTATION);
    assert_eq!(call.owner, OWNER);
    assert_eq!(call.guardian, GUARDIAN);
}
