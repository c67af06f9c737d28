//! Tests for populating, signing and sending wallet transactions.

use alloy_primitives::{address, bytes, keccak256, Address, U256};
use wallet_auth::{
    constants::{signature::SIGNATURE_LENGTH, tx::EIP712_TX_TYPE},
    recover_signers, split_signatures,
    test_utils::{
        MockChainProvider, TestParties, MOCK_CHAIN_ID, MOCK_GAS_ESTIMATE, MOCK_GAS_PRICE,
    },
    AccountSigner, DigestComputer, Signatory, SignedEnvelope, TransactionRequest, WalletError,
};

const ACCOUNT: Address = address!("00000000000000000000000000000000000a11ce");
const DAPP: Address = address!("00000000000000000000000000000000000da999");

fn dapp_call() -> TransactionRequest {
    TransactionRequest::default().to(DAPP).data(bytes!("a9059cbb"))
}

#[tokio::test]
async fn test_populate_fills_unset_fields() {
    let parties = TestParties::default();
    let provider = MockChainProvider::new().with_nonce(ACCOUNT, 7);
    let signer = AccountSigner::new(ACCOUNT, &provider, parties.owner_and_guardian());

    let tx = signer.populate(dapp_call()).await.unwrap();
    assert_eq!(tx.from, Some(ACCOUNT));
    assert_eq!(tx.tx_type, Some(EIP712_TX_TYPE));
    assert_eq!(tx.value, Some(U256::ZERO));
    assert_eq!(tx.chain_id, Some(MOCK_CHAIN_ID));
    assert_eq!(tx.gas_price, Some(MOCK_GAS_PRICE));
    assert_eq!(tx.max_fee_per_gas, None);
    assert_eq!(tx.nonce, Some(7));
    assert_eq!(tx.gas_limit, Some(MOCK_GAS_ESTIMATE));
    assert_eq!(tx.custom_data.gas_per_pubdata, Some(50_000));

    // The estimate sees the request with everything but the gas limit filled in.
    let estimated = provider.estimate_requests();
    assert_eq!(estimated.len(), 1);
    assert_eq!(estimated[0].nonce, Some(7));
    assert_eq!(estimated[0].gas_limit, None);
}

#[tokio::test]
async fn test_populate_keeps_explicit_fields() {
    let parties = TestParties::default();
    let provider = MockChainProvider::new();
    let signer = AccountSigner::new(ACCOUNT, &provider, parties.owner_only());

    let tx = dapp_call()
        .chain_id(324)
        .nonce(3)
        .gas_limit(0)
        .max_fee_per_gas(0)
        .gas_per_pubdata(0)
        .value(U256::from(5));
    let populated = signer.populate(tx).await.unwrap();

    assert_eq!(populated.chain_id, Some(324));
    assert_eq!(populated.nonce, Some(3));
    assert_eq!(populated.gas_limit, Some(0));
    assert_eq!(populated.max_fee_per_gas, Some(0));
    assert_eq!(populated.gas_price, None);
    assert_eq!(populated.custom_data.gas_per_pubdata, Some(0));
    assert_eq!(populated.value, Some(U256::from(5)));
    assert_eq!(provider.total_queries(), 0);
}

#[tokio::test]
async fn test_foreign_sender_is_rejected_before_any_query() {
    let parties = TestParties::default();
    let provider = MockChainProvider::new();
    let signer = AccountSigner::new(ACCOUNT, &provider, parties.owner_and_guardian());
    let other = address!("00000000000000000000000000000000000b0b00");

    let err = signer.send_transaction(dapp_call().from(other)).await.unwrap_err();
    assert!(matches!(
        err,
        WalletError::SignerMismatch { from, signer } if from == other && signer == ACCOUNT
    ));
    assert_eq!(provider.total_queries(), 0);
    assert!(provider.sent_transactions().is_empty());
}

#[tokio::test]
async fn test_chain_id_is_fetched_once() {
    let parties = TestParties::default();
    let provider = MockChainProvider::new();
    let signer = AccountSigner::new(ACCOUNT, &provider, parties.owner_and_guardian());

    signer.populate(dapp_call()).await.unwrap();
    signer.populate(dapp_call()).await.unwrap();
    assert_eq!(signer.chain_id().await.unwrap(), MOCK_CHAIN_ID);

    // Switching signatories keeps the cached chain id.
    let guardian_signer = signer.with_signatories(parties.guardian_only());
    guardian_signer.populate(dapp_call()).await.unwrap();
    assert_eq!(provider.chain_id_queries(), 1);
    assert_eq!(provider.gas_price_queries(), 3);
}

#[tokio::test]
async fn test_sent_envelope_carries_every_signature() {
    let parties = TestParties::default();
    let provider = MockChainProvider::new().with_nonce(ACCOUNT, 1);
    let signer = AccountSigner::new(ACCOUNT, &provider, parties.owner_and_guardian());

    let expected_digest =
        DigestComputer::digest(&signer.populate(dapp_call()).await.unwrap()).unwrap();
    let hash = signer.send_transaction(dapp_call()).await.unwrap();

    let sent = provider.sent_transactions();
    assert_eq!(sent.len(), 1);
    assert_eq!(hash, keccak256(&sent[0]));
    assert_eq!(sent[0][0], EIP712_TX_TYPE);

    let envelope = SignedEnvelope::decode(&sent[0]).unwrap();
    assert_eq!(envelope.tx().from, Some(ACCOUNT));
    assert_eq!(envelope.tx().to, Some(DAPP));
    assert_eq!(envelope.signature().len(), 2 * SIGNATURE_LENGTH);

    let digest = envelope.digest().unwrap();
    assert_eq!(digest, expected_digest);
    assert_eq!(
        recover_signers(&digest, envelope.signature()),
        vec![Some(parties.owner.address()), Some(parties.guardian.address())]
    );
}

#[tokio::test]
async fn test_signatory_kinds_fill_their_slots() {
    let parties = TestParties::default();
    let provider = MockChainProvider::new();
    let signatories = vec![
        Signatory::from(parties.owner.clone()),
        Signatory::ZeroPlaceholder,
        Signatory::EphemeralRandom,
    ];
    let signer = AccountSigner::new(ACCOUNT, &provider, signatories);

    let envelope = signer.sign_transaction(dapp_call()).await.unwrap();
    let digest = envelope.digest().unwrap();
    let slots = split_signatures(envelope.signature());
    assert_eq!(slots.len(), 3);
    assert!(slots[1].iter().all(|byte| *byte == 0));

    let recovered = recover_signers(&digest, envelope.signature());
    assert_eq!(recovered[0], Some(parties.owner.address()));
    assert_eq!(recovered[1], None);
    let ephemeral = recovered[2].unwrap();
    assert_ne!(ephemeral, parties.owner.address());
    assert_ne!(ephemeral, parties.guardian.address());
}

#[tokio::test]
async fn test_zero_signatures_do_not_fail_locally() {
    let provider = MockChainProvider::new();
    let signer = AccountSigner::new(ACCOUNT, &provider, [Signatory::ZeroPlaceholder]);

    let envelope = signer.sign_transaction(dapp_call()).await.unwrap();
    assert_eq!(envelope.signature(), &[0u8; SIGNATURE_LENGTH][..]);
    assert!(envelope.encoded().is_ok());
}

#[tokio::test]
async fn test_no_signatories_cannot_be_encoded() {
    let provider = MockChainProvider::new();
    let signer = AccountSigner::new(ACCOUNT, &provider, Vec::<Signatory>::new());

    let err = signer.send_transaction(dapp_call()).await.unwrap_err();
    assert!(matches!(err, WalletError::EmptySignature));
    assert!(provider.sent_transactions().is_empty());
}

#[tokio::test]
async fn test_rejection_surfaces_reason() {
    let parties = TestParties::default();
    let provider = MockChainProvider::new().with_revert("execution reverted: invalid signature");
    let signer = AccountSigner::new(ACCOUNT, &provider, parties.owner_only());

    // Estimation fails first.
    let err = signer.send_transaction(dapp_call()).await.unwrap_err();
    assert!(matches!(err, WalletError::Reverted(reason) if reason.contains("invalid signature")));

    // With an explicit gas limit the rejection comes from submission.
    let err = signer.send_transaction(dapp_call().gas_limit(100_000)).await.unwrap_err();
    assert!(matches!(err, WalletError::Reverted(_)));
    assert!(provider.sent_transactions().is_empty());
}

#[tokio::test]
async fn test_sign_message_recovers_to_signatories() {
    let parties = TestParties::default();
    let provider = MockChainProvider::new();
    let signer = AccountSigner::new(ACCOUNT, &provider, parties.owner_and_guardian());

    let signature = signer.sign_message(b"hello wallet").await.unwrap();
    let hash = alloy_primitives::eip191_hash_message(b"hello wallet");
    assert_eq!(
        recover_signers(&hash, &signature),
        vec![Some(parties.owner.address()), Some(parties.guardian.address())]
    );
    assert_eq!(provider.total_queries(), 0);
}
