// tests/transaction_signer.rs
//! Signed `execute` path against the in-memory chain.

mod common;

use async_trait::async_trait;
use common::{address, felt, tag, MockChain, ACCOUNT};
use did_scorpius::contracts::key_registry::RegistryReader;
use did_scorpius::error::DidError;
use did_scorpius::models::did::KeyType;
use did_scorpius::models::transaction::{DeployTransaction, RawTransaction, Transaction};
use did_scorpius::utils::crypto::selector_from_name;
use did_scorpius::wallet::signer::{LocalStarkSigner, MessageSigner, Signature};
use did_scorpius::wallet::transaction_signer::TransactionSigner;
use num_bigint::BigUint;
use starknet_crypto::FieldElement;
use std::sync::Arc;
use tokio_test::assert_ok;

struct RefusingSigner;

#[async_trait]
impl MessageSigner for RefusingSigner {
    async fn sign_hash(&self, _message_hash: &FieldElement) -> Result<Signature, DidError> {
        Err(DidError::Signing("user declined".to_string()))
    }
}

/// Chain with one account controlled by `signer`.
fn setup(signer: &LocalStarkSigner) -> (Arc<MockChain>, TransactionSigner, RegistryReader) {
    let chain = Arc::new(MockChain::new());
    chain.add_account(address(ACCOUNT), signer.public_key());
    let tx_signer = TransactionSigner::new(chain.clone(), address(ACCOUNT), Arc::new(signer.clone()));
    let registry = RegistryReader::new(chain.clone(), chain.registry());
    (chain, tx_signer, registry)
}

#[tokio::test]
async fn add_key_round_trip_through_signed_path() {
    let signer = LocalStarkSigner::new(FieldElement::from(0xdeadbeefu64));
    let (chain, tx_signer, registry) = setup(&signer);

    let call = registry
        .add_key_call(KeyType::Ed25519VerificationKey2018, &BigUint::from(123u64))
        .unwrap();
    let receipt = assert_ok!(tx_signer.submit(Transaction::Invoke(call)).await);

    assert_eq!(receipt.code, "TRANSACTION_RECEIVED");
    assert_eq!(
        receipt.transaction_hash,
        felt("0x476393318d5307b17cad74223c6a56bd2ab2085f8afb8aba73dda503ff3d83c")
    );
    assert_eq!(
        chain.slots(address(ACCOUNT)),
        vec![[tag("Ed25519"), FieldElement::from(123u64), FieldElement::ZERO]]
    );
    assert_eq!(chain.nonce(address(ACCOUNT)), FieldElement::ONE);

    let keys = registry.list_keys(address(ACCOUNT)).await.unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].key_type_tag, "Ed25519");
    assert_eq!(keys[0].public_key, BigUint::from(123u64));
}

#[tokio::test]
async fn nonce_is_read_fresh_for_every_submission() {
    let signer = LocalStarkSigner::new(FieldElement::from(0xdeadbeefu64));
    let (chain, tx_signer, registry) = setup(&signer);
    let call = registry
        .add_key_call(KeyType::Ed25519VerificationKey2018, &BigUint::from(123u64))
        .unwrap();

    let first = assert_ok!(tx_signer.submit(Transaction::Invoke(call.clone())).await);
    let second = assert_ok!(tx_signer.submit(Transaction::Invoke(call)).await);

    // Same call, consecutive nonces: the hashes differ only through the nonce
    assert_eq!(
        second.transaction_hash,
        felt("0x2f3209b8faa5ba3f3dab7bdc7832ec7fb41fb7707d6b503ab548cbdd3f54123")
    );
    assert_ne!(first.transaction_hash, second.transaction_hash);

    let nonces: Vec<FieldElement> = chain
        .submissions()
        .iter()
        .map(|tx| match tx {
            RawTransaction::Invoke(invoke) => *invoke.calldata.last().unwrap(),
            RawTransaction::Deploy(_) => panic!("unexpected deployment"),
        })
        .collect();
    assert_eq!(nonces, vec![FieldElement::ZERO, FieldElement::ONE]);

    let nonce_reads = chain
        .reads()
        .iter()
        .filter(|call| call.entry_point_selector == selector_from_name("get_nonce"))
        .count();
    assert_eq!(nonce_reads, 2);
}

#[tokio::test]
async fn envelope_wraps_call_in_execute() {
    let signer = LocalStarkSigner::new(FieldElement::from(0xdeadbeefu64));
    let (chain, tx_signer, registry) = setup(&signer);
    let call = registry
        .add_key_call(KeyType::X25519KeyAgreementKey2019, &BigUint::from(7u64))
        .unwrap();
    assert_ok!(tx_signer.submit(Transaction::Invoke(call)).await);

    let submissions = chain.submissions();
    let invoke = match &submissions[..] {
        [RawTransaction::Invoke(invoke)] => invoke,
        other => panic!("expected one invoke, got {:?}", other),
    };
    assert_eq!(invoke.contract_address, address(ACCOUNT));
    assert_eq!(invoke.entry_point_selector, selector_from_name("execute"));
    assert_eq!(
        invoke.calldata,
        vec![
            chain.registry().felt(),
            selector_from_name("add_key"),
            FieldElement::from(3u64),
            tag("X25519"),
            FieldElement::from(7u64),
            FieldElement::ZERO,
            FieldElement::ZERO,
        ]
    );
    assert_eq!(invoke.signature.len(), 2);
}

#[tokio::test]
async fn signature_from_wrong_key_is_rejected_by_the_account() {
    let owner = LocalStarkSigner::new(FieldElement::from(0xdeadbeefu64));
    let (chain, _, registry) = setup(&owner);
    let intruder = TransactionSigner::new(
        chain.clone(),
        address(ACCOUNT),
        Arc::new(LocalStarkSigner::new(FieldElement::from(0xbadu64))),
    );

    let call = registry
        .add_key_call(KeyType::Ed25519VerificationKey2018, &BigUint::from(1u64))
        .unwrap();
    let result = intruder.submit(Transaction::Invoke(call)).await;

    assert!(matches!(result, Err(DidError::SubmissionRejected { .. })));
    assert!(chain.slots(address(ACCOUNT)).is_empty());
    assert_eq!(chain.nonce(address(ACCOUNT)), FieldElement::ZERO);
}

#[tokio::test]
async fn signing_failure_submits_nothing() {
    let chain = Arc::new(MockChain::new());
    chain.add_account(address(ACCOUNT), FieldElement::ONE);
    let tx_signer = TransactionSigner::new(chain.clone(), address(ACCOUNT), Arc::new(RefusingSigner));
    let registry = RegistryReader::new(chain.clone(), chain.registry());

    let call = registry
        .add_key_call(KeyType::Ed25519VerificationKey2018, &BigUint::from(1u64))
        .unwrap();
    let result = tx_signer.submit(Transaction::Invoke(call)).await;

    assert!(matches!(result, Err(DidError::Signing(message)) if message == "user declined"));
    assert!(chain.submissions().is_empty());
}

#[tokio::test]
async fn nonce_read_failure_is_not_retried() {
    let signer = LocalStarkSigner::new(FieldElement::from(0xdeadbeefu64));
    let (chain, tx_signer, registry) = setup(&signer);
    chain.fail_reads_of("get_nonce");

    let call = registry
        .add_key_call(KeyType::Ed25519VerificationKey2018, &BigUint::from(1u64))
        .unwrap();
    let result = tx_signer.submit(Transaction::Invoke(call)).await;

    assert!(matches!(result, Err(DidError::Transport { .. })));
    assert_eq!(chain.reads().len(), 1);
    assert!(chain.submissions().is_empty());
}

#[tokio::test]
async fn deployments_bypass_nonce_and_signature() {
    let chain = Arc::new(MockChain::new());
    let tx_signer = TransactionSigner::new(
        chain.clone(),
        address(ACCOUNT),
        Arc::new(RefusingSigner),
    );
    let deploy = DeployTransaction {
        contract_definition: serde_json::json!({"program": "", "abi": []}),
        constructor_calldata: vec![FieldElement::from(42u64), FieldElement::ZERO],
        contract_address_salt: FieldElement::from(42u64),
    };

    let receipt = assert_ok!(tx_signer.submit(Transaction::Deploy(deploy.clone())).await);

    assert!(receipt.address.is_some());
    assert!(chain.reads().is_empty());
    assert_eq!(chain.submissions(), vec![RawTransaction::Deploy(deploy)]);
}
