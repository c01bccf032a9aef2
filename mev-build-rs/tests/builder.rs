mod common;

use common::{
    base_config, payload_attributes, proposer_secret_key, schedule_entry, setup_logging,
    spawn_mock_relay, MockChain, MockRelay, PROPOSER_FEE_RECIPIENT, PROPOSER_GAS_LIMIT,
};
use ethereum_consensus::primitives::{ExecutionAddress, Slot};
use mev_build_rs::{register, BuilderService, Config, Error, Node};
use mev_rs::signing::{compute_builder_domain, SigningKeyPair};
use std::{sync::atomic::Ordering, sync::Arc, time::Duration};

const SLOT: Slot = 100;

async fn setup(dry_run: bool) -> (Node, BuilderService, Arc<MockChain>, MockRelay) {
    setup_logging();
    let (addr, relay) = spawn_mock_relay(vec![schedule_entry(SLOT)]).await;
    let chain = MockChain::synced();
    let node = Node::default();
    let config =
        Config { remote_relay_endpoint: format!("http://{addr}"), dry_run, ..base_config() };
    let service = register(&node, &config, chain.clone()).await.unwrap();
    node.start().unwrap();
    (node, service, chain, relay)
}

async fn eventually(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_builds_and_submits_block() {
    let (node, service, chain, relay) = setup(false).await;

    service.payload_attributes(payload_attributes(SLOT)).await.unwrap();
    eventually(|| relay.submission_count() == 1).await;

    // the proposer's registration overrides the notified fee recipient and gas limit
    let built = chain.builds.lock()[0].clone();
    let fee_recipient = ExecutionAddress::try_from(PROPOSER_FEE_RECIPIENT.as_slice()).unwrap();
    assert_eq!(built.suggested_fee_recipient, fee_recipient);
    assert_eq!(built.gas_limit, PROPOSER_GAS_LIMIT);

    let mut submission = relay.submissions.lock()[0].clone();
    assert_eq!(submission.message.slot, SLOT);
    assert_eq!(submission.message.proposer_public_key, proposer_secret_key().public_key());
    assert_eq!(submission.message.proposer_fee_recipient, fee_recipient);
    let builder = SigningKeyPair::from_hex(common::BUILDER_SECRET_KEY).unwrap();
    assert_eq!(&submission.message.builder_public_key, builder.public_key());
    submission.verify_signature(&compute_builder_domain([0, 0, 0, 0]).unwrap()).unwrap();
    submission.validate_consistency().unwrap();

    node.stop().unwrap();
}

#[tokio::test]
async fn test_duplicate_attributes_are_ignored() {
    let (node, service, chain, relay) = setup(false).await;

    service.payload_attributes(payload_attributes(SLOT)).await.unwrap();
    eventually(|| relay.submission_count() == 1).await;
    service.payload_attributes(payload_attributes(SLOT)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(chain.build_count(), 1);
    assert_eq!(relay.submission_count(), 1);
    // the schedule was fetched once and served from cache afterwards
    assert_eq!(relay.schedule_requests.load(Ordering::SeqCst), 1);

    node.stop().unwrap();
}

#[tokio::test]
async fn test_backend_not_synced() {
    let (node, service, chain, _) = setup(false).await;
    chain.synced.store(false, Ordering::SeqCst);

    let err = service.payload_attributes(payload_attributes(SLOT)).await.unwrap_err();
    assert!(matches!(err, Error::NotSynced));
    assert_eq!(err.to_string(), "backend not synced");
    assert_eq!(chain.build_count(), 0);

    node.stop().unwrap();
}

#[tokio::test]
async fn test_unknown_proposer() {
    let (node, service, chain, _) = setup(false).await;

    let err = service.payload_attributes(payload_attributes(SLOT + 1)).await.unwrap_err();
    assert_eq!(err.to_string(), format!("validator not found for slot {}", SLOT + 1));
    assert_eq!(chain.build_count(), 0);

    node.stop().unwrap();
}

#[tokio::test]
async fn test_dry_run_does_not_submit() {
    let (node, service, chain, relay) = setup(true).await;

    service.payload_attributes(payload_attributes(SLOT)).await.unwrap();
    eventually(|| chain.build_count() == 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(relay.submission_count(), 0);

    node.stop().unwrap();
}

#[tokio::test]
async fn test_rpc_surfaces_builder_errors() {
    let (node, _service, chain, relay) = setup(false).await;
    let module = node.rpc_module(true).unwrap();

    module
        .call::<_, ()>("builder_payloadAttributes", [payload_attributes(SLOT)])
        .await
        .unwrap();
    eventually(|| relay.submission_count() == 1).await;

    chain.synced.store(false, Ordering::SeqCst);
    let err = module
        .call::<_, ()>("builder_payloadAttributes", [payload_attributes(SLOT + 1)])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("validator not found for slot"));

    node.stop().unwrap();
}
