#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use ethereum_consensus::primitives::{ExecutionAddress, Hash32, Slot, U256};
use mev_build_rs::{Bundle, BuiltBlock, ChainBackend, Config, Error};
use mev_rs::{
    signing::{compute_builder_domain, sign_builder_message, SecretKey},
    types::{
        ExecutionPayload, PayloadAttributes, ProposerSchedule, SignedBidSubmission,
        SignedValidatorRegistration, ValidatorRegistration,
    },
};
use parking_lot::Mutex;
use std::{
    net::{SocketAddr, TcpListener},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Once,
    },
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub const RELAY_SECRET_KEY: &str =
    "0x0101010101010101010101010101010101010101010101010101010101010101";
pub const BUILDER_SECRET_KEY: &str =
    "0x0202020202020202020202020202020202020202020202020202020202020202";

pub const PROPOSER_FEE_RECIPIENT: [u8; 20] = [0x42; 20];
pub const PROPOSER_GAS_LIMIT: u64 = 30_000_000;

static LOGGING: Once = Once::new();

pub fn setup_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::new(
                std::env::var("RUST_LOG").unwrap_or_else(|_| "error".into()),
            ))
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}

/// A configuration that only lacks a relay.
pub fn base_config() -> Config {
    Config {
        enabled: true,
        builder_secret_key: BUILDER_SECRET_KEY.to_string(),
        relay_secret_key: RELAY_SECRET_KEY.to_string(),
        listen_addr: "127.0.0.1:0".to_string(),
        disable_bundle_fetcher: true,
        ..Default::default()
    }
}

#[derive(Default)]
pub struct MockChain {
    pub synced: AtomicBool,
    pub builds: Mutex<Vec<PayloadAttributes>>,
    pub bundles: Mutex<Vec<Bundle>>,
}

impl MockChain {
    pub fn synced() -> Arc<Self> {
        let chain = Self::default();
        chain.synced.store(true, Ordering::SeqCst);
        Arc::new(chain)
    }

    pub fn build_count(&self) -> usize {
        self.builds.lock().len()
    }
}

#[async_trait]
impl ChainBackend for MockChain {
    async fn block_number(&self) -> Result<u64, Error> {
        Ok(1)
    }

    async fn is_synced(&self) -> Result<bool, Error> {
        Ok(self.synced.load(Ordering::SeqCst))
    }

    async fn build_block(&self, attributes: &PayloadAttributes) -> Result<BuiltBlock, Error> {
        self.builds.lock().push(attributes.clone());
        let payload = ExecutionPayload {
            parent_hash: attributes.head_hash.clone(),
            fee_recipient: attributes.suggested_fee_recipient.clone(),
            prev_randao: attributes.prev_randao.clone(),
            block_number: 2,
            gas_limit: attributes.gas_limit,
            gas_used: 21_000,
            timestamp: attributes.timestamp,
            block_hash: Hash32::try_from([0xbb; 32].as_slice()).unwrap(),
            ..Default::default()
        };
        Ok(BuiltBlock {
            payload,
            value: U256::from(1_000_000_000u64),
            bundles: vec![],
            touched_addresses: vec![],
        })
    }

    async fn add_bundles(&self, bundles: Vec<Bundle>) -> Result<(), Error> {
        self.bundles.lock().extend(bundles);
        Ok(())
    }
}

pub fn proposer_secret_key() -> SecretKey {
    SecretKey::try_from([8u8; 32].as_slice()).unwrap()
}

pub fn schedule_entry(slot: Slot) -> ProposerSchedule {
    let secret_key = proposer_secret_key();
    let mut message = ValidatorRegistration {
        fee_recipient: ExecutionAddress::try_from(PROPOSER_FEE_RECIPIENT.as_slice()).unwrap(),
        gas_limit: PROPOSER_GAS_LIMIT,
        timestamp: 1_700_000_000,
        public_key: secret_key.public_key(),
    };
    let domain = compute_builder_domain([0, 0, 0, 0]).unwrap();
    let signature = sign_builder_message(&mut message, &secret_key, &domain).unwrap();
    ProposerSchedule {
        slot,
        validator_index: 3,
        entry: SignedValidatorRegistration { message, signature },
    }
}

#[derive(Clone, Default)]
pub struct MockRelay {
    pub schedule_requests: Arc<AtomicUsize>,
    pub submissions: Arc<Mutex<Vec<SignedBidSubmission>>>,
}

impl MockRelay {
    pub fn submission_count(&self) -> usize {
        self.submissions.lock().len()
    }
}

/// Serves the relay API for `schedule` and records every block submission.
pub async fn spawn_mock_relay(schedule: Vec<ProposerSchedule>) -> (SocketAddr, MockRelay) {
    let relay = MockRelay::default();
    let schedule_requests = relay.schedule_requests.clone();
    let submissions = relay.submissions.clone();
    let router = Router::new()
        .route(
            "/relay/v1/builder/validators",
            get(move || {
                let schedule = schedule.clone();
                let schedule_requests = schedule_requests.clone();
                async move {
                    schedule_requests.fetch_add(1, Ordering::SeqCst);
                    Json(schedule)
                }
            }),
        )
        .route(
            "/relay/v1/builder/blocks",
            post(move |Json(submission): Json<SignedBidSubmission>| {
                let submissions = submissions.clone();
                async move {
                    submissions.lock().push(submission);
                    StatusCode::OK
                }
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();
    let server = axum::Server::from_tcp(listener).unwrap().serve(router.into_make_service());
    tokio::spawn(server);
    (addr, relay)
}

pub fn payload_attributes(slot: Slot) -> PayloadAttributes {
    PayloadAttributes {
        timestamp: 1_700_000_012,
        prev_randao: Default::default(),
        suggested_fee_recipient: Default::default(),
        slot,
        head_hash: Hash32::try_from([0xaa; 32].as_slice()).unwrap(),
        gas_limit: 0,
    }
}
