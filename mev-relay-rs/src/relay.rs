use crate::{proposer_scheduler::ProposerScheduler, validator_registry::ValidatorRegistry};
use async_trait::async_trait;
use beacon_api_client::{mainnet::Client as ApiClient, PublicKeyOrIndex, StateId, ValidatorStatus};
use ethereum_consensus::primitives::{BlsPublicKey, Slot, U256};
use mev_rs::{
    blinded_block_provider::ProviderSummary,
    signing::{verify_signed_consensus_message, SigningDomain, SigningKeyPair},
    types::{
        execution_payload_header, BidRequest, BuilderBid, ExecutionPayload, ForkData,
        SignedBidSubmission, SignedBlindedBeaconBlock, SignedBuilderBid,
        SignedValidatorRegistration, ValidatorPreferences,
    },
    BlindedBlockProvider, Error,
};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    ops::Deref,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tracing::{debug, info, warn};

// bids for slots older than this many slots behind the latest submission are dropped
const AUCTION_RETENTION_SLOTS: Slot = 1;

fn is_pending_or_active(status: ValidatorStatus) -> bool {
    matches!(
        status,
        ValidatorStatus::PendingInitialized |
            ValidatorStatus::PendingQueued |
            ValidatorStatus::Pending |
            ValidatorStatus::ActiveOngoing
    )
}

fn current_unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

/// An in-process relay serving the builder API to proposers.
#[derive(Clone)]
pub struct LocalRelay(Arc<Inner>);

impl Deref for LocalRelay {
    type Target = Inner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub struct Inner {
    key_pair: SigningKeyPair,
    beacon_node: ApiClient,
    builder_domain: SigningDomain,
    proposer_domain: SigningDomain,
    fork_data: ForkData,
    enable_validator_checks: bool,
    validator_registry: ValidatorRegistry,
    proposer_scheduler: ProposerScheduler,
    state: Mutex<State>,
}

#[derive(Debug)]
struct AuctionContext {
    signed_builder_bid: SignedBuilderBid,
    execution_payload: ExecutionPayload,
    value: U256,
}

#[derive(Debug, Default)]
struct State {
    auctions: HashMap<BidRequest, Arc<AuctionContext>>,
}

impl LocalRelay {
    pub fn new(
        key_pair: SigningKeyPair,
        beacon_node: ApiClient,
        builder_domain: SigningDomain,
        proposer_domain: SigningDomain,
        fork_data: ForkData,
        enable_validator_checks: bool,
    ) -> Self {
        let proposer_scheduler = ProposerScheduler::new(beacon_node.clone());
        let inner = Inner {
            key_pair,
            beacon_node,
            builder_domain,
            proposer_domain,
            fork_data,
            enable_validator_checks,
            validator_registry: Default::default(),
            proposer_scheduler,
            state: Default::default(),
        };
        info!(
            public_key = %inner.key_pair.public_key(),
            enable_validator_checks,
            "local relay configured"
        );
        Self(Arc::new(inner))
    }

    pub fn public_key(&self) -> &BlsPublicKey {
        self.key_pair.public_key()
    }

    pub fn builder_domain(&self) -> &SigningDomain {
        &self.builder_domain
    }

    /// Preferences of the validator proposing at `slot`, as it registered them.
    pub async fn get_validator_for_slot(&self, slot: Slot) -> Result<ValidatorPreferences, Error> {
        let (_index, public_key) = self.proposer_scheduler.get_proposer_for(slot).await?;
        let registration = self
            .validator_registry
            .get_signed_registration(&public_key)
            .ok_or(Error::ValidatorNotRegistered(public_key))?;
        Ok(ValidatorPreferences::from(&registration.message))
    }

    /// Accepts a builder submission and keeps it if it is the best bid for its auction.
    pub async fn submit_block(&self, submission: &mut SignedBidSubmission) -> Result<(), Error> {
        submission.verify_signature(&self.builder_domain)?;
        submission.validate_consistency()?;

        let bid_trace = &submission.message;
        let bid_request = BidRequest {
            slot: bid_trace.slot,
            parent_hash: bid_trace.parent_hash.clone(),
            public_key: bid_trace.proposer_public_key.clone(),
        };
        let value = bid_trace.value.clone();
        self.prune_auctions(bid_request.slot);
        self.insert_bid_if_greater(bid_request, submission.execution_payload.clone(), value)
    }

    fn prune_auctions(&self, slot: Slot) {
        let oldest_slot = slot.saturating_sub(AUCTION_RETENTION_SLOTS);
        let mut state = self.state.lock();
        state.auctions.retain(|bid_request, _| bid_request.slot >= oldest_slot);
    }

    fn get_auction_context(&self, bid_request: &BidRequest) -> Option<Arc<AuctionContext>> {
        let state = self.state.lock();
        state.auctions.get(bid_request).cloned()
    }

    fn is_better_bid(&self, bid_request: &BidRequest, value: &U256) -> bool {
        match self.get_auction_context(bid_request) {
            Some(best) if &best.value >= value => {
                debug!(%bid_request, %value, best = %best.value, "ignoring lower bid");
                false
            }
            _ => true,
        }
    }

    fn insert_bid_if_greater(
        &self,
        bid_request: BidRequest,
        execution_payload: ExecutionPayload,
        value: U256,
    ) -> Result<(), Error> {
        if !self.is_better_bid(&bid_request, &value) {
            return Ok(())
        }
        let header = execution_payload_header(&execution_payload)?;
        let bid =
            BuilderBid { header, value: value.clone(), public_key: self.public_key().clone() };
        let signed_builder_bid = bid.sign(&self.key_pair, &self.builder_domain)?;

        // another submission may have won while this one was being signed
        let mut state = self.state.lock();
        if let Some(best) = state.auctions.get(&bid_request) {
            if best.value >= value {
                debug!(%bid_request, %value, best = %best.value, "ignoring lower bid");
                return Ok(())
            }
        }
        info!(%bid_request, %signed_builder_bid, "storing best bid");
        let auction_context =
            Arc::new(AuctionContext { signed_builder_bid, execution_payload, value });
        state.auctions.insert(bid_request, auction_context);
        Ok(())
    }

    async fn validate_validator_statuses(
        &self,
        registrations: &[SignedValidatorRegistration],
    ) -> Result<(), Error> {
        let ids = registrations
            .iter()
            .map(|registration| {
                PublicKeyOrIndex::PublicKey(registration.message.public_key.clone())
            })
            .collect::<Vec<_>>();
        let summaries = self.beacon_node.get_validators(StateId::Head, &ids, &[]).await?;
        let statuses = summaries
            .into_iter()
            .map(|summary| (summary.validator.public_key, summary.status))
            .collect::<HashMap<_, _>>();
        for registration in registrations {
            let public_key = &registration.message.public_key;
            match statuses.get(public_key) {
                Some(status) if is_pending_or_active(*status) => {}
                Some(_) => return Err(Error::ValidatorNotActive(public_key.clone())),
                None => return Err(Error::ValidatorNotRegistered(public_key.clone())),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BlindedBlockProvider for LocalRelay {
    async fn register_validators(
        &self,
        registrations: &mut [SignedValidatorRegistration],
    ) -> Result<(), Error> {
        if self.enable_validator_checks {
            self.validate_validator_statuses(registrations).await?;
        }
        let current_timestamp = current_unix_timestamp();
        for registration in registrations.iter_mut() {
            self.validator_registry.process_registration(
                registration,
                current_timestamp,
                &self.builder_domain,
            )?;
        }
        Ok(())
    }

    async fn fetch_best_bid(&self, bid_request: &BidRequest) -> Result<SignedBuilderBid, Error> {
        let auction_context = self
            .get_auction_context(bid_request)
            .ok_or_else(|| Error::NoBidPrepared(Box::new(bid_request.clone())))?;
        Ok(auction_context.signed_builder_bid.clone())
    }

    async fn open_bid(
        &self,
        signed_block: &mut SignedBlindedBeaconBlock,
    ) -> Result<ExecutionPayload, Error> {
        let slot = signed_block.message.slot;
        let (proposer_index, public_key) = self.proposer_scheduler.get_proposer_for(slot).await?;
        if proposer_index != signed_block.message.proposer_index {
            return Err(Error::MissingProposer(slot))
        }

        let header = &signed_block.message.body.execution_payload_header;
        let bid_request = BidRequest {
            slot,
            parent_hash: header.parent_hash.clone(),
            public_key: public_key.clone(),
        };
        let auction_context = self
            .get_auction_context(&bid_request)
            .ok_or_else(|| Error::MissingPayload(header.block_hash.clone()))?;
        if &auction_context.signed_builder_bid.message.header != header {
            warn!(%bid_request, "signed blinded block does not match the stored bid");
            return Err(Error::InvalidExecutionPayloadInBlock)
        }

        let signature = signed_block.signature.clone();
        verify_signed_consensus_message(
            &mut signed_block.message,
            &signature,
            &public_key,
            &self.proposer_domain,
        )?;

        info!(%bid_request, "opened bid");
        Ok(auction_context.execution_payload.clone())
    }

    fn summary(&self) -> ProviderSummary {
        ProviderSummary {
            public_key: self.public_key().clone(),
            fork_data: self.fork_data.clone(),
            registered_validators: self.validator_registry.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_consensus::{
        builder::ValidatorRegistration,
        crypto::SecretKey,
        primitives::{ExecutionAddress, Hash32},
    };
    use mev_rs::{
        signing::{compute_builder_domain, compute_proposer_domain, sign_builder_message},
        types::{BidTrace, BlindedBeaconBlock},
    };
    use crate::RemoteRelay;
    use url::Url;

    const SLOT: Slot = 65;
    const PROPOSER_INDEX: usize = 11;

    fn key(seed: u8) -> SecretKey {
        SecretKey::try_from([seed; 32].as_slice()).unwrap()
    }

    fn relay() -> LocalRelay {
        let beacon_node = ApiClient::new(Url::parse("http://127.0.0.1:1").unwrap());
        let key_pair = SigningKeyPair::new(key(1));
        LocalRelay::new(
            key_pair,
            beacon_node,
            compute_builder_domain([0, 0, 0, 0]).unwrap(),
            compute_proposer_domain([2, 0, 0, 0], &Default::default()).unwrap(),
            ForkData::default(),
            false,
        )
    }

    fn registration(
        secret_key: &SecretKey,
        timestamp: u64,
        gas_limit: u64,
    ) -> SignedValidatorRegistration {
        let mut message = ValidatorRegistration {
            fee_recipient: ExecutionAddress::try_from([0xfe; 20].as_slice()).unwrap(),
            gas_limit,
            timestamp,
            public_key: secret_key.public_key(),
        };
        let domain = compute_builder_domain([0, 0, 0, 0]).unwrap();
        let signature = sign_builder_message(&mut message, secret_key, &domain).unwrap();
        SignedValidatorRegistration { message, signature }
    }

    fn submission(relay: &LocalRelay, value: u64) -> SignedBidSubmission {
        submission_at(relay, SLOT, value)
    }

    fn submission_at(relay: &LocalRelay, slot: Slot, value: u64) -> SignedBidSubmission {
        let builder = SigningKeyPair::new(key(3));
        let parent_hash = Hash32::try_from([0xaa; 32].as_slice()).unwrap();
        let execution_payload = ExecutionPayload {
            parent_hash: parent_hash.clone(),
            gas_limit: 30_000_000,
            block_number: value,
            ..Default::default()
        };
        let trace = BidTrace {
            slot,
            parent_hash,
            block_hash: execution_payload.block_hash.clone(),
            builder_public_key: builder.public_key().clone(),
            proposer_public_key: key(2).public_key(),
            gas_limit: 30_000_000,
            value: U256::from(value),
            ..Default::default()
        };
        trace.sign(execution_payload, &builder, relay.builder_domain()).unwrap()
    }

    fn seed_proposer(relay: &LocalRelay) {
        relay.proposer_scheduler.insert_duties(
            SLOT / crate::proposer_scheduler::SLOTS_PER_EPOCH,
            [(SLOT, PROPOSER_INDEX, key(2).public_key())],
        );
    }

    #[tokio::test]
    async fn test_register_validators() {
        let relay = relay();
        let now = current_unix_timestamp();
        let mut registrations = vec![registration(&key(2), now, 30_000_000)];
        relay.register_validators(&mut registrations).await.unwrap();
        assert_eq!(relay.summary().registered_validators, 1);

        // stale registrations are ignored
        let mut stale = vec![registration(&key(2), now - 100, 1)];
        relay.register_validators(&mut stale).await.unwrap();
        let stored =
            relay.validator_registry.get_signed_registration(&key(2).public_key()).unwrap();
        assert_eq!(stored.message.gas_limit, 30_000_000);

        let mut future = vec![registration(&key(4), now + 60, 30_000_000)];
        assert!(matches!(
            relay.register_validators(&mut future).await,
            Err(Error::RegistrationFromFuture(..))
        ));
        assert_eq!(relay.summary().registered_validators, 1);
    }

    #[tokio::test]
    async fn test_registration_with_wrong_signature() {
        let relay = relay();
        let mut registrations = vec![registration(&key(2), current_unix_timestamp(), 30_000_000)];
        registrations[0].message.gas_limit = 1;
        assert!(relay.register_validators(&mut registrations).await.is_err());
        assert_eq!(relay.summary().registered_validators, 0);
    }

    #[tokio::test]
    async fn test_validator_for_slot() {
        let relay = relay();
        seed_proposer(&relay);
        assert!(matches!(
            relay.get_validator_for_slot(SLOT).await,
            Err(Error::ValidatorNotRegistered(..))
        ));

        let mut registrations = vec![registration(&key(2), current_unix_timestamp(), 25_000_000)];
        relay.register_validators(&mut registrations).await.unwrap();
        let preferences = relay.get_validator_for_slot(SLOT).await.unwrap();
        assert_eq!(preferences.public_key, key(2).public_key());
        assert_eq!(preferences.gas_limit, 25_000_000);
    }

    #[tokio::test]
    async fn test_remote_relay_falls_back_to_local() {
        let local = relay();
        seed_proposer(&local);
        let mut registrations = vec![registration(&key(2), current_unix_timestamp(), 25_000_000)];
        local.register_validators(&mut registrations).await.unwrap();

        // nothing listens on the remote endpoint so its schedule never has the slot
        let remote = RemoteRelay::new(Url::parse("http://127.0.0.1:1").unwrap(), Some(local));
        let preferences = remote.get_validator_for_slot(SLOT).await.unwrap();
        assert_eq!(preferences.public_key, key(2).public_key());
        assert_eq!(preferences.gas_limit, 25_000_000);

        assert!(remote.get_validator_for_slot(SLOT + 1).await.is_err());
    }

    #[tokio::test]
    async fn test_best_bid_and_open() {
        let relay = relay();
        seed_proposer(&relay);

        let mut low = submission(&relay, 10);
        let mut high = submission(&relay, 20);
        relay.submit_block(&mut high).await.unwrap();
        relay.submit_block(&mut low).await.unwrap();

        let bid_request = BidRequest {
            slot: SLOT,
            parent_hash: high.message.parent_hash.clone(),
            public_key: key(2).public_key(),
        };
        let mut signed_bid = relay.fetch_best_bid(&bid_request).await.unwrap();
        assert_eq!(signed_bid.message.value, U256::from(20u64));
        signed_bid.verify_signature(relay.builder_domain()).unwrap();

        let mut block = BlindedBeaconBlock {
            slot: SLOT,
            proposer_index: PROPOSER_INDEX,
            ..Default::default()
        };
        block.body.execution_payload_header = signed_bid.message.header.clone();
        let signature = sign_builder_message(&mut block, &key(2), &relay.proposer_domain).unwrap();
        let mut signed_block = SignedBlindedBeaconBlock { message: block, signature };
        let payload = relay.open_bid(&mut signed_block).await.unwrap();
        assert_eq!(payload.block_number, 20);

        let other_request = BidRequest { slot: SLOT + 1, ..bid_request };
        assert!(matches!(
            relay.fetch_best_bid(&other_request).await,
            Err(Error::NoBidPrepared(..))
        ));
    }

    #[tokio::test]
    async fn test_prune_keeps_bids_for_later_slots() {
        let relay = relay();
        let mut last_slot = submission_at(&relay, Slot::MAX, 10);
        relay.submit_block(&mut last_slot).await.unwrap();
        // pruning for an earlier slot must not overflow on the stored slot
        let mut earlier = submission(&relay, 10);
        relay.submit_block(&mut earlier).await.unwrap();

        let bid_request = BidRequest {
            slot: Slot::MAX,
            parent_hash: last_slot.message.parent_hash.clone(),
            public_key: key(2).public_key(),
        };
        assert!(relay.fetch_best_bid(&bid_request).await.is_ok());
    }

    #[tokio::test]
    async fn test_reject_tampered_submission() {
        let relay = relay();
        let mut tampered = submission(&relay, 10);
        tampered.message.value = U256::from(1_000u64);
        assert!(relay.submit_block(&mut tampered).await.is_err());
    }
}
