use crate::{
    block_validation::BlockValidator, bundle_fetcher::BundleFetcher, chain::ChainBackend,
    data_service::DataService, Error,
};
use mev_relay_rs::Relay;
use mev_rs::{
    signing::{SigningDomain, SigningKeyPair},
    types::{BidTrace, PayloadAttributes, ValidatorPreferences},
};
use parking_lot::Mutex;
use std::{ops::Deref, sync::Arc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

struct BuildJob {
    attributes: PayloadAttributes,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct State {
    current_job: Option<BuildJob>,
    bundle_fetcher: Option<BundleFetcher>,
}

/// Builds a block for each set of payload attributes and offers it to the relay.
#[derive(Clone)]
pub struct Builder(Arc<Inner>);

impl Deref for Builder {
    type Target = Inner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub struct Inner {
    key_pair: SigningKeyPair,
    builder_domain: SigningDomain,
    relay: Relay,
    chain: Arc<dyn ChainBackend>,
    data_service: DataService,
    dry_run: bool,
    validator: Option<BlockValidator>,
    state: Mutex<State>,
}

impl Builder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        key_pair: SigningKeyPair,
        builder_domain: SigningDomain,
        relay: Relay,
        chain: Arc<dyn ChainBackend>,
        data_service: DataService,
        dry_run: bool,
        validator: Option<BlockValidator>,
        bundle_fetcher: Option<BundleFetcher>,
    ) -> Self {
        let state = State { current_job: None, bundle_fetcher };
        let inner = Inner {
            key_pair,
            builder_domain,
            relay,
            chain,
            data_service,
            dry_run,
            validator,
            state: Mutex::new(state),
        };
        Self(Arc::new(inner))
    }

    pub fn public_key(&self) -> &ethereum_consensus::primitives::BlsPublicKey {
        self.key_pair.public_key()
    }

    pub fn relay(&self) -> &Relay {
        &self.relay
    }

    pub fn start(&self) {
        info!(public_key = %self.key_pair.public_key(), dry_run = self.dry_run, "builder started");
    }

    /// Cancels the in-flight build and the bundle feed.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        if let Some(job) = state.current_job.take() {
            job.handle.abort();
        }
        if let Some(bundle_fetcher) = state.bundle_fetcher.take() {
            bundle_fetcher.stop();
        }
        info!("builder stopped");
    }

    pub async fn on_payload_attribute(
        &self,
        mut attributes: PayloadAttributes,
    ) -> Result<(), Error> {
        let preferences = self.relay.get_validator_for_slot(attributes.slot).await?;
        attributes.suggested_fee_recipient = preferences.fee_recipient.clone();
        attributes.gas_limit = preferences.gas_limit;

        if !self.chain.is_synced().await? {
            return Err(Error::NotSynced)
        }

        let mut state = self.state.lock();
        if let Some(job) = state.current_job.as_ref() {
            if job.attributes == attributes {
                debug!(%attributes, "already building for these attributes");
                return Ok(())
            }
        }
        if let Some(previous) = state.current_job.take() {
            debug!(attributes = %previous.attributes, "cancelling previous build");
            previous.handle.abort();
        }

        info!(%attributes, "building block");
        let builder = self.clone();
        let job_attributes = attributes.clone();
        let handle = tokio::spawn(async move {
            let slot = job_attributes.slot;
            if let Err(err) = builder.run_build_job(&job_attributes, &preferences).await {
                error!(%err, slot, "could not build block");
            }
        });
        state.current_job = Some(BuildJob { attributes, handle });
        Ok(())
    }

    async fn run_build_job(
        &self,
        attributes: &PayloadAttributes,
        preferences: &ValidatorPreferences,
    ) -> Result<(), Error> {
        let block = self.chain.build_block(attributes).await?;
        if let Err(err) = self.data_service.consume_built_block(&block, preferences).await {
            warn!(%err, "could not record built block");
        }

        let payload = &block.payload;
        let trace = BidTrace {
            slot: attributes.slot,
            parent_hash: payload.parent_hash.clone(),
            block_hash: payload.block_hash.clone(),
            builder_public_key: self.key_pair.public_key().clone(),
            proposer_public_key: preferences.public_key.clone(),
            proposer_fee_recipient: preferences.fee_recipient.clone(),
            gas_limit: payload.gas_limit,
            gas_used: payload.gas_used,
            value: block.value.clone(),
        };
        let submission =
            trace.sign(block.payload.clone(), &self.key_pair, &self.builder_domain)?;

        if self.dry_run {
            match &self.validator {
                Some(validator) => {
                    let touched_addresses = &block.touched_addresses;
                    match validator.validate_builder_submission(&submission, touched_addresses) {
                        Ok(()) => info!(%submission, "dry run: block is valid"),
                        Err(err) => warn!(%err, %submission, "dry run: block is invalid"),
                    }
                }
                None => info!(%submission, "dry run: not submitting block"),
            }
            return Ok(())
        }

        self.relay.submit_block(&submission).await?;
        info!(%submission, "submitted block");
        Ok(())
    }
}
