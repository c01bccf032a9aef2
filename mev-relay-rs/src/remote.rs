use crate::{relay::LocalRelay, Error};
use beacon_api_client::mainnet::Client as ApiClient;
use ethereum_consensus::primitives::Slot;
use mev_rs::{
    blinded_block_relayer::Client as RelayClient,
    types::{SignedBidSubmission, ValidatorPreferences},
    BlindedBlockRelayer,
};
use parking_lot::Mutex;
use std::{collections::HashMap, ops::Deref, sync::Arc};
use tracing::{debug, warn};
use url::Url;

/// A relay reached over the relay API, optionally paired with a local relay.
#[derive(Clone)]
pub struct RemoteRelay(Arc<Inner>);

impl Deref for RemoteRelay {
    type Target = Inner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub struct Inner {
    endpoint: Url,
    client: RelayClient,
    local: Option<LocalRelay>,
    schedule: Mutex<HashMap<Slot, ValidatorPreferences>>,
}

impl RemoteRelay {
    pub fn new(endpoint: Url, local: Option<LocalRelay>) -> Self {
        let client = RelayClient::new(ApiClient::new(endpoint.clone()));
        let inner = Inner { endpoint, client, local, schedule: Default::default() };
        Self(Arc::new(inner))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn local(&self) -> Option<&LocalRelay> {
        self.local.as_ref()
    }

    fn cached_preferences(&self, slot: Slot) -> Option<ValidatorPreferences> {
        self.schedule.lock().get(&slot).cloned()
    }

    async fn refresh_schedule(&self) -> Result<(), Error> {
        let schedule = self.client.get_proposal_schedule().await?;
        debug!(endpoint = %self.endpoint, count = schedule.len(), "refreshed proposer schedule");
        let mut state = self.schedule.lock();
        state.clear();
        for entry in &schedule {
            state.insert(entry.slot, ValidatorPreferences::from(entry));
        }
        Ok(())
    }

    pub async fn get_validator_for_slot(&self, slot: Slot) -> Result<ValidatorPreferences, Error> {
        if let Some(preferences) = self.cached_preferences(slot) {
            return Ok(preferences)
        }
        if let Err(err) = self.refresh_schedule().await {
            warn!(%err, endpoint = %self.endpoint, "could not refresh proposer schedule");
        }
        if let Some(preferences) = self.cached_preferences(slot) {
            return Ok(preferences)
        }
        match &self.local {
            Some(local) => local.get_validator_for_slot(slot).await.map_err(From::from),
            None => Err(Error::ValidatorNotFound(slot)),
        }
    }

    pub async fn submit_block(&self, submission: &SignedBidSubmission) -> Result<(), Error> {
        self.client.submit_bid(submission).await?;
        if let Some(local) = &self.local {
            let mut submission = submission.clone();
            if let Err(err) = local.submit_block(&mut submission).await {
                warn!(%err, "local relay rejected submission accepted by remote relay");
            }
        }
        Ok(())
    }
}
