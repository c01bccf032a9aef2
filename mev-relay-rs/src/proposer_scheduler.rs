use beacon_api_client::mainnet::Client;
use ethereum_consensus::primitives::{BlsPublicKey, Epoch, Slot, ValidatorIndex};
use mev_rs::Error;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use tracing::debug;

pub const SLOTS_PER_EPOCH: Slot = 32;

pub type Proposer = (ValidatorIndex, BlsPublicKey);

#[derive(Default)]
struct State {
    loaded_epochs: HashSet<Epoch>,
    proposers: HashMap<Slot, Proposer>,
}

/// Caches proposer duties fetched from the beacon node, one epoch at a time.
pub struct ProposerScheduler {
    api: Client,
    state: Mutex<State>,
}

impl ProposerScheduler {
    pub fn new(api: Client) -> Self {
        Self { api, state: Default::default() }
    }

    pub async fn get_proposer_for(&self, slot: Slot) -> Result<Proposer, Error> {
        let epoch = slot / SLOTS_PER_EPOCH;
        let loaded = {
            let state = self.state.lock();
            if let Some(proposer) = state.proposers.get(&slot) {
                return Ok(proposer.clone())
            }
            state.loaded_epochs.contains(&epoch)
        };
        if !loaded {
            let (_dependent_root, duties) = self.api.get_proposer_duties(epoch).await?;
            debug!(epoch, count = duties.len(), "fetched proposer duties");
            self.insert_duties(
                epoch,
                duties.into_iter().map(|duty| (duty.slot, duty.validator_index, duty.public_key)),
            );
        }
        self.state.lock().proposers.get(&slot).cloned().ok_or(Error::MissingProposer(slot))
    }

    pub(crate) fn insert_duties(
        &self,
        epoch: Epoch,
        duties: impl IntoIterator<Item = (Slot, ValidatorIndex, BlsPublicKey)>,
    ) {
        let mut state = self.state.lock();
        // drop anything older than the previous epoch
        let oldest_slot = epoch.saturating_sub(1) * SLOTS_PER_EPOCH;
        state.proposers.retain(|&slot, _| slot >= oldest_slot);
        state.loaded_epochs.retain(|&loaded| loaded + 1 >= epoch);
        state.loaded_epochs.insert(epoch);
        for (slot, index, public_key) in duties {
            state.proposers.insert(slot, (index, public_key));
        }
    }
}
