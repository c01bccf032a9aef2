mod proposer_scheduler;
mod relay;
mod remote;
mod validator_registry;

pub use proposer_scheduler::SLOTS_PER_EPOCH;
pub use relay::LocalRelay;
pub use remote::RemoteRelay;

use ethereum_consensus::primitives::Slot;
use mev_rs::types::{SignedBidSubmission, ValidatorPreferences};
use thiserror::Error;
use tracing::info;
use url::Url;

#[derive(Debug, Error)]
pub enum Error {
    #[error("neither local nor remote relay specified")]
    NoRelay,
    #[error("validator not found for slot {0}")]
    ValidatorNotFound(Slot),
    #[error("invalid remote relay endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error(transparent)]
    Relay(#[from] mev_rs::Error),
}

/// The relay a builder submits to. Exactly one is active per process.
#[derive(Clone)]
pub enum Relay {
    Local(LocalRelay),
    Remote(RemoteRelay),
}

impl Relay {
    pub async fn get_validator_for_slot(&self, slot: Slot) -> Result<ValidatorPreferences, Error> {
        match self {
            Self::Local(relay) => relay.get_validator_for_slot(slot).await.map_err(From::from),
            Self::Remote(relay) => relay.get_validator_for_slot(slot).await,
        }
    }

    pub async fn submit_block(&self, submission: &SignedBidSubmission) -> Result<(), Error> {
        match self {
            Self::Local(relay) => {
                let mut submission = submission.clone();
                relay.submit_block(&mut submission).await.map_err(From::from)
            }
            Self::Remote(relay) => relay.submit_block(submission).await,
        }
    }

    /// The in-process relay, whether active or serving as a companion.
    pub fn local(&self) -> Option<&LocalRelay> {
        match self {
            Self::Local(relay) => Some(relay),
            Self::Remote(relay) => relay.local(),
        }
    }
}

/// Selects the active relay: a non-empty remote endpoint wins (with any local relay as its
/// companion), otherwise the local relay, otherwise configuration is incomplete.
pub fn resolve_relay(remote_endpoint: &str, local: Option<LocalRelay>) -> Result<Relay, Error> {
    if !remote_endpoint.is_empty() {
        let endpoint = Url::parse(remote_endpoint)?;
        info!(%endpoint, with_local = local.is_some(), "using remote relay");
        return Ok(Relay::Remote(RemoteRelay::new(endpoint, local)))
    }
    match local {
        Some(local) => {
            info!(public_key = %local.public_key(), "using local relay");
            Ok(Relay::Local(local))
        }
        None => Err(Error::NoRelay),
    }
}
