#[cfg(feature = "api")]
mod api;

#[cfg(feature = "api")]
pub use api::server::{log_request, router};

use crate::{
    error::Error,
    types::{
        BidRequest, ExecutionPayload, ForkData, SignedBlindedBeaconBlock, SignedBuilderBid,
        SignedValidatorRegistration,
    },
};
use async_trait::async_trait;
use ethereum_consensus::primitives::BlsPublicKey;

/// What the index page of a provider shows.
#[derive(Debug, Clone)]
pub struct ProviderSummary {
    pub public_key: BlsPublicKey,
    pub fork_data: ForkData,
    pub registered_validators: usize,
}

#[async_trait]
pub trait BlindedBlockProvider {
    async fn register_validators(
        &self,
        registrations: &mut [SignedValidatorRegistration],
    ) -> Result<(), Error>;

    async fn fetch_best_bid(&self, bid_request: &BidRequest) -> Result<SignedBuilderBid, Error>;

    async fn open_bid(
        &self,
        signed_block: &mut SignedBlindedBeaconBlock,
    ) -> Result<ExecutionPayload, Error>;

    fn summary(&self) -> ProviderSummary;
}
