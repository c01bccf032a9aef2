mod bid_request;
mod block_submission;
mod builder_bid;
mod payload_attributes;
mod proposer_schedule;

pub use bid_request::BidRequest;
pub use block_submission::{BidTrace, SignedBidSubmission};
pub use builder_bid::{execution_payload_header, BuilderBid, SignedBuilderBid};
pub use payload_attributes::PayloadAttributes;
pub use proposer_schedule::{ProposerSchedule, ValidatorPreferences};

pub use ethereum_consensus::{
    bellatrix::mainnet::{
        BlindedBeaconBlock, ExecutionPayload, ExecutionPayloadHeader, SignedBlindedBeaconBlock,
    },
    builder::{SignedValidatorRegistration, ValidatorRegistration},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusVersion {
    #[default]
    Bellatrix,
}

/// Response envelope for the builder API: `{"version": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionedValue<T> {
    pub version: ConsensusVersion,
    pub data: T,
}

impl<T> VersionedValue<T> {
    pub fn bellatrix(data: T) -> Self {
        Self { version: ConsensusVersion::Bellatrix, data }
    }
}

/// Network parameters as they were configured, kept verbatim for display.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkData {
    pub genesis_fork_version: String,
    pub bellatrix_fork_version: String,
    pub genesis_validators_root: String,
}
