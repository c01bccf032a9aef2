use crate::block_validation::AccessListError;
use ethereum_consensus::primitives::ExecutionAddress;
use mev_rs::{encoding::DecodeError, signing::KeyError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("incorrect builder API secret key provided ({field}): {source}")]
    SecretKey { field: &'static str, source: KeyError },
    #[error("invalid {field}: {source}")]
    InvalidConfig { field: &'static str, source: DecodeError },
    #[error("invalid beacon endpoint: {0}")]
    BeaconEndpoint(#[from] url::ParseError),
    #[error("failed to load validation blocklist {path}: {source}")]
    ValidationBlocklist { path: String, source: AccessListError },
    #[error("backend not synced")]
    NotSynced,
    #[error("block touches blocklisted address {0}")]
    BlocklistedAddress(ExecutionAddress),
    #[error("chain backend: {0}")]
    ChainBackend(String),
    #[error("could not register RPC module: {0}")]
    RpcRegistration(String),
    #[error(transparent)]
    DataService(#[from] sqlx::Error),
    #[error(transparent)]
    Relay(#[from] mev_relay_rs::Error),
    #[error(transparent)]
    Builder(#[from] mev_rs::Error),
    #[error(transparent)]
    Consensus(#[from] ethereum_consensus::Error),
}
