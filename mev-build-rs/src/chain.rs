use crate::{
    types::{Bundle, BuiltBlock},
    Error,
};
use async_trait::async_trait;
use mev_rs::types::PayloadAttributes;

/// The execution layer the builder builds on top of.
#[async_trait]
pub trait ChainBackend: Send + Sync {
    async fn block_number(&self) -> Result<u64, Error>;

    async fn is_synced(&self) -> Result<bool, Error>;

    /// Builds the best block it can for `attributes`; fee recipient and gas limit
    /// already reflect the proposer's preferences.
    async fn build_block(&self, attributes: &PayloadAttributes) -> Result<BuiltBlock, Error>;

    /// Makes `bundles` available to subsequent builds.
    async fn add_bundles(&self, bundles: Vec<Bundle>) -> Result<(), Error>;
}
