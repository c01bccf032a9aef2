use async_trait::async_trait;
use jsonrpsee::{
    core::client::ClientT,
    http_client::{HttpClient, HttpClientBuilder},
    rpc_params,
};
use mev_build_rs::{Bundle, BuiltBlock, ChainBackend, Error};
use mev_rs::types::PayloadAttributes;
use serde_json::Value;
use tracing::debug;
use url::Url;

fn backend_error(err: impl std::fmt::Display) -> Error {
    Error::ChainBackend(err.to_string())
}

/// A `ChainBackend` over an execution node's JSON-RPC endpoint.
pub struct RpcChainBackend {
    client: HttpClient,
}

impl RpcChainBackend {
    pub fn new(endpoint: &Url) -> Result<Self, Error> {
        let client = HttpClientBuilder::default().build(endpoint).map_err(backend_error)?;
        Ok(Self { client })
    }
}

fn parse_quantity(value: &str) -> Result<u64, Error> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| Error::ChainBackend(format!("expected hex quantity, got `{value}`")))?;
    u64::from_str_radix(digits, 16).map_err(backend_error)
}

#[async_trait]
impl ChainBackend for RpcChainBackend {
    async fn block_number(&self) -> Result<u64, Error> {
        let number: String =
            self.client.request("eth_blockNumber", rpc_params![]).await.map_err(backend_error)?;
        parse_quantity(&number)
    }

    async fn is_synced(&self) -> Result<bool, Error> {
        // `false` when synced, otherwise an object describing progress
        let status: Value =
            self.client.request("eth_syncing", rpc_params![]).await.map_err(backend_error)?;
        Ok(matches!(status, Value::Bool(false)))
    }

    async fn build_block(&self, attributes: &PayloadAttributes) -> Result<BuiltBlock, Error> {
        debug!(slot = attributes.slot, "cannot build block over plain JSON-RPC");
        Err(Error::ChainBackend(
            "block building is not supported by the JSON-RPC execution backend".to_string(),
        ))
    }

    async fn add_bundles(&self, bundles: Vec<Bundle>) -> Result<(), Error> {
        for bundle in bundles {
            let _: Value = self
                .client
                .request("eth_sendBundle", rpc_params![bundle])
                .await
                .map_err(backend_error)?;
        }
        Ok(())
    }
}
