use eyre::WrapErr;
use mev_build_rs::Config as BuildConfig;
use mev_rs::config::from_toml_file;
use serde::Deserialize;
use std::{fmt, net::SocketAddr, path::Path};

fn default_rpc_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8552))
}

#[derive(Debug, Deserialize)]
pub struct ExecutionConfig {
    /// JSON-RPC endpoint of the execution node.
    pub endpoint: String,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Where the authenticated JSON-RPC modules are served.
    #[serde(default = "default_rpc_addr")]
    pub rpc_addr: SocketAddr,
    pub execution: Option<ExecutionConfig>,
    #[serde(rename = "builder")]
    pub build: Option<BuildConfig>,
}

impl Config {
    pub fn from_toml_file<P: AsRef<Path> + fmt::Display>(path: P) -> eyre::Result<Config> {
        tracing::info!("loading config from `{path}`...");

        from_toml_file::<_, Self>(path.as_ref()).wrap_err("could not parse TOML")
    }
}
