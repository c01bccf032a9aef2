use crate::{config::Config, execution::RpcChainBackend};
use clap::Args;
use eyre::WrapErr;
use jsonrpsee::server::Server;
use mev_build_rs::{register, Node};
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use url::Url;

#[derive(Debug, Args)]
#[clap(about = "🛠️ building blocks since 2023")]
pub struct Command {
    #[clap(env, default_value = "config.toml")]
    config_file: String,

    /// Connection string for the builder database; used when the config file sets none.
    #[clap(long, env = "FLASHBOTS_POSTGRES_DSN")]
    postgres_dsn: Option<String>,
}

impl Command {
    pub async fn execute(self) -> eyre::Result<()> {
        let config = Config::from_toml_file(&self.config_file)?;

        let Some(mut build_config) = config.build else {
            return Err(eyre::eyre!("missing builder config from file provided"))
        };
        if !build_config.enabled {
            info!("builder is not enabled, exiting");
            return Ok(())
        }
        if build_config.postgres_dsn.is_none() {
            build_config.postgres_dsn = self.postgres_dsn;
        }

        let execution =
            config.execution.ok_or_else(|| eyre::eyre!("missing execution config"))?;
        let endpoint = Url::parse(&execution.endpoint).wrap_err("invalid execution endpoint")?;
        let chain = Arc::new(RpcChainBackend::new(&endpoint)?);

        let node = Node::default();
        register(&node, &build_config, chain).await?;
        node.start()?;

        let server = Server::builder().build(config.rpc_addr).await?;
        let address = server.local_addr()?;
        let handle = server.start(node.rpc_module(true)?);
        info!(%address, "serving builder RPC");

        signal::ctrl_c().await?;
        info!("shutting down...");
        let _ = handle.stop();
        node.stop()?;
        Ok(())
    }
}
