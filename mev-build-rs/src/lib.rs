mod block_validation;
mod builder;
mod bundle_fetcher;
mod cancelled;
mod chain;
mod config;
mod data_service;
mod error;
mod node;
mod register;
mod service;
mod types;

pub use block_validation::{AccessListError, AccessVerifier, BlockValidator};
pub use builder::Builder;
pub use bundle_fetcher::{BundleFetcher, DEFAULT_POLL_INTERVAL};
pub use chain::ChainBackend;
pub use config::Config;
pub use data_service::{resolve_data_service, DataService, PostgresDataService};
pub use error::Error;
pub use node::{Lifecycle, Node, RpcApi};
pub use register::{register, SigningDomains, RPC_NAMESPACE, RPC_VERSION};
pub use service::{BuilderApiServer, BuilderService, ListenerStatus};
pub use types::{Bundle, BuiltBlock};
