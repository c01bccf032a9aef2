use crate::{
    block_validation::{AccessVerifier, BlockValidator},
    bundle_fetcher::{BundleFetcher, DEFAULT_POLL_INTERVAL},
    builder::Builder,
    chain::ChainBackend,
    config::Config,
    data_service::resolve_data_service,
    node::{Node, RpcApi},
    service::{BuilderApiServer, BuilderService},
    Error,
};
use beacon_api_client::mainnet::Client as ApiClient;
use ethereum_consensus::primitives::Root;
use jsonrpsee::RpcModule;
use mev_relay_rs::{resolve_relay, LocalRelay};
use mev_rs::{
    encoding::{decode_prefixed_hex_exact, decode_prefixed_hex_truncated, DecodeError},
    signing::{
        compute_builder_domain, compute_proposer_domain, ForkVersion, SigningDomain,
        SigningKeyPair,
    },
    types::ForkData,
};
use std::sync::Arc;
use tracing::info;
use url::Url;

pub const RPC_NAMESPACE: &str = "builder";
pub const RPC_VERSION: &str = "1.0";

fn decode_key_pair(field: &'static str, input: &str) -> Result<SigningKeyPair, Error> {
    SigningKeyPair::from_hex(input).map_err(|source| Error::SecretKey { field, source })
}

/// Decodes a fork version; only the first four bytes are used.
fn decode_fork_version(field: &'static str, input: &str) -> Result<ForkVersion, Error> {
    decode_prefixed_hex_truncated(input).map_err(|source| Error::InvalidConfig { field, source })
}

fn decode_root(field: &'static str, input: &str) -> Result<Root, Error> {
    let bytes: [u8; 32] = decode_prefixed_hex_exact(input)
        .map_err(|source| Error::InvalidConfig { field, source })?;
    Root::try_from(bytes.as_ref()).map_err(|_| Error::InvalidConfig {
        field,
        source: DecodeError::InvalidLength { expected: 32, provided: bytes.len() },
    })
}

/// Signing domains for builder messages and for proposer-signed blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigningDomains {
    pub builder: SigningDomain,
    pub proposer: SigningDomain,
}

impl SigningDomains {
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let genesis_fork_version =
            decode_fork_version("genesisForkVersion", &config.genesis_fork_version)?;
        let builder = compute_builder_domain(genesis_fork_version)?;

        let genesis_validators_root =
            decode_root("genesisValidatorsRoot", &config.genesis_validators_root)?;
        let bellatrix_fork_version =
            decode_fork_version("bellatrixForkVersion", &config.bellatrix_fork_version)?;
        let proposer = compute_proposer_domain(bellatrix_fork_version, &genesis_validators_root)?;

        Ok(Self { builder, proposer })
    }
}

/// Wires the builder from `config` and registers it with `node`.
///
/// `node` is only touched once every fallible step has succeeded.
pub async fn register(
    node: &Node,
    config: &Config,
    chain: Arc<dyn ChainBackend>,
) -> Result<BuilderService, Error> {
    let relay_key_pair = decode_key_pair("relaySecretKey", &config.relay_secret_key)?;
    let builder_key_pair = decode_key_pair("builderSecretKey", &config.builder_secret_key)?;

    let domains = SigningDomains::from_config(config)?;
    info!(
        builder_domain = %domains.builder,
        proposer_domain = %domains.proposer,
        "computed signing domains"
    );

    let local_relay = if config.enable_local_relay {
        // only the local relay talks to the beacon node
        let beacon_node = ApiClient::new(Url::parse(&config.beacon_endpoint)?);
        let fork_data = ForkData {
            genesis_fork_version: config.genesis_fork_version.clone(),
            bellatrix_fork_version: config.bellatrix_fork_version.clone(),
            genesis_validators_root: config.genesis_validators_root.clone(),
        };
        Some(LocalRelay::new(
            relay_key_pair,
            beacon_node,
            domains.builder,
            domains.proposer,
            fork_data,
            config.enable_validator_checks,
        ))
    } else {
        None
    };

    let relay = resolve_relay(&config.remote_relay_endpoint, local_relay.clone())?;

    let validator = if config.dry_run {
        let access_verifier = match &config.validation_blocklist {
            Some(path) => {
                let verifier = AccessVerifier::from_file(path).map_err(|source| {
                    Error::ValidationBlocklist { path: path.display().to_string(), source }
                })?;
                info!(
                    path = %path.display(),
                    entries = verifier.len(),
                    "loaded validation blocklist"
                );
                Some(verifier)
            }
            None => None,
        };
        Some(BlockValidator::new(domains.builder, access_verifier))
    } else {
        None
    };

    let data_service = resolve_data_service(config.postgres_dsn.as_deref()).await;

    let bundle_fetcher = if config.disable_bundle_fetcher {
        None
    } else {
        Some(BundleFetcher::spawn(chain.clone(), data_service.clone(), DEFAULT_POLL_INTERVAL))
    };

    let builder = Builder::new(
        builder_key_pair,
        domains.builder,
        relay,
        chain,
        data_service,
        config.dry_run,
        validator,
        bundle_fetcher,
    );
    let service = BuilderService::new(config.listen_addr.clone(), local_relay, builder);

    let mut module = RpcModule::new(());
    if let Err(err) = module.merge(service.clone().into_rpc()) {
        service.stop();
        return Err(Error::RpcRegistration(err.to_string()))
    }

    node.register_apis([RpcApi {
        namespace: RPC_NAMESPACE,
        version: RPC_VERSION,
        module,
        public: true,
        authenticated: true,
    }]);
    node.register_lifecycle(Arc::new(service.clone()));

    Ok(service)
}
