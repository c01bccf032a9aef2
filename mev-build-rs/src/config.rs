use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:28545";
pub const DEFAULT_BEACON_ENDPOINT: &str = "http://127.0.0.1:5052";
pub const DEFAULT_GENESIS_FORK_VERSION: &str = "0x00000000";
pub const DEFAULT_BELLATRIX_FORK_VERSION: &str = "0x02000000";
pub const DEFAULT_GENESIS_VALIDATORS_ROOT: &str =
    "0x0000000000000000000000000000000000000000000000000000000000000000";

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

fn default_beacon_endpoint() -> String {
    DEFAULT_BEACON_ENDPOINT.to_string()
}

fn default_genesis_fork_version() -> String {
    DEFAULT_GENESIS_FORK_VERSION.to_string()
}

fn default_bellatrix_fork_version() -> String {
    DEFAULT_BELLATRIX_FORK_VERSION.to_string()
}

fn default_genesis_validators_root() -> String {
    DEFAULT_GENESIS_VALIDATORS_ROOT.to_string()
}

/// Builder configuration, read once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, alias = "enableValidatorChecks")]
    pub enable_validator_checks: bool,
    #[serde(default, alias = "enableLocalRelay")]
    pub enable_local_relay: bool,
    #[serde(default, alias = "disableBundleFetcher")]
    pub disable_bundle_fetcher: bool,
    #[serde(default, alias = "dryRun")]
    pub dry_run: bool,
    #[serde(default, alias = "builderSecretKey")]
    pub builder_secret_key: String,
    #[serde(default, alias = "relaySecretKey")]
    pub relay_secret_key: String,
    #[serde(default = "default_listen_addr", alias = "listenAddr")]
    pub listen_addr: String,
    #[serde(default = "default_genesis_fork_version", alias = "genesisForkVersion")]
    pub genesis_fork_version: String,
    #[serde(default = "default_bellatrix_fork_version", alias = "bellatrixForkVersion")]
    pub bellatrix_fork_version: String,
    #[serde(default = "default_genesis_validators_root", alias = "genesisValidatorsRoot")]
    pub genesis_validators_root: String,
    #[serde(default = "default_beacon_endpoint", alias = "beaconEndpoint")]
    pub beacon_endpoint: String,
    /// Empty means the builder only talks to its local relay.
    #[serde(default, alias = "remoteRelayEndpoint")]
    pub remote_relay_endpoint: String,
    #[serde(default, alias = "validationBlocklist")]
    pub validation_blocklist: Option<PathBuf>,
    /// Connection string for the persistence backend; absent selects the no-op service.
    #[serde(default, alias = "postgresDsn")]
    pub postgres_dsn: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: false,
            enable_validator_checks: false,
            enable_local_relay: false,
            disable_bundle_fetcher: false,
            dry_run: false,
            builder_secret_key: Default::default(),
            relay_secret_key: Default::default(),
            listen_addr: default_listen_addr(),
            genesis_fork_version: default_genesis_fork_version(),
            bellatrix_fork_version: default_bellatrix_fork_version(),
            genesis_validators_root: default_genesis_validators_root(),
            beacon_endpoint: default_beacon_endpoint(),
            remote_relay_endpoint: Default::default(),
            validation_blocklist: None,
            postgres_dsn: None,
        }
    }
}
