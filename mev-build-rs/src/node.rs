//! The host process: collects the RPC modules and lifecycle participants of its services.

use crate::Error;
use jsonrpsee::RpcModule;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{error, info};

/// A service whose start and stop are driven by the [`Node`].
pub trait Lifecycle: Send + Sync {
    fn start(&self) -> Result<(), Error>;

    fn stop(&self) -> Result<(), Error>;
}

pub struct RpcApi {
    pub namespace: &'static str,
    pub version: &'static str,
    pub module: RpcModule<()>,
    /// Exposed on the public endpoint.
    pub public: bool,
    /// Exposed on the authenticated endpoint.
    pub authenticated: bool,
}

impl std::fmt::Debug for RpcApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcApi")
            .field("namespace", &self.namespace)
            .field("version", &self.version)
            .field("methods", &self.module.method_names().collect::<Vec<_>>())
            .field("public", &self.public)
            .field("authenticated", &self.authenticated)
            .finish()
    }
}

#[derive(Default)]
struct State {
    apis: Vec<RpcApi>,
    lifecycles: Vec<Arc<dyn Lifecycle>>,
}

#[derive(Default)]
pub struct Node {
    state: Mutex<State>,
}

impl Node {
    pub fn register_apis(&self, apis: impl IntoIterator<Item = RpcApi>) {
        let mut state = self.state.lock();
        for api in apis {
            info!(namespace = api.namespace, version = api.version, "registered RPC API");
            state.apis.push(api);
        }
    }

    pub fn register_lifecycle(&self, lifecycle: Arc<dyn Lifecycle>) {
        self.state.lock().lifecycles.push(lifecycle);
    }

    pub fn api_namespaces(&self) -> Vec<&'static str> {
        self.state.lock().apis.iter().map(|api| api.namespace).collect()
    }

    pub fn lifecycle_count(&self) -> usize {
        self.state.lock().lifecycles.len()
    }

    /// Merges every registered module exposed on the requested endpoint.
    pub fn rpc_module(&self, authenticated: bool) -> Result<RpcModule<()>, Error> {
        let state = self.state.lock();
        let mut module = RpcModule::new(());
        for api in &state.apis {
            let exposed = if authenticated { api.authenticated } else { api.public };
            if exposed {
                module
                    .merge(api.module.clone())
                    .map_err(|err| Error::RpcRegistration(err.to_string()))?;
            }
        }
        Ok(module)
    }

    /// Starts every lifecycle in registration order.
    pub fn start(&self) -> Result<(), Error> {
        let lifecycles = self.state.lock().lifecycles.clone();
        for lifecycle in lifecycles {
            lifecycle.start()?;
        }
        Ok(())
    }

    /// Stops every lifecycle in reverse registration order, reporting the first failure.
    pub fn stop(&self) -> Result<(), Error> {
        let lifecycles = self.state.lock().lifecycles.clone();
        let mut result = Ok(());
        for lifecycle in lifecycles.iter().rev() {
            if let Err(err) = lifecycle.stop() {
                error!(%err, "could not stop service");
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        result
    }
}
