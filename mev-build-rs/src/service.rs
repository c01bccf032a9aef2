use crate::{builder::Builder, cancelled::Cancelled, node::Lifecycle, Error};
use async_trait::async_trait;
use jsonrpsee::{core::RpcResult, proc_macros::rpc, types::ErrorObject};
use mev_relay_rs::LocalRelay;
use mev_rs::{blinded_block_provider::router, types::PayloadAttributes};
use parking_lot::Mutex;
use std::{
    net::{SocketAddr, TcpListener},
    ops::Deref,
    sync::Arc,
};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{error, info};

// server error range reserved for implementation-defined errors
const BUILDER_ERROR_CODE: i32 = -32000;

/// Outcome of binding the builder API listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerStatus {
    /// No local relay, so nothing is served.
    Disabled,
    Pending,
    Listening(SocketAddr),
    Failed(String),
    Stopped,
}

#[rpc(server, namespace = "builder")]
pub trait BuilderApi {
    #[method(name = "payloadAttributes")]
    async fn payload_attributes(&self, attributes: PayloadAttributes) -> RpcResult<()>;
}

/// Serves the builder API for the local relay (if any) and drives the builder backend.
///
/// Callers start and stop the service at most once each.
#[derive(Clone)]
pub struct BuilderService(Arc<Inner>);

impl Deref for BuilderService {
    type Target = Inner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub struct Inner {
    listen_addr: String,
    local_relay: Option<LocalRelay>,
    builder: Builder,
    server: Mutex<Option<JoinHandle<()>>>,
    shutdown: Cancelled,
    status: Arc<watch::Sender<ListenerStatus>>,
}

impl BuilderService {
    pub fn new(listen_addr: String, local_relay: Option<LocalRelay>, builder: Builder) -> Self {
        let initial =
            if local_relay.is_some() { ListenerStatus::Pending } else { ListenerStatus::Disabled };
        let (status, _) = watch::channel(initial);
        let inner = Inner {
            listen_addr,
            local_relay,
            builder,
            server: Default::default(),
            shutdown: Default::default(),
            status: Arc::new(status),
        };
        Self(Arc::new(inner))
    }

    pub fn builder(&self) -> &Builder {
        &self.builder
    }

    pub fn has_server(&self) -> bool {
        self.local_relay.is_some()
    }

    pub fn listener_status(&self) -> ListenerStatus {
        self.status.borrow().clone()
    }

    /// Waits until the listener has bound (or failed to), returning the outcome.
    pub async fn wait_for_listener(&self) -> ListenerStatus {
        let mut status = self.status.subscribe();
        let result = status
            .wait_for(|status| !matches!(status, ListenerStatus::Pending))
            .await
            .map(|status| status.clone());
        result.unwrap_or(ListenerStatus::Stopped)
    }

    /// Starts the builder and, with a local relay, begins serving the builder API.
    ///
    /// Returns without waiting for the listener; see [`Self::wait_for_listener`].
    pub fn start(&self) {
        if let Some(relay) = self.local_relay.clone() {
            let listen_addr = self.listen_addr.clone();
            let shutdown = self.shutdown.clone();
            let status = self.status.clone();
            let handle = tokio::spawn(serve(listen_addr, relay, shutdown, status));
            *self.server.lock() = Some(handle);
            info!(listen_addr = %self.listen_addr, "builder service started");
        }
        self.builder.start();
    }

    /// Closes the listener (if any) and stops the builder.
    pub fn stop(&self) {
        self.shutdown.cancel();
        if let Some(server) = self.server.lock().take() {
            server.abort();
        }
        self.status.send_if_modified(|status| match status {
            ListenerStatus::Pending | ListenerStatus::Listening(..) => {
                *status = ListenerStatus::Stopped;
                true
            }
            _ => false,
        });
        self.builder.stop();
    }

    pub async fn payload_attributes(&self, attributes: PayloadAttributes) -> Result<(), Error> {
        self.builder.on_payload_attribute(attributes).await
    }
}

async fn serve(
    listen_addr: String,
    relay: LocalRelay,
    shutdown: Cancelled,
    status: Arc<watch::Sender<ListenerStatus>>,
) {
    let listener = match TcpListener::bind(&listen_addr).and_then(|listener| {
        listener.set_nonblocking(true)?;
        Ok(listener)
    }) {
        Ok(listener) => listener,
        Err(err) => {
            error!(%err, %listen_addr, "could not bind builder API listener");
            status.send_replace(ListenerStatus::Failed(err.to_string()));
            return
        }
    };
    let server = match axum::Server::from_tcp(listener) {
        Ok(server) => server,
        Err(err) => {
            error!(%err, %listen_addr, "could not serve builder API");
            status.send_replace(ListenerStatus::Failed(err.to_string()));
            return
        }
    };
    let server = server.serve(router(relay).into_make_service());
    let address = server.local_addr();
    if shutdown.is_cancelled() {
        return
    }
    status.send_replace(ListenerStatus::Listening(address));
    info!(%address, "serving builder API");

    if let Err(err) = server.with_graceful_shutdown(shutdown.cancelled()).await {
        error!(%err, "error while listening for incoming");
        status.send_replace(ListenerStatus::Failed(err.to_string()));
        return
    }
    status.send_replace(ListenerStatus::Stopped);
}

impl Lifecycle for BuilderService {
    fn start(&self) -> Result<(), Error> {
        BuilderService::start(self);
        Ok(())
    }

    fn stop(&self) -> Result<(), Error> {
        BuilderService::stop(self);
        Ok(())
    }
}

#[async_trait]
impl BuilderApiServer for BuilderService {
    async fn payload_attributes(&self, attributes: PayloadAttributes) -> RpcResult<()> {
        BuilderService::payload_attributes(self, attributes).await.map_err(|err| {
            ErrorObject::owned(BUILDER_ERROR_CODE, err.to_string(), None::<()>).into()
        })
    }
}
