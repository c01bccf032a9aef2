//! Background feed moving pending bundles from the data service into the chain backend.
//!
//! Three tasks connected by two channels:
//! the head watcher polls the chain for new block numbers, the fetcher loads bundles for the
//! following block and the pusher hands non-empty batches to the chain backend. Errors are
//! logged and the feed keeps going; it only stops when cancelled.

use crate::{
    cancelled::Cancelled, chain::ChainBackend, data_service::DataService, types::Bundle, Error,
};
use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::mpsc::{self, Receiver, Sender},
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, trace, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const CHANNEL_SIZE: usize = 16;

/// Where the fetcher loads pending bundles from.
#[async_trait]
trait BundleSource: Send + Sync + 'static {
    async fn get_bundles(&self, block_number: u64) -> Result<Vec<Bundle>, Error>;
}

#[async_trait]
impl BundleSource for DataService {
    async fn get_bundles(&self, block_number: u64) -> Result<Vec<Bundle>, Error> {
        DataService::get_bundles(self, block_number).await
    }
}

/// Handle to a running bundle feed.
pub struct BundleFetcher {
    cancelled: Cancelled,
    tasks: Vec<JoinHandle<()>>,
}

impl BundleFetcher {
    pub fn spawn(
        chain: Arc<dyn ChainBackend>,
        data_service: DataService,
        poll_interval: Duration,
    ) -> Self {
        let cancelled = Cancelled::default();
        let (block_numbers_tx, block_numbers_rx) = mpsc::channel(CHANNEL_SIZE);
        let (bundles_tx, bundles_rx) = mpsc::channel(CHANNEL_SIZE);

        let tasks = vec![
            tokio::spawn(watch_head(
                chain.clone(),
                poll_interval,
                block_numbers_tx,
                cancelled.clone(),
            )),
            tokio::spawn(fetch_bundles(
                data_service,
                block_numbers_rx,
                bundles_tx,
                cancelled.clone(),
            )),
            tokio::spawn(push_bundles(chain, bundles_rx, cancelled.clone())),
        ];
        debug!("bundle fetcher started");
        Self { cancelled, tasks }
    }

    pub fn stop(&self) {
        self.cancelled.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.tasks.iter().all(|task| task.is_finished())
    }
}

async fn watch_head(
    chain: Arc<dyn ChainBackend>,
    poll_interval: Duration,
    block_numbers: Sender<u64>,
    cancelled: Cancelled,
) {
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut latest = None;
    loop {
        tokio::select! {
            _ = cancelled.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let block_number = match chain.block_number().await {
            Ok(block_number) => block_number,
            Err(err) => {
                warn!(%err, "could not fetch current block number");
                continue
            }
        };
        if latest.map_or(true, |latest| block_number > latest) {
            latest = Some(block_number);
            trace!(block_number, "new head");
            if block_numbers.send(block_number).await.is_err() {
                break
            }
        }
    }
}

async fn fetch_bundles<S: BundleSource>(
    source: S,
    mut block_numbers: Receiver<u64>,
    bundles: Sender<Vec<Bundle>>,
    cancelled: Cancelled,
) {
    loop {
        let block_number = tokio::select! {
            _ = cancelled.cancelled() => break,
            block_number = block_numbers.recv() => match block_number {
                Some(block_number) => block_number,
                None => break,
            },
        };
        // bundles target the block built on top of the current head
        let target = block_number + 1;
        match source.get_bundles(target).await {
            Ok(batch) if batch.is_empty() => {}
            Ok(batch) => {
                debug!(block_number = target, count = batch.len(), "fetched bundles");
                if bundles.send(batch).await.is_err() {
                    break
                }
            }
            Err(err) => warn!(%err, block_number = target, "could not fetch bundles"),
        }
    }
}

async fn push_bundles(
    chain: Arc<dyn ChainBackend>,
    mut bundles: Receiver<Vec<Bundle>>,
    cancelled: Cancelled,
) {
    loop {
        let batch = tokio::select! {
            _ = cancelled.cancelled() => break,
            batch = bundles.recv() => match batch {
                Some(batch) => batch,
                None => break,
            },
        };
        if let Err(err) = chain.add_bundles(batch).await {
            warn!(%err, "could not add bundles to chain backend");
        }
    }
}
