//! Periodic snapshot polling.
//!
//! The poller owns the only timer in the system. It fetches a snapshot on a
//! fixed interval and stores it; reports are computed on demand from the
//! stored snapshot, so the engine never runs inside the timer.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::data_sources::MaritimeApiClient;
use crate::error::BackendError;
use crate::model::RawSnapshot;

/// A fetched snapshot and when it arrived.
#[derive(Debug, Clone)]
pub struct StoredSnapshot {
    pub fetched_at: DateTime<Utc>,
    pub snapshot: Arc<RawSnapshot>,
}

/// Latest snapshot, shared between the poller and request handlers.
#[derive(Clone, Default)]
pub struct SnapshotStore {
    inner: Arc<RwLock<Option<StoredSnapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored snapshot.
    pub async fn put(&self, snapshot: RawSnapshot, fetched_at: DateTime<Utc>) {
        let stored = StoredSnapshot {
            fetched_at,
            snapshot: Arc::new(snapshot),
        };
        *self.inner.write().await = Some(stored);
    }

    /// The latest snapshot, if one has been fetched.
    pub async fn latest(&self) -> Option<StoredSnapshot> {
        self.inner.read().await.clone()
    }
}

/// Fetches snapshots from the backend into a [`SnapshotStore`].
pub struct SituationPoller {
    client: MaritimeApiClient,
    store: SnapshotStore,
    interval: Duration,
}

/// Handle to a running poller. Dropping the handle also stops the poller,
/// without waiting for it.
pub struct PollerHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Signal the poller to stop and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Poller task ended abnormally");
        }
    }
}

impl SituationPoller {
    pub fn new(client: MaritimeApiClient, store: SnapshotStore, interval: Duration) -> Self {
        Self {
            client,
            store,
            interval,
        }
    }

    /// Fetch once and store the result.
    ///
    /// On failure the previously stored snapshot is kept.
    pub async fn poll_once(&self) -> Result<(), BackendError> {
        match self.client.fetch_snapshot().await {
            Ok(snapshot) => {
                self.store.put(snapshot, Utc::now()).await;
                Ok(())
            }
            Err(BackendError::Unauthorized { endpoint }) => {
                warn!(
                    endpoint = %endpoint,
                    "Backend rejected the token; re-authentication required, keeping previous snapshot"
                );
                Err(BackendError::Unauthorized { endpoint })
            }
            Err(e) => {
                warn!(error = %e, "Snapshot fetch failed, keeping previous snapshot");
                Err(e)
            }
        }
    }

    /// Run until shut down. The first fetch happens immediately.
    pub fn spawn(self) -> PollerHandle {
        let (stop, mut stopped) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(
                backend = %self.client.base_url(),
                interval_secs = self.interval.as_secs(),
                "Snapshot poller started"
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // Errors are logged in poll_once; the next tick retries.
                        let _ = self.poll_once().await;
                    }
                    _ = stopped.changed() => break,
                }
            }

            info!("Snapshot poller stopped");
        });

        PollerHandle { stop, task }
    }
}
