//! Snapshot poller
//!
//! One background task ticks on a fixed interval, asks the source for a
//! snapshot and publishes it on a watch channel. Consumers only ever see the
//! newest snapshot. A slow fetch delays the next one instead of queueing
//! ticks behind it, and stopping the monitor abandons a fetch in flight.

use crate::error::MonitorError;
use crate::source::SnapshotSource;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use topomap_core::{Node, Snapshot};

/// Polling interval used when none is configured
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    pub interval: Duration,
    /// Give up on a fetch after this long; `None` waits indefinitely
    pub fetch_timeout: Option<Duration>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            fetch_timeout: None,
        }
    }
}

impl MonitorConfig {
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }
}

/// Counters kept by the polling task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub fetched: u64,
    pub failed: u64,
    pub last_error: Option<String>,
}

/// Handle to a running poller
///
/// Dropping the handle stops the task as well; [`Monitor::stop`] also waits
/// for it to finish.
#[derive(Debug)]
pub struct Monitor {
    snapshots: watch::Receiver<Option<Snapshot>>,
    nodes: watch::Sender<Arc<Vec<Node>>>,
    shutdown: watch::Sender<bool>,
    stats: Arc<Mutex<MonitorStats>>,
    task: JoinHandle<()>,
}

impl Monitor {
    /// Start polling `source` for `nodes`
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(source: Arc<dyn SnapshotSource>, nodes: Vec<Node>, config: MonitorConfig) -> Self {
        let (snapshot_tx, snapshots) = watch::channel(None);
        let (nodes, nodes_rx) = watch::channel(Arc::new(nodes));
        let (shutdown, shutdown_rx) = watch::channel(false);
        let stats = Arc::new(Mutex::new(MonitorStats::default()));

        tracing::info!(interval = ?config.interval, "monitor started");
        let task = tokio::spawn(poll_loop(
            source,
            config,
            nodes_rx,
            snapshot_tx,
            shutdown_rx,
            Arc::clone(&stats),
        ));

        Self {
            snapshots,
            nodes,
            shutdown,
            stats,
            task,
        }
    }

    /// Most recent snapshot, if any fetch has succeeded yet
    #[must_use]
    pub fn latest(&self) -> Option<Snapshot> {
        self.snapshots.borrow().clone()
    }

    /// Wait for the next snapshot newer than the last one seen
    ///
    /// # Errors
    /// - `MonitorError::Closed` once the poller has stopped
    pub async fn changed(&mut self) -> Result<Snapshot, MonitorError> {
        loop {
            self.snapshots.changed().await.map_err(|_| MonitorError::Closed)?;
            if let Some(snapshot) = self.snapshots.borrow_and_update().clone() {
                return Ok(snapshot);
            }
        }
    }

    /// Replace the node list used from the next fetch on
    pub fn set_nodes(&self, nodes: Vec<Node>) {
        self.nodes.send_replace(Arc::new(nodes));
    }

    #[must_use]
    pub fn stats(&self) -> MonitorStats {
        self.stats.lock().clone()
    }

    /// Stop polling and wait for the task to exit
    pub async fn stop(self) -> MonitorStats {
        self.shutdown.send_replace(true);
        if let Err(err) = self.task.await {
            tracing::error!(error = %err, "monitor task failed");
        }
        let stats = self.stats.lock().clone();
        tracing::info!(fetched = stats.fetched, failed = stats.failed, "monitor stopped");
        stats
    }
}

async fn poll_loop(
    source: Arc<dyn SnapshotSource>,
    config: MonitorConfig,
    nodes: watch::Receiver<Arc<Vec<Node>>>,
    snapshots: watch::Sender<Option<Snapshot>>,
    mut shutdown: watch::Receiver<bool>,
    stats: Arc<Mutex<MonitorStats>>,
) {
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
        }

        let current = Arc::clone(&nodes.borrow());
        let result = tokio::select! {
            biased;
            _ = shutdown.changed() => {
                tracing::debug!("fetch abandoned on shutdown");
                break;
            }
            result = fetch(source.as_ref(), &current, config.fetch_timeout) => result,
        };

        match result {
            Ok(snapshot) => {
                tracing::debug!(entries = snapshot.nodes.len(), updated = %snapshot.updated, "snapshot fetched");
                stats.lock().fetched += 1;
                snapshots.send_replace(Some(snapshot));
            }
            Err(err) => {
                tracing::warn!(error = %err, "snapshot fetch failed");
                let mut stats = stats.lock();
                stats.failed += 1;
                stats.last_error = Some(err.to_string());
            }
        }
    }
}

async fn fetch(
    source: &dyn SnapshotSource,
    nodes: &[Node],
    timeout: Option<Duration>,
) -> Result<Snapshot, MonitorError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, source.fetch(nodes))
            .await
            .map_err(|_| MonitorError::Timeout(limit))?,
        None => source.fetch(nodes).await,
    }
}
