//! Snapshot sources
//!
//! A source produces one [`Snapshot`] per call. The poller calls it once per
//! tick and never overlaps two calls.

use crate::error::MonitorError;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::Path;
use topomap_core::{Node, NodeId, Snapshot};

/// Producer of monitoring snapshots
#[async_trait::async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch the current state of `nodes`
    async fn fetch(&self, nodes: &[Node]) -> Result<Snapshot, MonitorError>;
}

/// Always returns the same snapshot
#[derive(Debug, Clone)]
pub struct StaticSource {
    snapshot: Snapshot,
}

impl StaticSource {
    #[must_use]
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait::async_trait]
impl SnapshotSource for StaticSource {
    async fn fetch(&self, _nodes: &[Node]) -> Result<Snapshot, MonitorError> {
        Ok(self.snapshot.clone())
    }
}

/// Cycles through recorded snapshots, restricted to the configured nodes
#[derive(Debug)]
pub struct ReplaySource {
    snapshots: Vec<Snapshot>,
    cursor: Mutex<usize>,
}

impl ReplaySource {
    /// # Errors
    /// - `MonitorError::Empty` if `snapshots` is empty
    pub fn new(snapshots: Vec<Snapshot>) -> Result<Self, MonitorError> {
        if snapshots.is_empty() {
            return Err(MonitorError::Empty);
        }
        Ok(Self {
            snapshots,
            cursor: Mutex::new(0),
        })
    }

    /// Load a JSON array of snapshots; a single snapshot object is accepted too
    ///
    /// # Errors
    /// - `MonitorError::Io` if the file cannot be read
    /// - `MonitorError::Parse` if it holds neither form
    /// - `MonitorError::Empty` if the array is empty
    pub fn from_file(path: &Path) -> Result<Self, MonitorError> {
        let raw = std::fs::read_to_string(path).map_err(|source| MonitorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshots = parse_snapshots(&raw).map_err(|e| MonitorError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), snapshots = snapshots.len(), "replay loaded");
        Self::new(snapshots)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

fn parse_snapshots(raw: &str) -> Result<Vec<Snapshot>, serde_json::Error> {
    serde_json::from_str::<Vec<Snapshot>>(raw).or_else(|many| {
        serde_json::from_str::<Snapshot>(raw)
            .map(|one| vec![one])
            .map_err(|_| many)
    })
}

#[async_trait::async_trait]
impl SnapshotSource for ReplaySource {
    async fn fetch(&self, nodes: &[Node]) -> Result<Snapshot, MonitorError> {
        let index = {
            let mut cursor = self.cursor.lock();
            let index = *cursor % self.snapshots.len();
            *cursor = cursor.wrapping_add(1);
            index
        };
        let mut snapshot = self.snapshots[index].clone();
        if !nodes.is_empty() {
            let configured: HashSet<&NodeId> = nodes.iter().map(|n| &n.id).collect();
            snapshot.nodes.retain(|entry| configured.contains(&entry.id));
        }
        Ok(snapshot)
    }
}
