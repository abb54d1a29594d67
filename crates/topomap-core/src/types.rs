//! Core types for the topology map
//!
//! Defines the data shared by every component:
//! - Node identity and host metadata
//! - Live monitoring state attached to nodes
//! - Canvas settings and the persisted topology document
//! - Monitoring snapshots

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Stable node identifier
///
/// Ids are opaque strings chosen by whoever created the node. An empty id in
/// a parent reference means "no parent".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Generate a fresh id
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("node_{}", uuid::Uuid::new_v4().simple()))
    }

    /// Borrow the raw id
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this id is blank and therefore refers to nothing
    #[inline]
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Monitoring-owned state of a node. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveState {
    /// Liveness from the latest snapshot; `None` until the first one arrives
    pub status: Option<bool>,
    /// Parent link the monitor reports as in effect
    pub active_parent_id: Option<NodeId>,
}

/// A monitored host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_type: Option<String>,
    #[serde(default)]
    pub primary_parent_id: Option<NodeId>,
    #[serde(default)]
    pub secondary_parent_id: Option<NodeId>,
    /// Explicit horizontal position in normalized space
    #[serde(default)]
    pub x: Option<f64>,
    /// Explicit vertical position in normalized space
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(skip)]
    pub live: LiveState,
    /// Fields this crate does not interpret (SSH settings and the like),
    /// kept so a load/save cycle is lossless
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Node {
    /// Create a root node with no position
    #[must_use]
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: String::new(),
            port: None,
            icon: None,
            icon_type: None,
            primary_parent_id: None,
            secondary_parent_id: None,
            x: None,
            y: None,
            live: LiveState::default(),
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    #[must_use]
    pub fn with_primary_parent(mut self, parent: impl Into<NodeId>) -> Self {
        self.primary_parent_id = Some(parent.into());
        self
    }

    #[must_use]
    pub fn with_secondary_parent(mut self, parent: impl Into<NodeId>) -> Self {
        self.secondary_parent_id = Some(parent.into());
        self
    }

    #[must_use]
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: bool) -> Self {
        self.live.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_active_parent(mut self, parent: impl Into<NodeId>) -> Self {
        self.live.active_parent_id = Some(parent.into());
        self
    }

    /// Drop the explicit position so layout computes a default again
    pub fn clear_position(&mut self) {
        self.x = None;
        self.y = None;
    }

    /// Whether both coordinates were set explicitly
    #[inline]
    #[must_use]
    pub fn has_position(&self) -> bool {
        self.x.is_some() && self.y.is_some()
    }
}

/// User-supplied fields for creating or editing a node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDraft {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub icon_type: Option<String>,
    #[serde(default)]
    pub primary_parent_id: Option<NodeId>,
    #[serde(default)]
    pub secondary_parent_id: Option<NodeId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeDraft {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    #[must_use]
    pub fn with_parents(mut self, primary: Option<NodeId>, secondary: Option<NodeId>) -> Self {
        self.primary_parent_id = primary;
        self.secondary_parent_id = secondary;
        self
    }
}

/// Canvas settings persisted alongside the nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub show_grid: bool,
    pub grid_size: u32,
    pub snap_to_grid: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_grid: true,
            grid_size: 100,
            snap_to_grid: true,
        }
    }
}

/// Everything the configuration collaborator persists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyDocument {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl TopologyDocument {
    #[must_use]
    pub fn new(settings: Settings, nodes: Vec<Node>) -> Self {
        Self { settings, nodes }
    }
}

/// Per-node entry of a monitoring snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotNode {
    pub id: NodeId,
    /// Absent until the monitor has observed the host
    #[serde(default)]
    pub status: Option<bool>,
    #[serde(default)]
    pub active_parent_id: Option<NodeId>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

impl SnapshotNode {
    #[must_use]
    pub fn new(id: impl Into<NodeId>, status: bool) -> Self {
        Self {
            id: id.into(),
            status: Some(status),
            active_parent_id: None,
            x: None,
            y: None,
        }
    }

    #[must_use]
    pub fn with_active_parent(mut self, parent: impl Into<NodeId>) -> Self {
        self.active_parent_id = Some(parent.into());
        self
    }
}

/// One tick of the external monitor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Monitor-formatted timestamp, shown verbatim as "last update"
    #[serde(default)]
    pub updated: String,
    #[serde(default)]
    pub nodes: Vec<SnapshotNode>,
}
