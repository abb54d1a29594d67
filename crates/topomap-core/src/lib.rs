//! topomap core - monitored host topology
//!
//! Everything the map needs short of I/O:
//! - Levels and default positions from primary-parent links
//! - Screen, world and normalized coordinate spaces with pan and zoom
//! - Grid snapping and cell labels
//! - Per-node uptime tracking
//! - Drag and pan gestures, committed through a persistence seam
//!
//! # Example
//!
//! ```rust,ignore
//! use topomap_core::prelude::*;
//!
//! let doc = TopologyDocument::new(Settings::default(), vec![
//!     Node::new("gw", "Gateway"),
//!     Node::new("sw", "Switch").with_primary_parent("gw"),
//! ]);
//! let store = MemoryConfigStore::new(doc.clone());
//! let engine = TopologyEngine::new(doc, Box::new(store), CanvasSize::default());
//!
//! for node in engine.render(chrono::Utc::now()) {
//!     println!("{} level {} at {}", node.name, node.level, node.grid_cell);
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod discovery;
pub mod engine;
pub mod error;
pub mod interaction;
pub mod layout;
pub mod persist;
pub mod store;
pub mod transform;
pub mod types;
pub mod uptime;

// Re-exports for convenience
pub use discovery::{merge_scan_with_arp, parse_arp_table, ArpEntry, DiscoveredHost};
pub use engine::{AnnotatedNode, HostStatus, PositionChange, TopologyEngine};
pub use error::{Axis, TopologyError};
pub use interaction::{DragRelease, Gesture, InteractionState, PointerButton, PointerOutcome};
pub use layout::{compute_layout, default_y, is_failover, Hierarchy, Layout, LayoutIssue, Placement};
pub use persist::{ConfigStore, MemoryConfigStore, PersistError};
pub use store::{auto_position, NodeStore, SnapshotReport};
pub use transform::{
    clamp_normalized, grid_cell, normalized_to_world, snap_to_grid, world_to_normalized, CanvasSize,
    GridCell, NormalizedPoint, ScreenPoint, ViewportTransform, WorldPoint,
};
pub use types::{
    LiveState, Node, NodeDraft, NodeId, Settings, Snapshot, SnapshotNode, TopologyDocument,
};
pub use uptime::{format_duration, LinkState, Transition, UptimeEntry, UptimeTracker};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with topomap core
    pub use crate::{
        AnnotatedNode, CanvasSize, ConfigStore, MemoryConfigStore, Node, NodeDraft, NodeId,
        PointerButton, ScreenPoint, Settings, Snapshot, SnapshotNode, TopologyDocument,
        TopologyEngine, TopologyError,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
