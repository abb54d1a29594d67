//! Topology engine
//!
//! Ties the node store, layout, uptime tracking and the interaction state
//! together behind one `&mut self` API. Every handler runs to completion;
//! committed changes are handed to the [`ConfigStore`] straight away.

use crate::discovery::DiscoveredHost;
use crate::error::TopologyError;
use crate::interaction::{InteractionState, PointerButton, PointerOutcome};
use crate::layout::{compute_layout, Layout};
use crate::persist::{ConfigStore, PersistError};
use crate::store::{NodeStore, SnapshotReport};
use crate::transform::{grid_cell, CanvasSize, GridCell, NormalizedPoint, ScreenPoint};
use crate::types::{NodeDraft, NodeId, Settings, Snapshot, TopologyDocument};
use crate::uptime::{LinkState, UptimeTracker};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A node as it should be drawn
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedNode {
    pub id: NodeId,
    pub name: String,
    pub address: String,
    pub level: u32,
    pub x: f64,
    pub y: f64,
    pub primary_parent_id: Option<NodeId>,
    pub secondary_parent_id: Option<NodeId>,
    pub active_parent_id: Option<NodeId>,
    pub failover: bool,
    pub status: Option<bool>,
    pub link_state: LinkState,
    pub uptime: Option<String>,
    pub grid_cell: GridCell,
    pub dragging: bool,
}

/// Row of the host list panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostStatus {
    pub id: NodeId,
    pub name: String,
    pub address: String,
    pub link_state: LinkState,
    pub uptime: Option<String>,
}

/// A committed node move
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionChange {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    /// Whether the document reached the config store
    pub persisted: bool,
}

/// Owns the topology and everything derived from it
pub struct TopologyEngine {
    settings: Settings,
    store: NodeStore,
    uptime: UptimeTracker,
    interaction: InteractionState,
    persistence: Box<dyn ConfigStore + Send>,
    last_update: Option<String>,
}

impl std::fmt::Debug for TopologyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopologyEngine")
            .field("settings", &self.settings)
            .field("nodes", &self.store.len())
            .field("tracked", &self.uptime.len())
            .field("gesture", self.interaction.gesture())
            .finish_non_exhaustive()
    }
}

impl TopologyEngine {
    /// Start from an already loaded document
    pub fn new(
        document: TopologyDocument,
        persistence: Box<dyn ConfigStore + Send>,
        canvas: CanvasSize,
    ) -> Self {
        let store = NodeStore::from_nodes(document.nodes);
        tracing::info!(nodes = store.len(), "topology engine ready");
        Self {
            settings: document.settings,
            store,
            uptime: UptimeTracker::new(),
            interaction: InteractionState::new(canvas),
            persistence,
            last_update: None,
        }
    }

    /// Load the document from `persistence` and start from it
    ///
    /// # Errors
    /// - `PersistError` if the store cannot supply a document
    pub fn load(mut persistence: Box<dyn ConfigStore + Send>, canvas: CanvasSize) -> Result<Self, PersistError> {
        let document = persistence.load()?;
        Ok(Self::new(document, persistence, canvas))
    }

    #[must_use]
    pub fn settings(&self) -> Settings {
        self.settings
    }

    #[must_use]
    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    #[must_use]
    pub fn uptime(&self) -> &UptimeTracker {
        &self.uptime
    }

    #[must_use]
    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    /// Timestamp string of the last applied snapshot
    #[must_use]
    pub fn last_update(&self) -> Option<&str> {
        self.last_update.as_deref()
    }

    /// Current persistable document
    #[must_use]
    pub fn document(&self) -> TopologyDocument {
        self.store.to_document(self.settings)
    }

    #[must_use]
    pub fn layout(&self) -> Layout {
        compute_layout(self.store.iter())
    }

    /// Merge a monitoring snapshot into live state
    #[tracing::instrument(skip(self, snapshot), fields(entries = snapshot.nodes.len()))]
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot, now: DateTime<Utc>) -> SnapshotReport {
        let report = self.store.apply_snapshot(snapshot);
        for entry in &snapshot.nodes {
            if let Some(status) = entry.status {
                if self.store.contains(&entry.id) {
                    self.uptime.observe(&entry.id, status, now);
                }
            }
        }
        self.last_update = Some(snapshot.updated.clone());
        tracing::debug!(updated = report.updated.len(), unknown = report.unknown.len(), "snapshot applied");
        report
    }

    /// Everything needed to draw the map, in configuration order
    #[must_use]
    pub fn render(&self, now: DateTime<Utc>) -> Vec<AnnotatedNode> {
        let layout = self.layout();
        layout
            .placements
            .into_iter()
            .filter_map(|placement| {
                let node = self.store.get(&placement.id)?;
                let transient = self.interaction.transient_position(&placement.id);
                let (x, y) = transient.map_or((placement.x, placement.y), |p| (p.x, p.y));
                Some(AnnotatedNode {
                    name: node.name.clone(),
                    address: node.address.clone(),
                    level: placement.level,
                    x,
                    y,
                    failover: placement.failover,
                    status: node.live.status,
                    link_state: self.uptime.state(&placement.id),
                    uptime: self.uptime.uptime(&placement.id, now),
                    grid_cell: grid_cell(x, y),
                    dragging: self.interaction.dragged_node() == Some(&placement.id),
                    primary_parent_id: placement.primary_parent_id,
                    secondary_parent_id: placement.secondary_parent_id,
                    active_parent_id: placement.active_parent_id,
                    id: placement.id,
                })
            })
            .collect()
    }

    /// Host list, hosts not known to be up first and then by name
    #[must_use]
    pub fn host_list(&self, now: DateTime<Utc>) -> Vec<HostStatus> {
        let mut hosts: Vec<HostStatus> = self
            .store
            .iter()
            .map(|node| HostStatus {
                id: node.id.clone(),
                name: node.name.clone(),
                address: node.address.clone(),
                link_state: self.uptime.state(&node.id),
                uptime: self.uptime.uptime(&node.id, now),
            })
            .collect();
        hosts.sort_by(|a, b| {
            let up = |h: &HostStatus| h.link_state == LinkState::Up;
            up(a).cmp(&up(b)).then_with(|| a.name.cmp(&b.name))
        });
        hosts
    }

    /// Press on empty canvas
    pub fn press_canvas(&mut self, pointer: ScreenPoint, button: PointerButton) -> bool {
        self.interaction.press_canvas(pointer, button)
    }

    /// Press on a node; the drag starts from where the node is drawn now
    ///
    /// # Errors
    /// - `TopologyError::NodeNotFound` if `id` is not in the store
    /// - `TopologyError::InvalidCoordinate` if the pointer is not finite
    #[tracing::instrument(skip(self))]
    pub fn press_node(&mut self, id: &NodeId, pointer: ScreenPoint, button: PointerButton) -> Result<bool, TopologyError> {
        let layout = self.layout();
        let placement = layout
            .get(id)
            .ok_or_else(|| TopologyError::NodeNotFound(id.clone()))?;
        let position = NormalizedPoint::new(placement.x, placement.y);
        self.interaction.press_node(id.clone(), position, pointer, button)
    }

    /// Pointer moved; snapping follows the current setting
    ///
    /// # Errors
    /// - `TopologyError::InvalidCoordinate` if the move cannot be normalized
    pub fn move_pointer(&mut self, pointer: ScreenPoint) -> Result<PointerOutcome, TopologyError> {
        self.interaction.move_pointer(pointer, self.settings.snap_to_grid)
    }

    /// Pointer released; commits and persists a drag that moved its node
    ///
    /// # Errors
    /// - `TopologyError::NodeNotFound` if the dragged node was removed mid-drag
    #[tracing::instrument(skip(self))]
    pub fn release(&mut self) -> Result<Option<PositionChange>, TopologyError> {
        let Some(release) = self.interaction.release() else {
            return Ok(None);
        };
        self.store.set_position(&release.node, release.to.x, release.to.y)?;
        let persisted = self.persist();
        tracing::info!(node = %release.node, x = release.to.x, y = release.to.y, persisted, "node moved");
        Ok(Some(PositionChange {
            id: release.node,
            x: release.to.x,
            y: release.to.y,
            persisted,
        }))
    }

    /// Abandon the current gesture
    pub fn cancel_gesture(&mut self) {
        self.interaction.cancel();
    }

    pub fn wheel(&mut self, pointer: ScreenPoint, delta_y: f64) {
        self.interaction.wheel(pointer, delta_y);
    }

    pub fn reset_view(&mut self) {
        self.interaction.reset_view();
    }

    /// Canvas container was resized
    pub fn resize(&mut self, canvas: CanvasSize) {
        self.interaction.set_canvas(canvas);
    }

    /// Drop a node's explicit position so the layout places it again
    ///
    /// # Errors
    /// - `TopologyError::NodeNotFound` if `id` is not in the store
    #[tracing::instrument(skip(self))]
    pub fn clear_position(&mut self, id: &NodeId) -> Result<bool, TopologyError> {
        self.store.clear_position(id)?;
        Ok(self.persist())
    }

    /// # Errors
    /// - `TopologyError::EmptyName` if the draft has a blank name
    #[tracing::instrument(skip(self, draft), fields(name = %draft.name))]
    pub fn add_node(&mut self, draft: NodeDraft) -> Result<NodeId, TopologyError> {
        let id = self.store.add(draft)?;
        self.persist();
        Ok(id)
    }

    /// # Errors
    /// - `TopologyError::EmptyName` if the draft has a blank name
    /// - `TopologyError::NodeNotFound` if `id` is not in the store
    #[tracing::instrument(skip(self, draft))]
    pub fn edit_node(&mut self, id: &NodeId, draft: NodeDraft) -> Result<(), TopologyError> {
        self.store.edit(id, draft)?;
        self.persist();
        Ok(())
    }

    /// Delete a node and its uptime history
    ///
    /// # Errors
    /// - `TopologyError::NodeNotFound` if `id` is not in the store
    #[tracing::instrument(skip(self))]
    pub fn remove_node(&mut self, id: &NodeId) -> Result<(), TopologyError> {
        self.store.remove(id)?;
        self.uptime.forget(id);
        if self.interaction.dragged_node() == Some(id) {
            self.interaction.cancel();
        }
        self.persist();
        Ok(())
    }

    /// Add nodes for discovered hosts not configured yet
    #[tracing::instrument(skip(self, hosts), fields(candidates = hosts.len()))]
    pub fn add_discovered(&mut self, hosts: &[DiscoveredHost]) -> Vec<NodeId> {
        let added = self.store.add_discovered(hosts);
        if !added.is_empty() {
            self.persist();
        }
        added
    }

    /// Flip snap-to-grid and persist; returns the new value
    pub fn toggle_snap(&mut self) -> bool {
        self.settings.snap_to_grid = !self.settings.snap_to_grid;
        tracing::info!(snap = self.settings.snap_to_grid, "snap to grid toggled");
        self.persist();
        self.settings.snap_to_grid
    }

    /// Replace the whole topology, keeping live state and uptime for
    /// surviving ids
    #[tracing::instrument(skip(self, document), fields(nodes = document.nodes.len()))]
    pub fn import(&mut self, document: TopologyDocument) -> bool {
        self.interaction.cancel();
        self.settings = document.settings;
        let mut store = NodeStore::from_nodes(document.nodes);
        for node in self.store.iter() {
            if let Some(kept) = store.get_mut(&node.id) {
                kept.live = node.live.clone();
            }
        }
        self.store = store;
        let store = &self.store;
        self.uptime.retain(|id| store.contains(id));
        self.persist()
    }

    fn persist(&mut self) -> bool {
        let document = self.document();
        match self.persistence.save(&document) {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(error = %err, "failed to persist topology");
                false
            }
        }
    }
}
