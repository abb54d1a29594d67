//! Node store
//!
//! The single owner of configured nodes. Layout, monitoring and persistence
//! all read from here; snapshots only ever update live state and, for nodes
//! the user never placed, positions.

use crate::discovery::DiscoveredHost;
use crate::error::TopologyError;
use crate::types::{Node, NodeDraft, NodeId, Settings, Snapshot, TopologyDocument};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Columns of the placement grid used for newly created nodes
const AUTO_COLUMNS: usize = 10;

/// Outcome of applying a snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotReport {
    /// Nodes whose live state was refreshed
    pub updated: Vec<NodeId>,
    /// Snapshot entries with no configured node
    pub unknown: Vec<NodeId>,
}

/// Ordered, id-keyed collection of nodes
#[derive(Debug, Clone, Default)]
pub struct NodeStore {
    nodes: IndexMap<NodeId, Node>,
}

impl NodeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a configured list, keeping the first of any duplicate ids
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Self {
        let mut store = Self::new();
        for node in nodes {
            if store.nodes.contains_key(&node.id) {
                tracing::warn!(node = %node.id, "duplicate node id, keeping the first");
                continue;
            }
            store.nodes.insert(node.id.clone(), node);
        }
        store
    }

    /// Build from a configured list, refusing duplicate ids
    ///
    /// # Errors
    /// - `TopologyError::DuplicateNode` for the first repeated id
    pub fn try_from_nodes(nodes: impl IntoIterator<Item = Node>) -> Result<Self, TopologyError> {
        let mut store = Self::new();
        for node in nodes {
            if store.nodes.contains_key(&node.id) {
                return Err(TopologyError::DuplicateNode(node.id));
            }
            store.nodes.insert(node.id.clone(), node);
        }
        Ok(store)
    }

    #[must_use]
    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in configuration order
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Create a node from user input
    ///
    /// # Errors
    /// - `TopologyError::EmptyName` if the draft has a blank name
    pub fn add(&mut self, draft: NodeDraft) -> Result<NodeId, TopologyError> {
        if draft.name.trim().is_empty() {
            return Err(TopologyError::EmptyName);
        }
        let id = NodeId::generate();
        let (x, y) = auto_position(self.len());
        let mut node = Node::new(id.clone(), String::new()).with_position(x, y);
        apply_draft(&mut node, draft);
        tracing::info!(node = %id, name = %node.name, "node added");
        self.nodes.insert(id.clone(), node);
        Ok(id)
    }

    /// Replace metadata and parents, keeping position and live state
    ///
    /// # Errors
    /// - `TopologyError::EmptyName` if the draft has a blank name
    /// - `TopologyError::NodeNotFound` if `id` is not in the store
    pub fn edit(&mut self, id: &NodeId, draft: NodeDraft) -> Result<(), TopologyError> {
        if draft.name.trim().is_empty() {
            return Err(TopologyError::EmptyName);
        }
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| TopologyError::NodeNotFound(id.clone()))?;
        apply_draft(node, draft);
        tracing::info!(node = %id, "node edited");
        Ok(())
    }

    /// Delete a node; children pointing at it become roots on the next layout
    ///
    /// # Errors
    /// - `TopologyError::NodeNotFound` if `id` is not in the store
    pub fn remove(&mut self, id: &NodeId) -> Result<Node, TopologyError> {
        let node = self
            .nodes
            .shift_remove(id)
            .ok_or_else(|| TopologyError::NodeNotFound(id.clone()))?;
        tracing::info!(node = %id, "node removed");
        Ok(node)
    }

    /// Pin a node to an explicit position
    ///
    /// # Errors
    /// - `TopologyError::NodeNotFound` if `id` is not in the store
    /// - `TopologyError::InvalidCoordinate` if either value is not finite
    pub fn set_position(&mut self, id: &NodeId, x: f64, y: f64) -> Result<(), TopologyError> {
        let p = crate::transform::NormalizedPoint::new(x, y).checked()?;
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| TopologyError::NodeNotFound(id.clone()))?;
        node.x = Some(p.x);
        node.y = Some(p.y);
        Ok(())
    }

    /// Return a node to layout-computed placement
    ///
    /// # Errors
    /// - `TopologyError::NodeNotFound` if `id` is not in the store
    pub fn clear_position(&mut self, id: &NodeId) -> Result<(), TopologyError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| TopologyError::NodeNotFound(id.clone()))?
            .clear_position();
        Ok(())
    }

    /// Copy live state from a monitoring snapshot
    ///
    /// Entries for unknown ids are skipped, and an entry without a status
    /// leaves the last observed one in place. Snapshot positions are only
    /// adopted by nodes that have no explicit position of their own.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) -> SnapshotReport {
        let mut report = SnapshotReport::default();
        for entry in &snapshot.nodes {
            let Some(node) = self.nodes.get_mut(&entry.id) else {
                tracing::debug!(node = %entry.id, "snapshot entry for unknown node");
                report.unknown.push(entry.id.clone());
                continue;
            };
            if entry.status.is_some() {
                node.live.status = entry.status;
            }
            node.live.active_parent_id = entry.active_parent_id.clone().filter(|p| !p.is_blank());
            if !node.has_position() {
                if let (Some(x), Some(y)) = (entry.x, entry.y) {
                    if x.is_finite() && y.is_finite() {
                        node.x = Some(x);
                        node.y = Some(y);
                    }
                }
            }
            report.updated.push(entry.id.clone());
        }
        report
    }

    /// Addresses already in use, for filtering discovery results
    #[must_use]
    pub fn addresses(&self) -> HashSet<&str> {
        self.nodes
            .values()
            .map(|n| n.address.as_str())
            .filter(|a| !a.is_empty())
            .collect()
    }

    /// Create nodes for discovered hosts whose address is not configured yet
    pub fn add_discovered(&mut self, hosts: &[DiscoveredHost]) -> Vec<NodeId> {
        let known: HashSet<String> = self.addresses().into_iter().map(str::to_owned).collect();
        let mut seen = HashSet::new();
        let mut added = Vec::new();
        for host in hosts {
            if known.contains(&host.ip) || !seen.insert(host.ip.as_str()) {
                continue;
            }
            let id = NodeId::generate();
            let (x, y) = auto_position(self.len());
            let mut node = Node::new(id.clone(), format!("Device {}", host.ip))
                .with_address(host.ip.clone())
                .with_position(x, y);
            if let Some(mac) = &host.mac {
                node.extra.insert("mac".to_string(), mac.clone().into());
            }
            self.nodes.insert(id.clone(), node);
            added.push(id);
        }
        tracing::info!(candidates = hosts.len(), added = added.len(), "discovered hosts merged");
        added
    }

    /// Persistable view of the store
    #[must_use]
    pub fn to_document(&self, settings: Settings) -> TopologyDocument {
        TopologyDocument::new(settings, self.nodes.values().cloned().collect())
    }
}

/// Position of the `n`th node created without one
#[must_use]
pub fn auto_position(n: usize) -> (f64, f64) {
    #[allow(clippy::cast_precision_loss)]
    let (col, row) = ((n % AUTO_COLUMNS) as f64, (n / AUTO_COLUMNS) as f64);
    (col * 10.0 + 5.0, row * 15.0 + 10.0)
}

fn apply_draft(node: &mut Node, draft: NodeDraft) {
    node.name = draft.name.trim().to_string();
    node.address = draft.address.trim().to_string();
    node.port = draft.port;
    node.icon = draft.icon;
    node.icon_type = draft.icon_type;
    node.primary_parent_id = draft.primary_parent_id.filter(|p| !p.is_blank());
    node.secondary_parent_id = draft.secondary_parent_id.filter(|p| !p.is_blank());
    node.extra.extend(draft.extra);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SnapshotNode;

    fn store() -> NodeStore {
        NodeStore::from_nodes(vec![
            Node::new("a", "Router").with_address("10.0.0.1"),
            Node::new("b", "Switch").with_primary_parent("a").with_position(40.0, 40.0),
        ])
    }

    #[test]
    fn duplicates_keep_first() {
        let s = NodeStore::from_nodes(vec![Node::new("a", "one"), Node::new("a", "two")]);
        assert_eq!(s.len(), 1);
        assert_eq!(s.get(&NodeId::from("a")).unwrap().name, "one");

        let err = NodeStore::try_from_nodes(vec![Node::new("a", "one"), Node::new("a", "two")]).unwrap_err();
        assert_eq!(err, TopologyError::DuplicateNode(NodeId::from("a")));
    }

    #[test]
    fn add_assigns_id_and_auto_position() {
        let mut s = store();
        let id = s.add(NodeDraft::named("  Printer ").with_address("10.0.0.9")).unwrap();
        let node = s.get(&id).unwrap();
        assert!(id.as_str().starts_with("node_"));
        assert_eq!(node.name, "Printer");
        assert_eq!((node.x, node.y), (Some(25.0), Some(10.0)));
        assert_eq!(s.iter().last().unwrap().id, id);
    }

    #[test]
    fn add_rejects_blank_name() {
        let mut s = store();
        assert_eq!(s.add(NodeDraft::named("   ")), Err(TopologyError::EmptyName));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn auto_position_wraps_rows() {
        assert_eq!(auto_position(0), (5.0, 10.0));
        assert_eq!(auto_position(9), (95.0, 10.0));
        assert_eq!(auto_position(10), (5.0, 25.0));
        assert_eq!(auto_position(23), (35.0, 40.0));
    }

    #[test]
    fn edit_keeps_position_and_live_state() {
        let mut s = store();
        let id = NodeId::from("b");
        s.get_mut(&id).unwrap().live.status = Some(true);
        s.edit(&id, NodeDraft::named("Core switch").with_parents(Some(NodeId::from("")), None))
            .unwrap();
        let node = s.get(&id).unwrap();
        assert_eq!(node.name, "Core switch");
        assert_eq!(node.primary_parent_id, None);
        assert_eq!((node.x, node.y), (Some(40.0), Some(40.0)));
        assert_eq!(node.live.status, Some(true));

        let missing = s.edit(&NodeId::from("zz"), NodeDraft::named("x"));
        assert_eq!(missing, Err(TopologyError::NodeNotFound(NodeId::from("zz"))));
    }

    #[test]
    fn remove_keeps_order_of_rest() {
        let mut s = NodeStore::from_nodes(vec![Node::new("a", "A"), Node::new("b", "B"), Node::new("c", "C")]);
        s.remove(&NodeId::from("b")).unwrap();
        let ids: Vec<&str> = s.ids().map(NodeId::as_str).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!(s.remove(&NodeId::from("b")).is_err());
    }

    #[test]
    fn snapshot_updates_live_state_only_for_known_nodes() {
        let mut s = store();
        let mut a = SnapshotNode::new("a", true);
        a.x = Some(70.0);
        a.y = Some(20.0);
        let mut b = SnapshotNode::new("b", false).with_active_parent("a");
        b.x = Some(1.0);
        b.y = Some(1.0);
        let snap = Snapshot {
            updated: "now".into(),
            nodes: vec![a, b, SnapshotNode::new("ghost", true)],
        };
        let report = s.apply_snapshot(&snap);
        assert_eq!(report.updated, vec![NodeId::from("a"), NodeId::from("b")]);
        assert_eq!(report.unknown, vec![NodeId::from("ghost")]);

        let a = s.get(&NodeId::from("a")).unwrap();
        assert_eq!(a.live.status, Some(true));
        assert_eq!((a.x, a.y), (Some(70.0), Some(20.0)));

        let b = s.get(&NodeId::from("b")).unwrap();
        assert_eq!(b.live.status, Some(false));
        assert_eq!(b.live.active_parent_id, Some(NodeId::from("a")));
        assert_eq!((b.x, b.y), (Some(40.0), Some(40.0)));
        assert!(!s.contains(&NodeId::from("ghost")));
    }

    #[test]
    fn snapshot_entry_without_status_keeps_last_observation() {
        let mut s = store();
        let a = NodeId::from("a");
        s.apply_snapshot(&Snapshot {
            updated: "t1".into(),
            nodes: vec![SnapshotNode::new("a", true)],
        });
        let mut silent = SnapshotNode::new("a", false);
        silent.status = None;
        let report = s.apply_snapshot(&Snapshot {
            updated: "t2".into(),
            nodes: vec![silent],
        });
        assert_eq!(report.updated, vec![a.clone()]);
        assert_eq!(s.get(&a).unwrap().live.status, Some(true));
    }

    #[test]
    fn set_position_rejects_nan() {
        let mut s = store();
        assert!(s.set_position(&NodeId::from("a"), f64::NAN, 1.0).is_err());
        s.set_position(&NodeId::from("a"), 33.0, 44.0).unwrap();
        assert!(s.get(&NodeId::from("a")).unwrap().has_position());
        s.clear_position(&NodeId::from("a")).unwrap();
        assert!(!s.get(&NodeId::from("a")).unwrap().has_position());
    }

    #[test]
    fn discovered_hosts_skip_configured_addresses() {
        let mut s = store();
        let hosts = vec![
            DiscoveredHost::new("10.0.0.1"),
            DiscoveredHost::new("10.0.0.7").with_mac("aa:bb:cc:dd:ee:ff"),
            DiscoveredHost::new("10.0.0.7"),
        ];
        let added = s.add_discovered(&hosts);
        assert_eq!(added.len(), 1);
        let node = s.get(&added[0]).unwrap();
        assert_eq!(node.name, "Device 10.0.0.7");
        assert_eq!(node.address, "10.0.0.7");
        assert_eq!(node.extra.get("mac").and_then(|v| v.as_str()), Some("aa:bb:cc:dd:ee:ff"));
        assert_eq!((node.x, node.y), (Some(25.0), Some(10.0)));
    }
}
