//! Hierarchy layout
//!
//! Turns an ordered node list with optional parent references into levels and
//! default positions:
//! 1. Parent references are normalized (blank, unknown or self references
//!    become "no parent"; the active parent falls back to the primary)
//! 2. Levels come from a topological walk of the primary-parent forest
//! 3. Nodes without an explicit position are spread evenly within their level
//!
//! Bad references never fail the layout. Primary-parent cycles are broken by
//! treating every cycle member as a root and reporting a [`LayoutIssue`];
//! [`Hierarchy::try_build`] is the strict variant that refuses them instead.

use crate::error::TopologyError;
use crate::types::{Node, NodeId};
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Vertical position of level 0 when there is more than one level
pub const ROOT_Y: f64 = 85.0;
/// Vertical distance between level 0 and the deepest level
pub const LEVEL_SPAN_Y: f64 = 70.0;
/// Vertical position of every node when all nodes are roots
pub const FLAT_Y: f64 = 50.0;

/// Something the layout had to paper over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutIssue {
    /// Primary-parent links loop; members are laid out as roots
    Cycle { members: Vec<NodeId> },
    /// A parent reference points at a node that does not exist
    UnresolvedParent { node: NodeId, parent: NodeId },
    /// The monitor reported an active parent that is neither the primary nor
    /// the secondary parent; the primary is used instead
    StrayActiveParent { node: NodeId, parent: NodeId },
}

/// Resolved parent links of one node, as indices into the input order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Links {
    primary: Option<usize>,
    secondary: Option<usize>,
    active: Option<usize>,
}

/// Normalized parent links and levels for an ordered node list
#[derive(Debug, Clone)]
pub struct Hierarchy {
    ids: Vec<NodeId>,
    links: Vec<Links>,
    levels: Vec<u32>,
    issues: Vec<LayoutIssue>,
}

impl Hierarchy {
    /// Build the hierarchy, degrading on bad input
    pub fn build<'a, I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = &'a Node>,
    {
        let nodes: Vec<&Node> = nodes.into_iter().collect();
        let index = index_by_id(&nodes);
        let mut issues = Vec::new();

        let links: Vec<Links> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| resolve_links(i, node, &index, &mut issues))
            .collect();

        let ids = nodes.iter().map(|n| n.id.clone()).collect();
        let levels = assign_levels(&nodes, &links, &mut issues);

        Self {
            ids,
            links,
            levels,
            issues,
        }
    }

    /// Build the hierarchy, refusing primary-parent cycles
    ///
    /// # Errors
    /// - `TopologyError::CycleDetected` with the members of the first cycle
    pub fn try_build<'a, I>(nodes: I) -> Result<Self, TopologyError>
    where
        I: IntoIterator<Item = &'a Node>,
    {
        let hierarchy = Self::build(nodes);
        let cycle = hierarchy.issues.iter().find_map(|issue| match issue {
            LayoutIssue::Cycle { members } => Some(members.clone()),
            _ => None,
        });
        match cycle {
            Some(members) => Err(TopologyError::CycleDetected { members }),
            None => Ok(hierarchy),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Level of the node at input position `i`
    #[inline]
    #[must_use]
    pub fn level(&self, i: usize) -> Option<u32> {
        self.levels.get(i).copied()
    }

    /// Deepest level, 0 for an empty hierarchy
    #[must_use]
    pub fn max_level(&self) -> u32 {
        self.levels.iter().copied().max().unwrap_or(0)
    }

    #[must_use]
    pub fn issues(&self) -> &[LayoutIssue] {
        &self.issues
    }

    fn id_at(&self, i: Option<usize>) -> Option<NodeId> {
        i.map(|i| self.ids[i].clone())
    }

    /// Input positions grouped by level, each group in input order
    fn by_level(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.max_level() as usize + 1];
        for (i, level) in self.levels.iter().enumerate() {
            groups[*level as usize].push(i);
        }
        groups
    }
}

/// Where and how a node is drawn
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub id: NodeId,
    pub level: u32,
    pub x: f64,
    pub y: f64,
    /// The position came from the node rather than from layout
    pub explicit: bool,
    pub primary_parent_id: Option<NodeId>,
    pub secondary_parent_id: Option<NodeId>,
    pub active_parent_id: Option<NodeId>,
    /// The active link is the secondary one
    pub failover: bool,
}

/// Result of a layout pass, placements in input order
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub placements: Vec<Placement>,
    pub max_level: u32,
    pub issues: Vec<LayoutIssue>,
}

impl Layout {
    #[must_use]
    pub fn get(&self, id: &NodeId) -> Option<&Placement> {
        self.placements.iter().find(|p| &p.id == id)
    }

    /// Placements on one level, in input order
    pub fn level(&self, level: u32) -> impl Iterator<Item = &Placement> {
        self.placements.iter().filter(move |p| p.level == level)
    }
}

/// Lay out `nodes`, computing levels and default positions
pub fn compute_layout<'a, I>(nodes: I) -> Layout
where
    I: IntoIterator<Item = &'a Node>,
{
    let nodes: Vec<&Node> = nodes.into_iter().collect();
    let hierarchy = Hierarchy::build(nodes.iter().copied());
    let max_level = hierarchy.max_level();

    let mut defaults = vec![(0.0, 0.0); nodes.len()];
    for group in hierarchy.by_level() {
        let slots = group.len() as f64 + 1.0;
        for (rank, &i) in group.iter().enumerate() {
            let x = 100.0 * (rank as f64 + 1.0) / slots;
            defaults[i] = (x, default_y(hierarchy.level(i).unwrap_or(0), max_level));
        }
    }

    let placements = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let links = hierarchy.links[i];
            let explicit_x = explicit_coordinate(node, node.x, "x");
            let explicit_y = explicit_coordinate(node, node.y, "y");
            let active = hierarchy.id_at(links.active);
            let secondary = hierarchy.id_at(links.secondary);
            Placement {
                id: node.id.clone(),
                level: hierarchy.level(i).unwrap_or(0),
                x: explicit_x.unwrap_or(defaults[i].0),
                y: explicit_y.unwrap_or(defaults[i].1),
                explicit: explicit_x.is_some() && explicit_y.is_some(),
                primary_parent_id: hierarchy.id_at(links.primary),
                failover: active.is_some() && active == secondary,
                secondary_parent_id: secondary,
                active_parent_id: active,
            }
        })
        .collect();

    tracing::debug!(nodes = nodes.len(), max_level, issues = hierarchy.issues.len(), "layout computed");

    Layout {
        placements,
        max_level,
        issues: hierarchy.issues,
    }
}

/// Default vertical position for `level`
#[must_use]
pub fn default_y(level: u32, max_level: u32) -> f64 {
    if max_level == 0 {
        FLAT_Y
    } else {
        ROOT_Y - f64::from(level) * (LEVEL_SPAN_Y / f64::from(max_level))
    }
}

/// Whether the node's active link is the secondary one
///
/// Looks at the raw fields only; use [`compute_layout`] for the normalized
/// answer.
#[must_use]
pub fn is_failover(node: &Node) -> bool {
    match (&node.live.active_parent_id, &node.secondary_parent_id) {
        (Some(active), Some(secondary)) => !active.is_blank() && active == secondary,
        _ => false,
    }
}

fn explicit_coordinate(node: &Node, value: Option<f64>, axis: &str) -> Option<f64> {
    match value {
        Some(v) if v.is_finite() => Some(v),
        Some(v) => {
            tracing::warn!(node = %node.id, axis, value = v, "ignoring non-finite position");
            None
        }
        None => None,
    }
}

fn index_by_id<'a>(nodes: &[&'a Node]) -> HashMap<&'a str, usize> {
    let mut index = HashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        index.entry(node.id.as_str()).or_insert(i);
    }
    index
}

fn resolve_links(
    i: usize,
    node: &Node,
    index: &HashMap<&str, usize>,
    issues: &mut Vec<LayoutIssue>,
) -> Links {
    let mut resolve = |reference: Option<&NodeId>| -> Option<usize> {
        let parent = reference.filter(|p| !p.is_blank())?;
        match index.get(parent.as_str()) {
            Some(&p) if p != i => Some(p),
            Some(_) => None,
            None => {
                issues.push(LayoutIssue::UnresolvedParent {
                    node: node.id.clone(),
                    parent: parent.clone(),
                });
                None
            }
        }
    };

    let primary = resolve(node.primary_parent_id.as_ref());
    let secondary = resolve(node.secondary_parent_id.as_ref());

    let reported = node
        .live
        .active_parent_id
        .as_ref()
        .filter(|p| !p.is_blank())
        .and_then(|p| index.get(p.as_str()).copied());

    let active = match reported {
        Some(a) if Some(a) == primary || Some(a) == secondary => Some(a),
        Some(_) => {
            if let Some(parent) = node.live.active_parent_id.clone() {
                tracing::warn!(node = %node.id, %parent, "active parent is not a configured parent");
                issues.push(LayoutIssue::StrayActiveParent {
                    node: node.id.clone(),
                    parent,
                });
            }
            primary
        }
        None => primary,
    };

    Links {
        primary,
        secondary,
        active,
    }
}

fn assign_levels(nodes: &[&Node], links: &[Links], issues: &mut Vec<LayoutIssue>) -> Vec<u32> {
    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(nodes.len(), nodes.len());
    for i in 0..nodes.len() {
        graph.add_node(i);
    }
    for (child, link) in links.iter().enumerate() {
        if let Some(parent) = link.primary {
            graph.add_edge(NodeIndex::new(parent), NodeIndex::new(child), ());
        }
    }

    // Every node has at most one primary parent, so dropping the incoming
    // edge of each cycle member leaves a forest.
    for component in tarjan_scc(&graph) {
        if component.len() < 2 {
            continue;
        }
        let mut members: Vec<usize> = component.iter().map(|n| n.index()).collect();
        members.sort_unstable();
        for &m in &members {
            if let Some(edge) = graph.first_edge(NodeIndex::new(m), petgraph::Direction::Incoming) {
                graph.remove_edge(edge);
            }
        }
        let members: Vec<NodeId> = members.into_iter().map(|m| nodes[m].id.clone()).collect();
        tracing::warn!(?members, "primary parent cycle, laying members out as roots");
        issues.push(LayoutIssue::Cycle { members });
    }

    let mut levels = vec![0u32; nodes.len()];
    let order = match toposort(&graph, None) {
        Ok(order) => order,
        Err(cycle) => {
            tracing::error!(node = cycle.node_id().index(), "cycle survived cycle removal");
            return levels;
        }
    };
    for parent in order {
        let next = levels[graph[parent]] + 1;
        for child in graph.neighbors(parent) {
            levels[graph[child]] = next;
        }
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> Vec<Node> {
        vec![
            Node::new("a", "A"),
            Node::new("b", "B").with_primary_parent("a"),
            Node::new("c", "C").with_primary_parent("b"),
        ]
    }

    #[test]
    fn level_lookup_outside_hierarchy_is_none() {
        let nodes = chain();
        let h = Hierarchy::build(nodes.iter());
        assert_eq!(h.level(2), Some(2));
        assert_eq!(h.level(3), None);
    }

    #[test]
    fn chain_levels_and_heights() {
        let nodes = chain();
        let layout = compute_layout(&nodes);
        let levels: Vec<u32> = layout.placements.iter().map(|p| p.level).collect();
        assert_eq!(levels, vec![0, 1, 2]);
        assert_eq!(layout.max_level, 2);
        let ys: Vec<f64> = layout.placements.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![85.0, 50.0, 15.0]);
        assert!(layout.issues.is_empty());
    }

    #[test]
    fn reversed_input_order_gives_same_levels() {
        let mut nodes = chain();
        nodes.reverse();
        let layout = compute_layout(&nodes);
        assert_eq!(layout.get(&NodeId::from("c")).unwrap().level, 2);
        assert_eq!(layout.get(&NodeId::from("a")).unwrap().level, 0);
    }

    #[test]
    fn flat_topology_is_centered_vertically() {
        let nodes = vec![Node::new("a", "A"), Node::new("b", "B")];
        let layout = compute_layout(&nodes);
        assert!(layout.placements.iter().all(|p| p.y == FLAT_Y));
        let xs: Vec<f64> = layout.placements.iter().map(|p| p.x).collect();
        assert!((xs[0] - 100.0 / 3.0).abs() < 1e-9);
        assert!((xs[1] - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn explicit_position_wins() {
        let nodes = vec![Node::new("a", "A").with_position(10.0, 20.0)];
        let p = &compute_layout(&nodes).placements[0];
        assert_eq!((p.x, p.y), (10.0, 20.0));
        assert!(p.explicit);
    }

    #[test]
    fn half_explicit_position_keeps_other_default() {
        let mut node = Node::new("a", "A");
        node.y = Some(30.0);
        let p = &compute_layout(&[node]).placements[0];
        assert_eq!(p.x, 50.0);
        assert_eq!(p.y, 30.0);
        assert!(!p.explicit);
    }

    #[test]
    fn blank_unknown_and_self_parents_are_roots() {
        let nodes = vec![
            Node::new("a", "A").with_primary_parent(""),
            Node::new("b", "B").with_primary_parent("ghost"),
            Node::new("c", "C").with_primary_parent("c"),
        ];
        let layout = compute_layout(&nodes);
        assert!(layout.placements.iter().all(|p| p.level == 0 && p.primary_parent_id.is_none()));
        assert_eq!(
            layout.issues,
            vec![LayoutIssue::UnresolvedParent {
                node: NodeId::from("b"),
                parent: NodeId::from("ghost"),
            }]
        );
    }

    #[test]
    fn cycle_members_become_roots() {
        let nodes = vec![
            Node::new("a", "A").with_primary_parent("b"),
            Node::new("b", "B").with_primary_parent("a"),
            Node::new("c", "C").with_primary_parent("b"),
        ];
        let layout = compute_layout(&nodes);
        assert_eq!(layout.get(&NodeId::from("a")).unwrap().level, 0);
        assert_eq!(layout.get(&NodeId::from("b")).unwrap().level, 0);
        assert_eq!(layout.get(&NodeId::from("c")).unwrap().level, 1);
        assert_eq!(
            layout.issues,
            vec![LayoutIssue::Cycle {
                members: vec![NodeId::from("a"), NodeId::from("b")],
            }]
        );
    }

    #[test]
    fn strict_build_reports_cycle() {
        let nodes = vec![
            Node::new("a", "A").with_primary_parent("b"),
            Node::new("b", "B").with_primary_parent("a"),
        ];
        let err = Hierarchy::try_build(&nodes).unwrap_err();
        assert!(matches!(err, TopologyError::CycleDetected { ref members } if members.len() == 2));
        assert!(Hierarchy::try_build(&chain()).is_ok());
    }

    #[test]
    fn active_parent_defaults_and_failover() {
        let nodes = vec![
            Node::new("a", "A"),
            Node::new("x", "X"),
            Node::new("b", "B")
                .with_primary_parent("a")
                .with_secondary_parent("x")
                .with_active_parent("x"),
            Node::new("c", "C").with_primary_parent("a").with_secondary_parent("x"),
        ];
        let layout = compute_layout(&nodes);
        let b = layout.get(&NodeId::from("b")).unwrap();
        assert_eq!(b.active_parent_id, Some(NodeId::from("x")));
        assert!(b.failover);
        let c = layout.get(&NodeId::from("c")).unwrap();
        assert_eq!(c.active_parent_id, Some(NodeId::from("a")));
        assert!(!c.failover);
    }

    #[test]
    fn stray_active_parent_falls_back_to_primary() {
        let nodes = vec![
            Node::new("a", "A"),
            Node::new("z", "Z"),
            Node::new("b", "B").with_primary_parent("a").with_active_parent("z"),
        ];
        let layout = compute_layout(&nodes);
        let b = layout.get(&NodeId::from("b")).unwrap();
        assert_eq!(b.active_parent_id, Some(NodeId::from("a")));
        assert!(matches!(layout.issues[0], LayoutIssue::StrayActiveParent { .. }));
    }

    #[test]
    fn raw_failover_check() {
        let node = Node::new("b", "B").with_secondary_parent("x").with_active_parent("x");
        assert!(is_failover(&node));
        assert!(!is_failover(&Node::new("b", "B").with_active_parent("x")));
    }
}
