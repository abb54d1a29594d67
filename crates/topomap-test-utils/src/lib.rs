//! Testing utilities for the topomap workspace
//!
//! Shared fixtures: node chains, snapshots and a fixed clock.

#![allow(missing_docs)]

use chrono::{DateTime, TimeZone, Utc};
use topomap_core::{Node, Settings, Snapshot, SnapshotNode, TopologyDocument};

/// `n0 <- n1 <- ... <- n{len-1}` along primary parents, no positions
pub fn chain(len: usize) -> Vec<Node> {
    (0..len)
        .map(|i| {
            let node = Node::new(format!("n{i}"), format!("Host {i}")).with_address(format!("10.0.0.{}", i + 1));
            if i == 0 {
                node
            } else {
                node.with_primary_parent(format!("n{}", i - 1))
            }
        })
        .collect()
}

/// Gateway with two switches, the second one dual-homed through the first
pub fn small_site() -> Vec<Node> {
    vec![
        Node::new("gw", "Gateway").with_address("10.0.0.1"),
        Node::new("sw1", "Switch 1").with_address("10.0.0.2").with_primary_parent("gw"),
        Node::new("sw2", "Switch 2")
            .with_address("10.0.0.3")
            .with_primary_parent("gw")
            .with_secondary_parent("sw1"),
        Node::new("ap", "Access point").with_address("10.0.0.4").with_primary_parent("sw2"),
    ]
}

pub fn document(nodes: Vec<Node>) -> TopologyDocument {
    TopologyDocument::new(Settings::default(), nodes)
}

/// Snapshot reporting every id with the given status
pub fn snapshot(updated: &str, entries: &[(&str, bool)]) -> Snapshot {
    Snapshot {
        updated: updated.to_string(),
        nodes: entries.iter().map(|(id, status)| SnapshotNode::new(*id, *status)).collect(),
    }
}

/// Fixed instant all time-based tests start from
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().unwrap_or_default()
}
