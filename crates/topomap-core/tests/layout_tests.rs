use pretty_assertions::assert_eq;
use proptest::prelude::*;
use topomap_core::layout::{compute_layout, default_y, Hierarchy, LayoutIssue};
use topomap_core::{Node, NodeId};
use topomap_test_utils::{chain, small_site};

fn shuffled_chain() -> impl Strategy<Value = (usize, Vec<usize>)> {
    (1..40usize).prop_flat_map(|len| (Just(len), Just((0..len).collect::<Vec<_>>()).prop_shuffle()))
}

proptest! {
    #[test]
    fn prop_chain_level_is_depth((len, order) in shuffled_chain()) {
        let nodes = chain(len);
        let shuffled: Vec<Node> = order.iter().map(|&i| nodes[i].clone()).collect();
        let layout = compute_layout(&shuffled);

        prop_assert_eq!(layout.max_level as usize, len - 1);
        prop_assert!(layout.issues.is_empty());
        for i in 0..len {
            let placement = layout.get(&NodeId::from(format!("n{i}"))).unwrap();
            prop_assert_eq!(placement.level as usize, i);
        }
    }

    #[test]
    fn prop_active_parent_is_a_configured_parent(
        links in proptest::collection::vec(
            (proptest::option::of(0..12usize), proptest::option::of(0..12usize), proptest::option::of(0..14usize)),
            1..12,
        )
    ) {
        let nodes: Vec<Node> = links
            .iter()
            .enumerate()
            .map(|(i, (primary, secondary, active))| {
                let mut node = Node::new(format!("n{i}"), format!("N{i}"));
                node.primary_parent_id = primary.map(|p| NodeId::from(format!("n{p}")));
                node.secondary_parent_id = secondary.map(|p| NodeId::from(format!("n{p}")));
                node.live.active_parent_id = active.map(|p| NodeId::from(format!("n{p}")));
                node
            })
            .collect();

        let layout = compute_layout(&nodes);
        prop_assert_eq!(layout.placements.len(), nodes.len());
        for p in &layout.placements {
            if let Some(active) = &p.active_parent_id {
                prop_assert!(
                    Some(active) == p.primary_parent_id.as_ref()
                        || Some(active) == p.secondary_parent_id.as_ref()
                );
            }
            prop_assert_eq!(p.failover, p.active_parent_id.is_some() && p.active_parent_id == p.secondary_parent_id);
            prop_assert!(p.x.is_finite() && p.y.is_finite());
        }
    }
}

#[test]
fn test_default_heights_span_levels() {
    assert_eq!(default_y(0, 0), 50.0);
    assert_eq!(default_y(0, 2), 85.0);
    assert_eq!(default_y(1, 2), 50.0);
    assert_eq!(default_y(2, 2), 15.0);
    assert!((default_y(1, 3) - (85.0 - 70.0 / 3.0)).abs() < 1e-9);
}

#[test]
fn test_small_site_levels_and_spread() {
    let layout = compute_layout(&small_site());
    let levels: Vec<(String, u32)> = layout
        .placements
        .iter()
        .map(|p| (p.id.to_string(), p.level))
        .collect();
    assert_eq!(
        levels,
        vec![
            ("gw".to_string(), 0),
            ("sw1".to_string(), 1),
            ("sw2".to_string(), 1),
            ("ap".to_string(), 2),
        ]
    );
    let level_one: Vec<f64> = layout.level(1).map(|p| p.x).collect();
    assert!((level_one[0] - 100.0 / 3.0).abs() < 1e-9);
    assert!((level_one[1] - 200.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_three_node_cycle_is_reported_once() {
    let nodes = vec![
        Node::new("a", "A").with_primary_parent("c"),
        Node::new("b", "B").with_primary_parent("a"),
        Node::new("c", "C").with_primary_parent("b"),
        Node::new("d", "D").with_primary_parent("a"),
    ];
    let layout = compute_layout(&nodes);
    let cycles: Vec<&LayoutIssue> = layout
        .issues
        .iter()
        .filter(|i| matches!(i, LayoutIssue::Cycle { .. }))
        .collect();
    assert_eq!(cycles.len(), 1);
    assert_eq!(layout.get(&NodeId::from("d")).unwrap().level, 1);
    assert!(Hierarchy::try_build(&nodes).is_err());
}

#[test]
fn test_removed_parent_degrades_child_to_root() {
    let mut nodes = chain(3);
    nodes.remove(0);
    let layout = compute_layout(&nodes);
    assert_eq!(layout.get(&NodeId::from("n1")).unwrap().level, 0);
    assert_eq!(layout.get(&NodeId::from("n2")).unwrap().level, 1);
    assert!(matches!(layout.issues[0], LayoutIssue::UnresolvedParent { .. }));
}
