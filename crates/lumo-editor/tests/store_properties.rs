//! Integration tests: graph store behavior (lumo-editor ↔ lumo-core).
//!
//! Exercises batch application, cascade deletion, connection validation,
//! and floating-edge geometry through the store's public surface.

use lumo_core::change::{EdgeChange, NodeChange};
use lumo_core::id::{EdgeId, NodeId};
use lumo_core::model::*;
use lumo_core::seed::paris_trip;
use lumo_editor::{GraphStore, StoreConfig};
use pretty_assertions::assert_eq;
use std::collections::HashSet;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn circle(id: &str, x: f64, y: f64) -> Node {
    Node::new(
        NodeId::intern(id),
        Point::new(x, y),
        NodeData::lume(LumeType::Attraction, id),
    )
    .with_dimensions(Dimensions::new(100.0, 100.0))
}

/// Four nodes, wired 1→2, 2→3, 3→1, 3→4.
fn wired_store() -> GraphStore {
    let mut store = GraphStore::new(StoreConfig::default());
    for (i, id) in ["1", "2", "3", "4"].iter().enumerate() {
        store.add_node(circle(id, i as f64 * 200.0, 0.0));
    }
    for (a, b) in [("1", "2"), ("2", "3"), ("3", "1"), ("3", "4")] {
        store
            .connect(Connection::new(NodeId::intern(a), NodeId::intern(b)))
            .expect("valid connection");
    }
    store
}

fn id(s: &str) -> NodeId {
    NodeId::intern(s)
}

// ─── Stale references ───────────────────────────────────────────────────

#[test]
fn removing_absent_node_changes_nothing() {
    init_logging();
    let mut store = wired_store();
    let nodes = store.nodes().to_vec();
    let edges = store.edges().to_vec();

    store.apply_node_changes(&[NodeChange::Remove { id: id("absent") }]);

    assert_eq!(store.nodes().to_vec(), nodes);
    assert_eq!(store.edges().to_vec(), edges);
}

#[test]
fn stale_events_after_removal_are_ignored() {
    init_logging();
    let mut store = wired_store();
    store.delete_node(id("2"));
    store.apply_node_changes(&[
        NodeChange::Position {
            id: id("2"),
            position: Some(Point::new(5.0, 5.0)),
            dragging: true,
        },
        NodeChange::Select {
            id: id("2"),
            selected: true,
        },
    ]);
    assert!(store.node(id("2")).is_none());
    assert!(store.selected_nodes().is_empty());
}

// ─── Cascade deletion ───────────────────────────────────────────────────

#[test]
fn delete_node_cascades_edges() {
    init_logging();
    let mut store = wired_store();
    store.delete_node(id("3"));

    assert!(store.node(id("3")).is_none());
    assert!(store.edges().iter().all(|e| !e.touches(id("3"))));
    // only 1→2 survives
    assert_eq!(store.edges().len(), 1);
    assert!(store.edges_of(id("3")).is_empty());
}

#[test]
fn remove_descriptor_cascades_like_delete() {
    init_logging();
    let mut store = wired_store();
    store.apply_node_changes(&[NodeChange::Remove { id: id("1") }]);
    let edges = store.edges();
    let remaining: Vec<(&str, &str)> = edges
        .iter()
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect();
    assert_eq!(remaining, vec![("2", "3"), ("3", "4")]);
}

#[test]
fn move_then_remove_in_one_batch() {
    init_logging();
    let mut store = wired_store();
    store.apply_node_changes(&[
        NodeChange::Position {
            id: id("1"),
            position: Some(Point::new(10.0, 20.0)),
            dragging: false,
        },
        NodeChange::Remove { id: id("1") },
    ]);
    assert!(store.node(id("1")).is_none());
    assert_eq!(store.nodes().len(), 3);
}

// ─── Connections ────────────────────────────────────────────────────────

#[test]
fn self_connection_is_rejected() {
    init_logging();
    let mut store = wired_store();
    for n in ["1", "2", "3", "4", "absent"] {
        let before = store.edges();
        assert!(store.connect(Connection::new(id(n), id(n))).is_none());
        assert!(std::sync::Arc::ptr_eq(&before, &store.edges()));
    }
}

#[test]
fn connection_to_unknown_node_is_rejected() {
    init_logging();
    let mut store = wired_store();
    let before = store.edges().to_vec();
    assert!(store.connect(Connection::new(id("1"), id("nowhere"))).is_none());
    assert!(store.connect(Connection::new(id("nowhere"), id("1"))).is_none());
    assert_eq!(store.edges().to_vec(), before);
}

#[test]
fn connect_appends_exactly_one_edge() {
    init_logging();
    let mut store = wired_store();
    let before = store.edges().to_vec();
    let edge = store.connect(Connection::new(id("4"), id("2"))).unwrap();

    assert_eq!(edge.source, id("4"));
    assert_eq!(edge.target, id("2"));
    assert_eq!(edge.routing, RoutingMode::Floating);

    let after = store.edges().to_vec();
    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(&after[..before.len()], &before[..]);
    assert_eq!(after.last(), Some(&edge));

    let unique: HashSet<EdgeId> = after.iter().map(|e| e.id).collect();
    assert_eq!(unique.len(), after.len());
}

// ─── Edge changes ───────────────────────────────────────────────────────

#[test]
fn edge_selection_and_removal() {
    init_logging();
    let mut store = wired_store();
    let first = store.edges()[0].id;
    let second = store.edges()[1].id;
    store.apply_edge_changes(&[
        EdgeChange::Select {
            id: second,
            selected: true,
        },
        EdgeChange::Remove { id: first },
    ]);
    assert!(store.edge(first).is_none());
    assert_eq!(store.selected_edges(), vec![second]);
    // nodes untouched by edge removal
    assert_eq!(store.nodes().len(), 4);
}

// ─── Geometry through the store ─────────────────────────────────────────

#[test]
fn edge_batches_cannot_add_loops_or_dangling_edges() {
    init_logging();
    let mut store = GraphStore::default();
    store.add_node(circle("a", 0.0, 0.0));
    store.add_node(circle("b", 200.0, 0.0));
    store.apply_edge_changes(&[
        EdgeChange::Add {
            item: Edge::new(EdgeId::intern("loop"), id("a"), id("a")),
            index: None,
        },
        EdgeChange::Add {
            item: Edge::new(EdgeId::intern("dang"), id("a"), id("ghost")),
            index: None,
        },
        EdgeChange::Add {
            item: Edge::new(EdgeId::intern("ab"), id("a"), id("b")),
            index: None,
        },
    ]);
    let edges = store.edges();
    let ids: Vec<&str> = edges.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["ab"]);

    store.apply_edge_changes(&[EdgeChange::Replace {
        id: EdgeId::intern("ab"),
        item: Edge::new(EdgeId::intern("ab"), id("b"), id("ghost")),
    }]);
    let edge = store.edge(EdgeId::intern("ab")).unwrap();
    assert_eq!((edge.source, edge.target), (id("a"), id("b")));
}

#[test]
fn floating_anchors_for_adjacent_circles() {
    init_logging();
    let mut store = GraphStore::default();
    store.add_node(circle("A", 0.0, 0.0));
    store.add_node(circle("B", 200.0, 0.0));
    let edge = store.connect(Connection::new(id("A"), id("B"))).unwrap();

    let anchors = store.floating_anchors();
    assert_eq!(anchors.len(), 1);
    assert_eq!(anchors[0].id, edge.id);
    let a = anchors[0].anchors;
    assert!((a.source.x - 100.0).abs() < 1e-9 && (a.source.y - 50.0).abs() < 1e-9);
    assert!((a.target.x - 200.0).abs() < 1e-9 && (a.target.y - 50.0).abs() < 1e-9);
}

#[test]
fn anchors_follow_position_changes() {
    init_logging();
    let mut store = GraphStore::default();
    store.add_node(circle("A", 0.0, 0.0));
    store.add_node(circle("B", 200.0, 0.0));
    store.connect(Connection::new(id("A"), id("B"))).unwrap();

    // Drag B straight below A.
    store.apply_node_changes(&[NodeChange::Position {
        id: id("B"),
        position: Some(Point::new(0.0, 300.0)),
        dragging: true,
    }]);
    let a = store.floating_anchors()[0].anchors;
    assert!((a.source.x - 50.0).abs() < 1e-9 && (a.source.y - 100.0).abs() < 1e-9);
    assert!((a.target.x - 50.0).abs() < 1e-9 && (a.target.y - 300.0).abs() < 1e-9);
}

#[test]
fn measured_dimensions_feed_geometry() {
    init_logging();
    let mut store = GraphStore::default();
    store.add_node(Node::new(id("m1"), Point::new(0.0, 0.0), NodeData::new()));
    store.add_node(Node::new(id("m2"), Point::new(200.0, 0.0), NodeData::new()));
    store.connect(Connection::new(id("m1"), id("m2"))).unwrap();

    // Before the first paint both are points.
    let a = store.floating_anchors()[0].anchors;
    assert_eq!(a.source, Point::new(0.0, 0.0));
    assert_eq!(a.target, Point::new(200.0, 0.0));

    store.apply_node_changes(&[
        NodeChange::Dimensions {
            id: id("m1"),
            dimensions: Dimensions::new(64.0, 64.0),
        },
        NodeChange::Dimensions {
            id: id("m2"),
            dimensions: Dimensions::new(64.0, 64.0),
        },
    ]);
    let a = store.floating_anchors()[0].anchors;
    assert!((a.source.x - 64.0).abs() < 1e-9 && (a.source.y - 32.0).abs() < 1e-9);
    assert!((a.target.x - 200.0).abs() < 1e-9 && (a.target.y - 32.0).abs() < 1e-9);
}

// ─── Load / export ──────────────────────────────────────────────────────

#[test]
fn seed_roundtrips_through_json() {
    init_logging();
    let mut store = GraphStore::default();
    let json = paris_trip().to_json().unwrap();
    store.load_json(&json).unwrap();
    assert_eq!(store.nodes().len(), 6);

    store.connect(Connection::new(id("4"), id("2"))).unwrap();
    store.connect(Connection::new(id("2"), id("3"))).unwrap();
    let exported = store.export();

    let mut reloaded = GraphStore::default();
    reloaded.load_json(&exported.to_json().unwrap()).unwrap();
    assert_eq!(reloaded.export(), exported);
}

#[test]
fn itinerary_follows_links() {
    init_logging();
    let mut store = GraphStore::default();
    store.load_json(&paris_trip().to_json().unwrap()).unwrap();
    store.connect(Connection::new(id("4"), id("2"))).unwrap();
    store.connect(Connection::new(id("2"), id("3"))).unwrap();

    let order = store.itinerary().unwrap();
    let pos = |n: &str| order.iter().position(|&x| x == id(n)).unwrap();
    assert!(pos("4") < pos("2"));
    assert!(pos("2") < pos("3"));

    store.connect(Connection::new(id("3"), id("4"))).unwrap();
    assert!(store.itinerary().is_none());
}
