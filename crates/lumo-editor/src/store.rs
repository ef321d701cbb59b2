//! The canvas graph store: single source of truth for Lumes and links.
//!
//! The render layer feeds UI change batches in and reads snapshots out:
//!
//! - **In**: `apply_node_changes` / `apply_edge_changes` with descriptors
//!   from drag, select and remove gestures, `connect` when a drag-to-connect
//!   gesture ends on another node, and the explicit add/update/delete calls.
//!
//! - **Out**: `nodes()` / `edges()` return `Arc` snapshots. Every mutation
//!   builds a fresh collection and swaps it in whole, so a reader iterating
//!   an old snapshot never sees a later change and a changed `Arc` identity
//!   is the re-render signal.
//!
//! Stale ids are silent no-ops throughout; only `connect` reports an
//! outcome, because a rejected connection is visible to the user.

use lumo_core::change::{self, EdgeChange, NodeChange};
use lumo_core::id::{EdgeId, NodeId};
use lumo_core::model::*;
use lumo_core::{FloatingEdge, GraphSnapshot, SnapshotError, itinerary_order, resolve_floating_edges};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Store tuning knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoreConfig {
    /// Routing assigned to edges created by `connect`.
    pub default_routing: RoutingMode,
    /// Prefix for generated edge ids (`link_0`, `link_1`, ...).
    pub edge_id_prefix: String,
    /// Maximum undo depth for a [`History`](crate::history::History)
    /// attached to this store.
    pub history_depth: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_routing: RoutingMode::Floating,
            edge_id_prefix: "link".to_string(),
            history_depth: 100,
        }
    }
}

/// An immutable view of the whole graph at one instant.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub nodes: Arc<[Node]>,
    pub edges: Arc<[Edge]>,
}

impl StoreSnapshot {
    /// Whether both snapshots hold the same graph. Cheap when nothing was
    /// swapped in between.
    pub fn same_as(&self, other: &StoreSnapshot) -> bool {
        let nodes_same = Arc::ptr_eq(&self.nodes, &other.nodes) || self.nodes == other.nodes;
        let edges_same = Arc::ptr_eq(&self.edges, &other.edges) || self.edges == other.edges;
        nodes_same && edges_same
    }
}

/// Owns the canvas graph. Single writer: every operation runs to
/// completion before returning.
#[derive(Debug, Clone)]
pub struct GraphStore {
    nodes: Arc<[Node]>,
    edges: Arc<[Edge]>,
    config: StoreConfig,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl GraphStore {
    /// Create an empty store.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            nodes: Arc::from(Vec::new()),
            edges: Arc::from(Vec::new()),
            config,
        }
    }

    /// Create a store from a snapshot the caller has already validated.
    pub fn from_snapshot(snapshot: GraphSnapshot, config: StoreConfig) -> Self {
        Self {
            nodes: Arc::from(snapshot.nodes),
            edges: Arc::from(snapshot.edges),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ─── Snapshots ───────────────────────────────────────────────────────

    pub fn nodes(&self) -> Arc<[Node]> {
        Arc::clone(&self.nodes)
    }

    pub fn edges(&self) -> Arc<[Edge]> {
        Arc::clone(&self.edges)
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            nodes: self.nodes(),
            edges: self.edges(),
        }
    }

    /// Swap a previously taken snapshot back in (undo/redo).
    ///
    /// Measured dimensions and selection are live UI state, not history:
    /// records that survive the swap keep their current values.
    pub fn restore(&mut self, snapshot: StoreSnapshot) {
        let live: HashMap<NodeId, (Option<Dimensions>, bool)> = self
            .nodes
            .iter()
            .map(|n| (n.id, (n.dimensions, n.selected)))
            .collect();
        let selected_edges: HashMap<EdgeId, bool> =
            self.edges.iter().map(|e| (e.id, e.selected)).collect();

        let nodes: Vec<Node> = snapshot
            .nodes
            .iter()
            .map(|n| {
                let mut node = n.clone();
                if let Some(&(dimensions, selected)) = live.get(&n.id) {
                    node.dimensions = dimensions.or(n.dimensions);
                    node.selected = selected;
                }
                node
            })
            .collect();
        let edges: Vec<Edge> = snapshot
            .edges
            .iter()
            .map(|e| {
                let mut edge = e.clone();
                if let Some(&selected) = selected_edges.get(&e.id) {
                    edge.selected = selected;
                }
                edge
            })
            .collect();

        self.nodes = Arc::from(nodes);
        self.edges = Arc::from(edges);
    }

    /// Owned copy for the persistence layer.
    pub fn export(&self) -> GraphSnapshot {
        GraphSnapshot::new(self.nodes.to_vec(), self.edges.to_vec())
    }

    // ─── Batch change application ────────────────────────────────────────

    /// Apply a batch of node changes as one unit. Removals cascade to
    /// every edge touching the removed node.
    pub fn apply_node_changes(&mut self, changes: &[NodeChange]) {
        if changes.is_empty() {
            return;
        }
        let applied = change::apply_node_changes(changes, &self.nodes);
        if !applied.removed.is_empty() {
            let kept = change::cascade_removed(&self.edges, &applied.removed);
            if kept.len() != self.edges.len() {
                log::debug!(
                    "cascade removed {} edge(s)",
                    self.edges.len() - kept.len()
                );
                self.edges = Arc::from(kept);
            }
        }
        self.nodes = Arc::from(applied.nodes);
    }

    /// Apply a batch of edge changes as one unit. Added edges obey the
    /// same rules as `connect`.
    pub fn apply_edge_changes(&mut self, changes: &[EdgeChange]) {
        if changes.is_empty() {
            return;
        }
        self.edges = Arc::from(change::apply_edge_changes(
            changes,
            &self.edges,
            &self.nodes,
        ));
    }

    // ─── Connections ─────────────────────────────────────────────────────

    /// Create an edge for a finished drag-to-connect gesture.
    ///
    /// Returns `None` and leaves the edges untouched when either endpoint
    /// is missing or both are the same node.
    pub fn connect(&mut self, connection: Connection) -> Option<Edge> {
        let id = self.fresh_edge_id();
        let edges = change::add_connection(
            connection,
            id,
            self.config.default_routing,
            &self.nodes,
            &self.edges,
        )?;
        let created = edges.last().cloned();
        self.edges = Arc::from(edges);
        if let Some(edge) = &created {
            log::debug!("connected {} -> {} as {}", edge.source, edge.target, edge.id);
        }
        created
    }

    fn fresh_edge_id(&self) -> EdgeId {
        loop {
            let id = EdgeId::with_prefix(&self.config.edge_id_prefix);
            if !self.edges.iter().any(|e| e.id == id) {
                return id;
            }
        }
    }

    // ─── Direct operations ───────────────────────────────────────────────

    /// Append a node. A node whose id is already present is ignored.
    pub fn add_node(&mut self, node: Node) {
        self.apply_node_changes(&[NodeChange::Add {
            item: node,
            index: None,
        }]);
    }

    /// Shallow-merge `patch` into a node's data. Position and dimensions
    /// are untouched.
    pub fn update_node(&mut self, id: NodeId, patch: NodeData) {
        let Some(pos) = self.nodes.iter().position(|n| n.id == id) else {
            log::trace!("update for unknown node {id} ignored");
            return;
        };
        let mut nodes = self.nodes.to_vec();
        nodes[pos].data.merge(patch);
        self.nodes = Arc::from(nodes);
    }

    /// Replace an edge's itinerary details.
    pub fn update_edge(&mut self, id: EdgeId, link: LinkDetails) {
        let Some(pos) = self.edges.iter().position(|e| e.id == id) else {
            log::trace!("update for unknown edge {id} ignored");
            return;
        };
        let mut edges = self.edges.to_vec();
        edges[pos].link = link;
        self.edges = Arc::from(edges);
    }

    /// Remove a node and every edge touching it.
    pub fn delete_node(&mut self, id: NodeId) {
        self.apply_node_changes(&[NodeChange::Remove { id }]);
    }

    /// Bulk replace (initial load or external reset). Edges are kept as
    /// given. Ids are expected to be unique; the next batch keeps only the
    /// first record of a repeated id.
    pub fn set_nodes(&mut self, nodes: Vec<Node>) {
        self.nodes = Arc::from(nodes);
    }

    pub fn set_edges(&mut self, edges: Vec<Edge>) {
        self.edges = Arc::from(edges);
    }

    /// Validate and load a persisted `{"nodes": [...], "edges": [...]}`
    /// document. On error the store is unchanged.
    pub fn load_json(&mut self, json: &str) -> Result<(), SnapshotError> {
        let snapshot = GraphSnapshot::from_json(json)?;
        log::debug!(
            "loaded {} node(s), {} edge(s)",
            snapshot.nodes.len(),
            snapshot.edges.len()
        );
        self.set_nodes(snapshot.nodes);
        self.set_edges(snapshot.edges);
        Ok(())
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Edges with `id` as source or target.
    pub fn edges_of(&self, id: NodeId) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.touches(id)).collect()
    }

    pub fn selected_nodes(&self) -> Vec<NodeId> {
        self.nodes.iter().filter(|n| n.selected).map(|n| n.id).collect()
    }

    pub fn selected_edges(&self) -> Vec<EdgeId> {
        self.edges.iter().filter(|e| e.selected).map(|e| e.id).collect()
    }

    /// Anchor points for every drawable floating edge.
    pub fn floating_anchors(&self) -> Vec<FloatingEdge> {
        resolve_floating_edges(&self.nodes, &self.edges)
    }

    /// Visit order along links, `None` if the links loop.
    pub fn itinerary(&self) -> Option<Vec<NodeId>> {
        itinerary_order(&self.nodes, &self.edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lume(id: &str, x: f64, y: f64) -> Node {
        Node::new(
            NodeId::intern(id),
            Point::new(x, y),
            NodeData::lume(LumeType::City, id),
        )
        .with_dimensions(Dimensions::new(100.0, 100.0))
    }

    fn store_with(ids: &[&str]) -> GraphStore {
        let mut store = GraphStore::default();
        store.set_nodes(ids.iter().map(|id| lume(id, 0.0, 0.0)).collect());
        store
    }

    #[test]
    fn snapshots_are_isolated_from_later_mutations() {
        let mut store = store_with(&["1", "2"]);
        let before = store.nodes();
        store.delete_node(NodeId::intern("1"));
        assert_eq!(before.len(), 2);
        assert_eq!(store.nodes().len(), 1);
        assert!(!Arc::ptr_eq(&before, &store.nodes()));
    }

    #[test]
    fn empty_batch_keeps_identity() {
        let mut store = store_with(&["1"]);
        let before = store.nodes();
        store.apply_node_changes(&[]);
        assert!(Arc::ptr_eq(&before, &store.nodes()));
    }

    #[test]
    fn connect_assigns_fresh_floating_edge() {
        let mut store = store_with(&["1", "2"]);
        let a = NodeId::intern("1");
        let b = NodeId::intern("2");
        let first = store.connect(Connection::new(a, b)).unwrap();
        let second = store.connect(Connection::new(b, a)).unwrap();
        assert_ne!(first.id, second.id);
        assert!(first.id.as_str().starts_with("link_"));
        assert_eq!(first.routing, RoutingMode::Floating);
        assert_eq!(store.edges().len(), 2);
    }

    #[test]
    fn connect_skips_ids_already_loaded() {
        let mut store = store_with(&["1", "2"]);
        let a = NodeId::intern("1");
        let b = NodeId::intern("2");
        // Occupy the next few generated ids.
        let probe = EdgeId::with_prefix("taken");
        let n: u64 = probe.as_str()["taken_".len()..].parse().unwrap();
        let occupied = (n + 1..n + 20)
            .map(|k| Edge::new(EdgeId::intern(&format!("taken_{k}")), a, b))
            .collect();
        store.set_edges(occupied);
        store.config.edge_id_prefix = "taken".into();

        let edge = store.connect(Connection::new(a, b)).unwrap();
        assert_eq!(store.edges().iter().filter(|e| e.id == edge.id).count(), 1);
    }

    #[test]
    fn configured_routing_applies_to_new_edges() {
        let config = StoreConfig {
            default_routing: RoutingMode::FixedSide,
            ..StoreConfig::default()
        };
        let mut store = GraphStore::new(config);
        store.add_node(lume("1", 0.0, 0.0));
        store.add_node(lume("2", 0.0, 0.0));
        let edge = store
            .connect(Connection::new(NodeId::intern("1"), NodeId::intern("2")))
            .unwrap();
        assert_eq!(edge.routing, RoutingMode::FixedSide);
        assert!(store.floating_anchors().is_empty());
    }

    #[test]
    fn update_node_merges_data_only() {
        let mut store = store_with(&["1"]);
        let id = NodeId::intern("1");
        let mut patch = NodeData::new();
        patch.insert("name", serde_json::json!("Lyon"));
        store.update_node(id, patch);

        let node = store.node(id).unwrap();
        assert_eq!(node.data.name(), Some("Lyon"));
        assert_eq!(node.data.lume_type(), LumeType::City);
        assert_eq!(node.position, Point::new(0.0, 0.0));
        assert_eq!(node.dimensions, Some(Dimensions::new(100.0, 100.0)));
    }

    #[test]
    fn update_unknown_is_noop() {
        let mut store = store_with(&["1"]);
        let nodes = store.nodes();
        let edges = store.edges();
        store.update_node(NodeId::intern("nobody"), NodeData::new());
        store.update_edge(EdgeId::intern("nothing"), LinkDetails::default());
        assert!(Arc::ptr_eq(&nodes, &store.nodes()));
        assert!(Arc::ptr_eq(&edges, &store.edges()));
    }

    #[test]
    fn update_edge_sets_link_details() {
        let mut store = store_with(&["1", "2"]);
        let edge = store
            .connect(Connection::new(NodeId::intern("1"), NodeId::intern("2")))
            .unwrap();
        store.update_edge(
            edge.id,
            LinkDetails {
                kind: LinkKind::Travel,
                travel: Some(TravelDetails {
                    mode: TravelMode::Metro,
                    duration_sec: 900,
                    ..TravelDetails::default()
                }),
                ..LinkDetails::default()
            },
        );
        let stored = store.edge(edge.id).unwrap();
        assert_eq!(stored.link.kind, LinkKind::Travel);
        assert_eq!(stored.link.travel.unwrap().mode, TravelMode::Metro);
    }

    #[test]
    fn load_json_rejects_without_touching_state() {
        let mut store = store_with(&["1"]);
        let err = store
            .load_json(r#"{"nodes": [], "edges": [{"id": "e", "source": "1", "target": "2"}]}"#)
            .unwrap_err();
        assert!(matches!(err, SnapshotError::DanglingEdge { .. }));
        assert_eq!(store.nodes().len(), 1);
    }

    #[test]
    fn restore_keeps_live_measurements_and_selection() {
        let mut store = GraphStore::default();
        store.add_node(Node::new(NodeId::intern("r1"), Point::new(0.0, 0.0), NodeData::new()));
        let earlier = store.snapshot();
        store.add_node(Node::new(NodeId::intern("r2"), Point::new(50.0, 0.0), NodeData::new()));
        store.apply_node_changes(&[
            NodeChange::Dimensions {
                id: NodeId::intern("r1"),
                dimensions: Dimensions::new(64.0, 32.0),
            },
            NodeChange::Select {
                id: NodeId::intern("r1"),
                selected: true,
            },
        ]);

        store.restore(earlier);
        assert_eq!(store.nodes().len(), 1);
        let node = store.node(NodeId::intern("r1")).unwrap();
        assert_eq!(node.dimensions, Some(Dimensions::new(64.0, 32.0)));
        assert!(node.selected);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: StoreConfig = serde_json::from_str(r#"{"edgeIdPrefix": "e"}"#).unwrap();
        assert_eq!(config.edge_id_prefix, "e");
        assert_eq!(config.default_routing, RoutingMode::Floating);
        assert_eq!(config.history_depth, 100);
    }
}
