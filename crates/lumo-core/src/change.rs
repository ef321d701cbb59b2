//! Pure reducers for UI-originated change batches.
//!
//! Each reducer takes the current collection and an ordered list of change
//! descriptors and returns a brand-new collection; the input is never
//! touched, so a reader holding the old collection sees no intermediate
//! state.
//!
//! Batch rules:
//! - descriptors apply strictly in order, later ones win;
//! - a descriptor naming an unknown id is a no-op (stale UI events are
//!   expected right after a removal);
//! - once an id is removed, every later descriptor naming it in the same
//!   batch is ignored, `Add` included;
//! - an edge entering through `Add` or `Replace` must join two distinct
//!   existing nodes, exactly like a `connect`; an illegal one is skipped.

use crate::id::{EdgeId, NodeId};
use crate::model::{Connection, Dimensions, Edge, Node, Point, RoutingMode};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

// ─── Change descriptors ──────────────────────────────────────────────────

/// One incremental node mutation emitted by the render layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeChange {
    /// Absolute position update. `position: None` only updates the drag
    /// flag (drag end).
    Position {
        id: NodeId,
        #[serde(default)]
        position: Option<Point>,
        #[serde(default)]
        dragging: bool,
    },
    /// Measured body size reported after paint.
    Dimensions { id: NodeId, dimensions: Dimensions },
    Select { id: NodeId, selected: bool },
    Remove { id: NodeId },
    /// Insert a node, appended unless `index` is given.
    Add {
        item: Node,
        #[serde(default)]
        index: Option<usize>,
    },
    /// Swap the whole record, keeping its id.
    Replace { id: NodeId, item: Node },
}

/// One incremental edge mutation emitted by the render layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EdgeChange {
    Select { id: EdgeId, selected: bool },
    Remove { id: EdgeId },
    Add {
        item: Edge,
        #[serde(default)]
        index: Option<usize>,
    },
    Replace { id: EdgeId, item: Edge },
}

// ─── Batch machinery ─────────────────────────────────────────────────────

/// Something addressable by a stable id inside a batch.
trait Keyed: Clone {
    type Key: Copy + Eq + Hash + std::fmt::Debug;

    fn key(&self) -> Self::Key;
    fn set_key(&mut self, key: Self::Key);
}

impl Keyed for Node {
    type Key = NodeId;

    fn key(&self) -> NodeId {
        self.id
    }

    fn set_key(&mut self, key: NodeId) {
        self.id = key;
    }
}

impl Keyed for Edge {
    type Key = EdgeId;

    fn key(&self) -> EdgeId {
        self.id
    }

    fn set_key(&mut self, key: EdgeId) {
        self.id = key;
    }
}

struct Slot<T> {
    item: Option<T>,
    /// Requested insertion index for `Add { index: Some(_) }`.
    at: Option<usize>,
}

/// Working copy of a collection for the duration of one batch.
struct Batch<T: Keyed> {
    slots: Vec<Slot<T>>,
    index: HashMap<T::Key, usize>,
    removed: HashSet<T::Key>,
    removed_order: SmallVec<[T::Key; 4]>,
}

impl<T: Keyed> Batch<T> {
    /// Later copies of a repeated id are dropped; the first one wins.
    fn new(items: &[T]) -> Self {
        let mut slots = Vec::with_capacity(items.len());
        let mut index = HashMap::with_capacity(items.len());
        for item in items {
            let key = item.key();
            if index.contains_key(&key) {
                log::warn!("duplicate id {key:?} dropped");
                continue;
            }
            index.insert(key, slots.len());
            slots.push(Slot {
                item: Some(item.clone()),
                at: None,
            });
        }
        Self {
            slots,
            index,
            removed: HashSet::new(),
            removed_order: SmallVec::new(),
        }
    }

    fn get_mut(&mut self, key: T::Key) -> Option<&mut T> {
        match self.index.get(&key) {
            Some(&i) => self.slots[i].item.as_mut(),
            None => {
                log::trace!("change for unknown id {key:?} ignored");
                None
            }
        }
    }

    fn remove(&mut self, key: T::Key) {
        if let Some(i) = self.index.remove(&key) {
            self.slots[i].item = None;
            self.removed.insert(key);
            self.removed_order.push(key);
        } else {
            log::trace!("remove for unknown id {key:?} ignored");
        }
    }

    fn add(&mut self, item: T, at: Option<usize>) {
        let key = item.key();
        if self.removed.contains(&key) {
            log::trace!("add for {key:?} ignored: removed earlier in this batch");
            return;
        }
        if self.index.contains_key(&key) {
            log::warn!("add for {key:?} ignored: id already present");
            return;
        }
        self.index.insert(key, self.slots.len());
        self.slots.push(Slot {
            item: Some(item),
            at,
        });
    }

    fn replace(&mut self, key: T::Key, mut item: T) {
        if item.key() != key {
            log::warn!(
                "replace for {key:?} carried id {:?}; keeping {key:?}",
                item.key()
            );
            item.set_key(key);
        }
        if let Some(current) = self.get_mut(key) {
            *current = item;
        }
    }

    /// Compact the slots into the final collection.
    fn finish(self) -> (Vec<T>, SmallVec<[T::Key; 4]>) {
        let mut out = Vec::with_capacity(self.slots.len());
        let mut placed = Vec::new();
        for slot in self.slots {
            match (slot.item, slot.at) {
                (Some(item), None) => out.push(item),
                (Some(item), Some(at)) => placed.push((at, item)),
                (None, _) => {}
            }
        }
        for (at, item) in placed {
            let at = at.min(out.len());
            out.insert(at, item);
        }
        (out, self.removed_order)
    }
}

// ─── Reducers ────────────────────────────────────────────────────────────

/// Result of applying a node batch.
#[derive(Debug, Clone)]
pub struct AppliedNodes {
    pub nodes: Vec<Node>,
    /// Ids removed by this batch, in removal order. Edges touching them
    /// must be dropped by the caller (see [`cascade_removed`]).
    pub removed: SmallVec<[NodeId; 4]>,
}

/// Apply node change descriptors to `nodes`, returning the new list.
pub fn apply_node_changes(changes: &[NodeChange], nodes: &[Node]) -> AppliedNodes {
    let mut batch = Batch::new(nodes);

    for change in changes {
        match change {
            NodeChange::Position {
                id,
                position,
                dragging,
            } => {
                if let Some(node) = batch.get_mut(*id) {
                    if let Some(p) = position {
                        node.position = *p;
                    }
                    node.dragging = *dragging;
                }
            }
            NodeChange::Dimensions { id, dimensions } => {
                if let Some(node) = batch.get_mut(*id) {
                    node.dimensions = Some(*dimensions);
                }
            }
            NodeChange::Select { id, selected } => {
                if let Some(node) = batch.get_mut(*id) {
                    node.selected = *selected;
                }
            }
            NodeChange::Remove { id } => batch.remove(*id),
            NodeChange::Add { item, index } => batch.add(item.clone(), *index),
            NodeChange::Replace { id, item } => batch.replace(*id, item.clone()),
        }
    }

    let (nodes, removed) = batch.finish();
    log::debug!(
        "applied {} node change(s): {} node(s), {} removed",
        changes.len(),
        nodes.len(),
        removed.len()
    );
    AppliedNodes { nodes, removed }
}

/// Apply edge change descriptors to `edges`, returning the new list.
///
/// `nodes` is the node set the edges must attach to. Added or replacing
/// edges that loop or dangle are dropped.
pub fn apply_edge_changes(changes: &[EdgeChange], edges: &[Edge], nodes: &[Node]) -> Vec<Edge> {
    let known: HashSet<NodeId> = nodes.iter().map(|n| n.id).collect();
    let mut batch = Batch::new(edges);

    for change in changes {
        match change {
            EdgeChange::Select { id, selected } => {
                if let Some(edge) = batch.get_mut(*id) {
                    edge.selected = *selected;
                }
            }
            EdgeChange::Remove { id } => batch.remove(*id),
            EdgeChange::Add { item, index } => {
                if endpoints_ok(item.source, item.target, |n| known.contains(&n)) {
                    batch.add(item.clone(), *index);
                }
            }
            EdgeChange::Replace { id, item } => {
                if endpoints_ok(item.source, item.target, |n| known.contains(&n)) {
                    batch.replace(*id, item.clone());
                }
            }
        }
    }

    let (edges, _) = batch.finish();
    log::debug!(
        "applied {} edge change(s): {} edge(s)",
        changes.len(),
        edges.len()
    );
    edges
}

/// Drop every edge whose source or target is in `removed`.
pub fn cascade_removed(edges: &[Edge], removed: &[NodeId]) -> Vec<Edge> {
    edges
        .iter()
        .filter(|e| !removed.iter().any(|&n| e.touches(n)))
        .cloned()
        .collect()
}

/// Validate a connection request and append the resulting edge.
///
/// Returns `None` (and builds nothing) when either endpoint is missing,
/// the endpoints are equal, or `id` is already taken. On success the new
/// edge is the last element of the returned list.
pub fn add_connection(
    connection: Connection,
    id: EdgeId,
    routing: RoutingMode,
    nodes: &[Node],
    edges: &[Edge],
) -> Option<Vec<Edge>> {
    let Connection { source, target } = connection;
    if !endpoints_ok(source, target, |id| nodes.iter().any(|n| n.id == id)) {
        return None;
    }
    if edges.iter().any(|e| e.id == id) {
        log::warn!("connection {source} -> {target} rejected: edge id {id} in use");
        return None;
    }

    let mut next = Vec::with_capacity(edges.len() + 1);
    next.extend_from_slice(edges);
    next.push(Edge::new(id, source, target).with_routing(routing));
    Some(next)
}

/// Whether an edge `source -> target` may exist: no self loop and both
/// endpoints present.
fn endpoints_ok(source: NodeId, target: NodeId, exists: impl Fn(NodeId) -> bool) -> bool {
    if source == target {
        log::trace!("edge {source} -> {target} rejected: self loop");
        return false;
    }
    if !exists(source) || !exists(target) {
        log::trace!("edge {source} -> {target} rejected: unknown endpoint");
        return false;
    }
    true
}
