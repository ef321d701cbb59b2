//! WASM bridge for Lumo: exposes the canvas store to the web UI.
//!
//! Compiled via `wasm-pack build --target web`. Everything crosses the
//! boundary as JSON strings so the UI can hand its change arrays over
//! unchanged.

use lumo_core::change::{EdgeChange, NodeChange};
use lumo_core::id::{EdgeId, NodeId};
use lumo_core::model::{Connection, LinkDetails, Node, NodeData};
use lumo_core::seed::paris_trip;
use lumo_editor::{GraphStore, History, StoreConfig};
use serde::de::DeserializeOwned;
use serde_json::json;
use wasm_bindgen::prelude::*;

/// The WASM-facing canvas controller.
///
/// Holds the store and its undo history. All interaction from the UI goes
/// through this struct.
#[wasm_bindgen]
pub struct LumoCanvas {
    store: GraphStore,
    history: History,
}

impl Default for LumoCanvas {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl LumoCanvas {
    /// Create an empty canvas.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        console_error_panic_hook_setup();
        Self::with_store(GraphStore::new(StoreConfig::default()))
    }

    /// Create a canvas pre-populated with the Paris demo.
    pub fn demo() -> Self {
        console_error_panic_hook_setup();
        Self::with_store(GraphStore::from_snapshot(paris_trip(), StoreConfig::default()))
    }

    /// Create a canvas with a JSON `StoreConfig`. Falls back to defaults
    /// when the config does not parse.
    pub fn with_config(config_json: &str) -> Self {
        console_error_panic_hook_setup();
        let config = decode::<StoreConfig>(config_json).unwrap_or_default();
        Self::with_store(GraphStore::new(config))
    }

    // ─── Load / export ───────────────────────────────────────────────────

    /// Replace the whole graph with a persisted snapshot.
    /// Returns `{"ok":true}` or `{"ok":false,"error":"..."}`.
    pub fn load(&mut self, snapshot_json: &str) -> String {
        match self.store.load_json(snapshot_json) {
            Ok(()) => {
                self.history.clear();
                json!({ "ok": true }).to_string()
            }
            Err(e) => json!({ "ok": false, "error": e.to_string() }).to_string(),
        }
    }

    /// Current `{"nodes": [...], "edges": [...]}` for persistence.
    pub fn export(&self) -> String {
        self.store
            .export()
            .to_json()
            .unwrap_or_else(|_| r#"{"nodes":[],"edges":[]}"#.to_string())
    }

    pub fn nodes_json(&self) -> String {
        serde_json::to_string(&*self.store.nodes()).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn edges_json(&self) -> String {
        serde_json::to_string(&*self.store.edges()).unwrap_or_else(|_| "[]".to_string())
    }

    // ─── Change batches ──────────────────────────────────────────────────

    /// Apply a JSON array of node changes. Returns `false` if the payload
    /// does not decode; the store is then untouched.
    pub fn apply_node_changes(&mut self, changes_json: &str) -> bool {
        let Some(changes) = decode::<Vec<NodeChange>>(changes_json) else {
            return false;
        };
        if changes.iter().any(is_undoable) {
            self.history.record(&mut self.store, "edit nodes", |s| {
                s.apply_node_changes(&changes)
            });
        } else {
            self.store.apply_node_changes(&changes);
        }
        true
    }

    /// Apply a JSON array of edge changes.
    pub fn apply_edge_changes(&mut self, changes_json: &str) -> bool {
        let Some(changes) = decode::<Vec<EdgeChange>>(changes_json) else {
            return false;
        };
        let structural = changes
            .iter()
            .any(|c| !matches!(c, EdgeChange::Select { .. }));
        if structural {
            self.history.record(&mut self.store, "edit edges", |s| {
                s.apply_edge_changes(&changes)
            });
        } else {
            self.store.apply_edge_changes(&changes);
        }
        true
    }

    /// Start a drag gesture: everything until `end_gesture` undoes as one.
    pub fn begin_gesture(&mut self) {
        self.history.begin_batch(&self.store);
    }

    pub fn end_gesture(&mut self, description: &str) {
        self.history.end_batch(&self.store, description);
    }

    // ─── Direct operations ───────────────────────────────────────────────

    /// Finish a drag-to-connect gesture. Returns the new edge as JSON, or
    /// an empty string when the connection is rejected.
    pub fn connect(&mut self, source: &str, target: &str) -> String {
        let connection = Connection::new(NodeId::intern(source), NodeId::intern(target));
        self.history
            .record(&mut self.store, "connect", |s| s.connect(connection))
            .and_then(|edge| serde_json::to_string(&edge).ok())
            .unwrap_or_default()
    }

    pub fn add_node(&mut self, node_json: &str) -> bool {
        let Some(node) = decode::<Node>(node_json) else {
            return false;
        };
        self.history
            .record(&mut self.store, "add lume", |s| s.add_node(node));
        true
    }

    /// Merge a JSON object into a node's data.
    pub fn update_node(&mut self, id: &str, patch_json: &str) -> bool {
        let Some(patch) = decode::<NodeData>(patch_json) else {
            return false;
        };
        let id = NodeId::intern(id);
        self.history
            .record(&mut self.store, "edit lume", |s| s.update_node(id, patch));
        true
    }

    /// Replace an edge's itinerary details.
    pub fn update_edge(&mut self, id: &str, link_json: &str) -> bool {
        let Some(link) = decode::<LinkDetails>(link_json) else {
            return false;
        };
        let id = EdgeId::intern(id);
        self.history
            .record(&mut self.store, "edit link", |s| s.update_edge(id, link));
        true
    }

    pub fn delete_node(&mut self, id: &str) {
        let id = NodeId::intern(id);
        self.history
            .record(&mut self.store, "delete lume", |s| s.delete_node(id));
    }

    // ─── Rendering support ───────────────────────────────────────────────

    /// Geometry for every drawable floating edge:
    /// `[{"id","source":{x,y},"target":{x,y},"path","label":{x,y}}]`.
    pub fn floating_edges_json(&self) -> String {
        let edges: Vec<serde_json::Value> = self
            .store
            .floating_anchors()
            .iter()
            .map(|fe| {
                json!({
                    "id": fe.id,
                    "source": fe.anchors.source,
                    "target": fe.anchors.target,
                    "path": fe.anchors.straight_path(),
                    "label": fe.anchors.midpoint(),
                })
            })
            .collect();
        serde_json::Value::Array(edges).to_string()
    }

    /// `{"nodes": [...ids], "edges": [...ids]}` of the current selection.
    pub fn selection_json(&self) -> String {
        json!({
            "nodes": self.store.selected_nodes(),
            "edges": self.store.selected_edges(),
        })
        .to_string()
    }

    /// Visit order as a JSON array of ids, or `null` when links loop.
    pub fn itinerary_json(&self) -> String {
        json!(self.store.itinerary()).to_string()
    }

    // ─── History ─────────────────────────────────────────────────────────

    /// Undo the last action. Returns `true` if anything changed.
    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.store).is_some()
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.store).is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}

impl LumoCanvas {
    fn with_store(store: GraphStore) -> Self {
        let history = History::for_store(&store);
        Self { store, history }
    }
}

/// Changes worth an undo step. Measurements and selection are UI state.
fn is_undoable(change: &NodeChange) -> bool {
    !matches!(
        change,
        NodeChange::Dimensions { .. } | NodeChange::Select { .. }
    )
}

fn decode<T: DeserializeOwned>(json: &str) -> Option<T> {
    match serde_json::from_str(json) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("rejected payload: {e}");
            None
        }
    }
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Lumo WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
