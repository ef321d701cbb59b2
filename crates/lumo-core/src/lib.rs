pub mod anchor;
pub mod change;
pub mod id;
pub mod itinerary;
pub mod model;
pub mod seed;
pub mod snapshot;

pub use anchor::{EdgeAnchors, FloatingEdge, NodeBody, resolve_anchors, resolve_floating_edges};
pub use change::{EdgeChange, NodeChange, apply_edge_changes, apply_node_changes};
pub use id::{EdgeId, NodeId};
pub use itinerary::{Itinerary, itinerary_order};
pub use model::*;
pub use snapshot::{GraphSnapshot, SnapshotError};
