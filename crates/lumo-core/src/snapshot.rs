//! Whole-graph snapshots exchanged with the persistence layer.

use crate::id::{EdgeId, NodeId};
use crate::model::{Edge, Node};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Why a snapshot was refused.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("duplicate node id `{0}`")]
    DuplicateNode(NodeId),
    #[error("duplicate edge id `{0}`")]
    DuplicateEdge(EdgeId),
    #[error("edge `{edge}` references missing node `{node}`")]
    DanglingEdge { edge: EdgeId, node: NodeId },
    #[error("edge `{0}` connects a node to itself")]
    SelfLoop(EdgeId),
}

/// Nodes and edges of one canvas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl GraphSnapshot {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Decode and validate a `{"nodes": [...], "edges": [...]}` document.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: GraphSnapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Check the invariants the store relies on: unique ids, no self
    /// loops, and every edge endpoint present.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let mut node_ids = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !node_ids.insert(node.id) {
                return Err(SnapshotError::DuplicateNode(node.id));
            }
        }

        let mut edge_ids = HashSet::with_capacity(self.edges.len());
        for edge in &self.edges {
            if !edge_ids.insert(edge.id) {
                return Err(SnapshotError::DuplicateEdge(edge.id));
            }
            if edge.source == edge.target {
                return Err(SnapshotError::SelfLoop(edge.id));
            }
            for node in [edge.source, edge.target] {
                if !node_ids.contains(&node) {
                    return Err(SnapshotError::DanglingEdge {
                        edge: edge.id,
                        node,
                    });
                }
            }
        }
        Ok(())
    }
}
