//! Itinerary queries over the link graph.
//!
//! Links are directed "go here next" relations, so a visit order is a
//! topological order of the canvas graph.

use crate::id::NodeId;
use crate::model::{Edge, Node};
use petgraph::Direction;
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Directed view of a canvas snapshot. Node weights are ids; edge weights
/// are the links' sequence hints.
pub struct Itinerary {
    graph: DiGraph<NodeId, Option<i32>>,
    index: HashMap<NodeId, NodeIndex>,
}

impl Itinerary {
    /// Build from snapshots. Edges naming a missing node are ignored.
    pub fn build(nodes: &[Node], edges: &[Edge]) -> Self {
        let mut graph = DiGraph::with_capacity(nodes.len(), edges.len());
        let mut index = HashMap::with_capacity(nodes.len());
        for node in nodes {
            index.insert(node.id, graph.add_node(node.id));
        }
        for edge in edges {
            if let (Some(&a), Some(&b)) = (index.get(&edge.source), index.get(&edge.target)) {
                graph.add_edge(a, b, edge.link.sequence_index);
            }
        }
        Self { graph, index }
    }

    pub fn has_cycle(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Visit order respecting every link, or `None` if the links loop.
    ///
    /// Among nodes that are ready at the same time, the one reached by the
    /// lowest `sequence_index` goes first, then canvas order.
    pub fn order(&self) -> Option<Vec<NodeId>> {
        if self.has_cycle() {
            return None;
        }

        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|n| self.graph.neighbors_directed(n, Direction::Incoming).count())
            .collect();

        let mut ready = BinaryHeap::new();
        for n in self.graph.node_indices() {
            if in_degree[n.index()] == 0 {
                ready.push(Reverse((self.priority(n), n.index())));
            }
        }

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse((_, i))) = ready.pop() {
            let n = NodeIndex::new(i);
            order.push(self.graph[n]);
            for next in self.graph.neighbors_directed(n, Direction::Outgoing) {
                in_degree[next.index()] -= 1;
                if in_degree[next.index()] == 0 {
                    ready.push(Reverse((self.priority(next), next.index())));
                }
            }
        }
        Some(order)
    }

    /// Every node reachable from `start` along links, `start` first.
    /// Empty when `start` is unknown.
    pub fn reachable_from(&self, start: NodeId) -> Vec<NodeId> {
        let Some(&origin) = self.index.get(&start) else {
            return Vec::new();
        };
        let mut dfs = Dfs::new(&self.graph, origin);
        let mut out = Vec::new();
        while let Some(n) = dfs.next(&self.graph) {
            out.push(self.graph[n]);
        }
        out
    }

    fn priority(&self, n: NodeIndex) -> i32 {
        self.graph
            .edges_directed(n, Direction::Incoming)
            .filter_map(|e| *e.weight())
            .min()
            .unwrap_or(i32::MAX)
    }
}

/// Convenience wrapper: the visit order of a snapshot.
pub fn itinerary_order(nodes: &[Node], edges: &[Edge]) -> Option<Vec<NodeId>> {
    Itinerary::build(nodes, edges).order()
}
