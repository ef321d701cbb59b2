//! Floating-edge anchor geometry.
//!
//! A floating edge is drawn as a straight line between two node bodies.
//! Each body is the axis-aligned ellipse inscribed in its bounding box, and
//! the line starts and ends where the center-to-center segment crosses
//! those ellipses, so it touches each silhouette instead of cutting into it.
//!
//! Everything here is a pure function of its inputs.

use crate::id::{EdgeId, NodeId};
use crate::model::{Edge, Node, Point, RoutingMode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A node reduced to what the geometry needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeBody {
    pub center: Point,
    pub half_width: f64,
    pub half_height: f64,
}

impl NodeBody {
    pub fn new(center: Point, half_width: f64, half_height: f64) -> Self {
        Self {
            center,
            half_width,
            half_height,
        }
    }

    /// Body of a node; an unmeasured node collapses to a point at its
    /// position.
    pub fn of(node: &Node) -> Self {
        let dims = node.dimensions.unwrap_or_default();
        Self::new(node.center(), dims.width / 2.0, dims.height / 2.0)
    }

    /// Point on the ellipse boundary in direction `theta` (radians).
    ///
    /// A body with a non-positive semi-axis has no area and yields its
    /// center.
    pub fn boundary_point(&self, theta: f64) -> Point {
        if !(self.half_width > 0.0 && self.half_height > 0.0) {
            return self.center;
        }
        let (sin, cos) = theta.sin_cos();
        let r = 1.0 / ((cos / self.half_width).powi(2) + (sin / self.half_height).powi(2)).sqrt();
        Point::new(self.center.x + r * cos, self.center.y + r * sin)
    }
}

/// Where a floating edge begins and ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeAnchors {
    pub source: Point,
    pub target: Point,
}

impl EdgeAnchors {
    /// SVG path for a straight segment between the anchors.
    pub fn straight_path(&self) -> String {
        format!(
            "M {},{} L {},{}",
            self.source.x, self.source.y, self.target.x, self.target.y
        )
    }

    /// Label position: the middle of the segment.
    pub fn midpoint(&self) -> Point {
        Point::new(
            (self.source.x + self.target.x) / 2.0,
            (self.source.y + self.target.y) / 2.0,
        )
    }
}

/// Compute the anchors of a floating edge from `source` to `target`.
///
/// Coincident centers have no direction; both anchors then fall back to
/// each body's own center.
pub fn resolve_anchors(source: &NodeBody, target: &NodeBody) -> EdgeAnchors {
    let delta = target.center - source.center;
    if delta.x == 0.0 && delta.y == 0.0 {
        return EdgeAnchors {
            source: source.center,
            target: target.center,
        };
    }
    let angle = delta.y.atan2(delta.x);
    EdgeAnchors {
        source: source.boundary_point(angle),
        target: target.boundary_point(angle + std::f64::consts::PI),
    }
}

/// A floating edge ready to draw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatingEdge {
    pub id: EdgeId,
    pub anchors: EdgeAnchors,
}

/// Resolve anchors for every floating edge whose endpoints both exist.
///
/// Fixed-side edges are left to the renderer. Edges naming a missing node
/// (a transient state between a removal and the cascade) are skipped.
pub fn resolve_floating_edges(nodes: &[Node], edges: &[Edge]) -> Vec<FloatingEdge> {
    let bodies: HashMap<NodeId, NodeBody> =
        nodes.iter().map(|n| (n.id, NodeBody::of(n))).collect();

    edges
        .iter()
        .filter(|e| e.routing == RoutingMode::Floating)
        .filter_map(|e| {
            let (Some(source), Some(target)) = (bodies.get(&e.source), bodies.get(&e.target))
            else {
                log::trace!("skipping edge {} with a missing endpoint", e.id);
                return None;
            };
            Some(FloatingEdge {
                id: e.id,
                anchors: resolve_anchors(source, target),
            })
        })
        .collect()
}
