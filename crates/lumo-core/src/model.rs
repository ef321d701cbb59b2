//! Canvas data model: Lumes (nodes) and the links (edges) between them.
//!
//! Nodes carry an opaque JSON payload that the engine never interprets
//! beyond a few typed readers. Positions are the top-left corner of the
//! rendered body; `dimensions` are reported by the render layer after it
//! measures the body and stay `None` until then.

use crate::id::{EdgeId, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ops::{Add, Sub};

// ─── Geometry primitives ─────────────────────────────────────────────────

/// A point in canvas coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Measured size of a rendered node body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

// ─── Lume payload ────────────────────────────────────────────────────────

/// Category of a place marker. Drives icon selection in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LumeType {
    #[default]
    Unspecified,
    City,
    Attraction,
    Accommodation,
    Restaurant,
    TransportHub,
    Activity,
    Shopping,
    Entertainment,
    Custom,
}

/// Opaque node payload (place type, name, description, and anything else
/// the UI wants to keep). Updates are shallow merges of top-level keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeData(pub Map<String, Value>);

impl NodeData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload for a Lume marker with the given type and display name.
    pub fn lume(kind: LumeType, name: &str) -> Self {
        let mut data = Self::new();
        data.insert("type", serde_json::to_value(kind).unwrap_or(Value::Null));
        data.insert("name", Value::String(name.to_string()));
        data
    }

    /// Builder-style description setter.
    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.insert("description", Value::String(description.to_string()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: &str, value: Value) -> Option<Value> {
        self.0.insert(key.to_string(), value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shallow merge: every top-level key in `patch` overwrites ours.
    pub fn merge(&mut self, patch: NodeData) {
        for (key, value) in patch.0 {
            self.0.insert(key, value);
        }
    }

    /// The Lume type, or `Unspecified` when absent or unrecognized.
    pub fn lume_type(&self) -> LumeType {
        self.0
            .get("type")
            .and_then(|v| LumeType::deserialize(v).ok())
            .unwrap_or_default()
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    pub fn description(&self) -> Option<&str> {
        self.0.get("description").and_then(Value::as_str)
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// A placed marker on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    /// Top-left corner of the body.
    pub position: Point,
    /// Measured body size; `None` before the first paint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(default)]
    pub data: NodeData,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub dragging: bool,
}

impl Node {
    pub fn new(id: NodeId, position: Point, data: NodeData) -> Self {
        Self {
            id,
            position,
            dimensions: None,
            data,
            selected: false,
            dragging: false,
        }
    }

    #[must_use]
    pub fn with_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    /// Center of the bounding box. An unmeasured node is a point at its
    /// position.
    pub fn center(&self) -> Point {
        let Dimensions { width, height } = self.dimensions.unwrap_or_default();
        Point::new(
            self.position.x + width / 2.0,
            self.position.y + height / 2.0,
        )
    }
}

// ─── Edges ───────────────────────────────────────────────────────────────

/// How an edge attaches to its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutingMode {
    /// Pinned to a predetermined handle; anchors are owned by the renderer.
    FixedSide,
    /// Anchors recomputed from both bodies on every frame.
    #[default]
    Floating,
}

/// High-level relation between two Lumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkKind {
    #[default]
    Unspecified,
    Travel,
    Recommended,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelMode {
    #[default]
    Unspecified,
    Flight,
    Train,
    Bus,
    Drive,
    Uber,
    Metro,
}

/// Movement metadata, meaningful only for `LinkKind::Travel`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelDetails {
    pub mode: TravelMode,
    pub duration_sec: u32,
    pub cost_estimate: f64,
    pub distance_meters: f64,
}

/// Itinerary metadata attached to an edge.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDetails {
    pub kind: LinkKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel: Option<TravelDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Ordering hint for list and timeline views.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_index: Option<i32>,
}

/// A directed connection between two Lumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub routing: RoutingMode,
    #[serde(default)]
    pub selected: bool,
    #[serde(default)]
    pub link: LinkDetails,
}

impl Edge {
    pub fn new(id: EdgeId, source: NodeId, target: NodeId) -> Self {
        Self {
            id,
            source,
            target,
            routing: RoutingMode::default(),
            selected: false,
            link: LinkDetails::default(),
        }
    }

    #[must_use]
    pub fn with_routing(mut self, routing: RoutingMode) -> Self {
        self.routing = routing;
        self
    }

    /// Whether either endpoint is `node`.
    pub fn touches(&self, node: NodeId) -> bool {
        self.source == node || self.target == node
    }
}

/// A drag-to-connect request from the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub source: NodeId,
    pub target: NodeId,
}

impl Connection {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self { source, target }
    }
}
