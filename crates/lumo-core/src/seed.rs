//! Demo canvas shown on first launch.

use crate::id::NodeId;
use crate::model::{LumeType, Node, NodeData, Point};
use crate::snapshot::GraphSnapshot;

/// Six unconnected Lumes around Paris.
pub fn paris_trip() -> GraphSnapshot {
    let lumes = [
        ("1", 100.0, 100.0, LumeType::City, "Paris", "The City of Light"),
        ("2", 350.0, 150.0, LumeType::Attraction, "Eiffel Tower", "Iconic iron lattice tower"),
        ("3", 200.0, 250.0, LumeType::Restaurant, "Le Comptoir", "Traditional French bistro"),
        ("4", 450.0, 100.0, LumeType::Accommodation, "Hotel Plaza", "Luxury hotel in city center"),
        ("5", 150.0, 350.0, LumeType::TransportHub, "Metro Station", "Central metro hub"),
        ("6", 400.0, 300.0, LumeType::Activity, "Seine Cruise", "Scenic river tour"),
    ];

    let nodes = lumes
        .into_iter()
        .map(|(id, x, y, kind, name, description)| {
            let mut data = NodeData::lume(kind, name).with_description(description);
            data.insert("id", serde_json::Value::String(id.to_string()));
            Node::new(NodeId::intern(id), Point::new(x, y), data)
        })
        .collect();

    GraphSnapshot::new(nodes, Vec::new())
}
