use serde::{Deserialize, Serialize};

use crate::config::ConfigMap;

/// Node kind every canvas node carries on the wire.
pub const NODE_KIND: &str = "default";

/// Dash pattern written to an edge's style when it is rendered dashed.
pub const DASH_PATTERN: &str = "5,5";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub label: String,
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default)]
    pub config: ConfigMap,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

/// A placed component. Matches ReactFlow's node structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(rename = "type", default = "default_node_kind")]
    pub kind: String,
    #[serde(default)]
    pub position: Position,
    pub data: NodeData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<NodeStyle>,
}

fn default_node_kind() -> String {
    NODE_KIND.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_dasharray: Option<String>,
}

impl EdgeStyle {
    pub fn is_empty(&self) -> bool {
        self.stroke_dasharray.is_none()
    }
}

/// A directed connection ("pathway") between two nodes. Matches ReactFlow's edge structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animated: Option<bool>,
    #[serde(default, skip_serializing_if = "EdgeStyle::is_empty")]
    pub style: EdgeStyle,
}

impl Edge {
    pub fn is_animated(&self) -> bool {
        self.animated.unwrap_or(false)
    }

    pub fn is_dashed(&self) -> bool {
        self.style.stroke_dasharray.is_some()
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// The complete node/edge graph of one design. This is both the export file format and
/// the body of a persisted record.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Diagram {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Diagram {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn edge_mut(&mut self, id: &str) -> Option<&mut Edge> {
        self.edges.iter_mut().find(|e| e.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Pretty-printed `{nodes, edges}`, the export file body.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reactflow_export_with_extra_fields() {
        let raw = r#"{
          "nodes": [{
            "id": "dnd-node_1",
            "type": "default",
            "position": {"x": 10, "y": 20},
            "data": {"label": "Cache", "type": "cache", "config": {"ttl": 60}},
            "width": 150, "height": 40, "selected": false
          }],
          "edges": [{
            "id": "e1", "source": "dnd-node_1", "target": "dnd-node_1",
            "style": {"strokeDasharray": "5,5"}, "markerEnd": {"type": "arrowclosed"}
          }]
        }"#;
        let diagram = Diagram::from_json(raw).unwrap();
        assert_eq!(diagram.nodes[0].position, Position::new(10.0, 20.0));
        assert_eq!(diagram.nodes[0].data.component_type, "cache");
        assert!(diagram.edges[0].is_dashed());
        assert!(!diagram.edges[0].is_animated());
    }

    #[test]
    fn missing_collections_default_to_empty() {
        let diagram = Diagram::from_json("{}").unwrap();
        assert!(diagram.is_empty());
    }

    #[test]
    fn plain_edge_omits_optional_fields() {
        let edge = Edge {
            id: "e".into(),
            source: "a".into(),
            target: "b".into(),
            animated: None,
            style: EdgeStyle::default(),
        };
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json, serde_json::json!({"id": "e", "source": "a", "target": "b"}));
    }
}
