//! The live diagram and selection, and every mutation the canvas can make to them.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::check::{self, summarize, Issue};
use crate::config::{ConfigError, ConfigMap};
use crate::ids::IdGenerator;
use crate::model::{
    Diagram, Edge, EdgeStyle, Node, NodeData, NodeStyle, Position, DASH_PATTERN, NODE_KIND,
};

/// What the side panel is showing. At most one entity is selected at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Selection {
    #[default]
    None,
    Node(String),
    Edge(String),
}

/// Requested change to an edge's two visual flags. `None` leaves a flag untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeStyleUpdate {
    pub animated: Option<bool>,
    pub dashed: Option<bool>,
}

/// Where a replacement diagram came from, which decides how strictly it is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trust {
    /// Storage or an export file: schema issues are flagged, structural issues rejected.
    Stored,
    /// Model output: any issue rejects the whole diagram.
    Generated,
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("unknown component type '{0}'")]
    UnknownComponentType(String),

    #[error("node '{0}' not found")]
    NodeNotFound(String),

    #[error("edge '{0}' not found")]
    EdgeNotFound(String),

    #[error("invalid config for node '{node}': {source}")]
    InvalidConfig {
        node: String,
        #[source]
        source: ConfigError,
    },

    #[error("diagram rejected: {}", summarize(.0))]
    Rejected(Vec<Issue>),

    #[error("invalid design JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One editing session's diagram state. All mutations are synchronous and leave the
/// diagram consistent: no edge ever references a missing node.
#[derive(Debug)]
pub struct Editor {
    catalog: &'static Catalog,
    diagram: Diagram,
    selection: Selection,
    ids: IdGenerator,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self::with_catalog(Catalog::builtin())
    }

    pub fn with_catalog(catalog: &'static Catalog) -> Self {
        Self {
            catalog,
            diagram: Diagram::default(),
            selection: Selection::None,
            ids: IdGenerator::new(),
        }
    }

    pub fn catalog(&self) -> &'static Catalog {
        self.catalog
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_node(&self) -> Option<&Node> {
        match &self.selection {
            Selection::Node(id) => self.diagram.node(id),
            _ => None,
        }
    }

    pub fn selected_edge(&self) -> Option<&Edge> {
        match &self.selection {
            Selection::Edge(id) => self.diagram.edge(id),
            _ => None,
        }
    }

    /// Place a new component, seeded with its schema's default config.
    pub fn add_node(&mut self, component_type: &str, position: Position) -> Result<&Node, EditorError> {
        let schema = self
            .catalog
            .lookup(component_type)
            .ok_or_else(|| EditorError::UnknownComponentType(component_type.to_string()))?;

        let id = self.fresh_node_id();
        debug!(%id, component_type, "adding node");
        let index = self.diagram.nodes.len();
        self.diagram.nodes.push(Node {
            id,
            kind: NODE_KIND.to_string(),
            position,
            data: NodeData {
                label: schema.label.clone(),
                component_type: schema.type_tag.clone(),
                config: schema.default_config(),
            },
            style: Some(NodeStyle {
                background_color: Some(schema.color.clone()),
            }),
        });
        Ok(&self.diagram.nodes[index])
    }

    /// Draw an edge. Parallel edges and self-loops are allowed.
    pub fn connect(&mut self, source: &str, target: &str) -> Result<&Edge, EditorError> {
        for endpoint in [source, target] {
            if self.diagram.node(endpoint).is_none() {
                return Err(EditorError::NodeNotFound(endpoint.to_string()));
            }
        }
        let id = self.fresh_edge_id();
        debug!(%id, source, target, "connecting");
        let index = self.diagram.edges.len();
        self.diagram.edges.push(Edge {
            id,
            source: source.to_string(),
            target: target.to_string(),
            animated: None,
            style: EdgeStyle::default(),
        });
        Ok(&self.diagram.edges[index])
    }

    /// Replace a node's config wholesale after checking it against the node's schema.
    pub fn update_node_config(&mut self, node_id: &str, config: ConfigMap) -> Result<(), EditorError> {
        let catalog = self.catalog;
        let node = self
            .diagram
            .node_mut(node_id)
            .ok_or_else(|| EditorError::NodeNotFound(node_id.to_string()))?;

        let invalid = |source: ConfigError| EditorError::InvalidConfig {
            node: node_id.to_string(),
            source,
        };
        let schema = catalog
            .lookup(&node.data.component_type)
            .ok_or_else(|| {
                invalid(ConfigError::UnknownComponent {
                    component: node.data.component_type.clone(),
                })
            })?;
        schema.check_config(&config).map_err(invalid)?;

        node.data.config = config;
        Ok(())
    }

    pub fn update_edge_style(&mut self, edge_id: &str, update: EdgeStyleUpdate) -> Result<(), EditorError> {
        let edge = self
            .diagram
            .edge_mut(edge_id)
            .ok_or_else(|| EditorError::EdgeNotFound(edge_id.to_string()))?;
        if let Some(animated) = update.animated {
            edge.animated = Some(animated);
        }
        if let Some(dashed) = update.dashed {
            edge.style.stroke_dasharray = dashed.then(|| DASH_PATTERN.to_string());
        }
        Ok(())
    }

    pub fn move_node(&mut self, node_id: &str, position: Position) -> Result<(), EditorError> {
        let node = self
            .diagram
            .node_mut(node_id)
            .ok_or_else(|| EditorError::NodeNotFound(node_id.to_string()))?;
        node.position = position;
        Ok(())
    }

    pub fn rename_node(&mut self, node_id: &str, label: &str) -> Result<(), EditorError> {
        let node = self
            .diagram
            .node_mut(node_id)
            .ok_or_else(|| EditorError::NodeNotFound(node_id.to_string()))?;
        node.data.label = label.to_string();
        Ok(())
    }

    /// Remove a node together with every edge that touches it.
    pub fn delete_node(&mut self, node_id: &str) -> Result<(Node, Vec<Edge>), EditorError> {
        let index = self
            .diagram
            .nodes
            .iter()
            .position(|n| n.id == node_id)
            .ok_or_else(|| EditorError::NodeNotFound(node_id.to_string()))?;

        let node = self.diagram.nodes.remove(index);
        let (removed, kept): (Vec<Edge>, Vec<Edge>) = std::mem::take(&mut self.diagram.edges)
            .into_iter()
            .partition(|e| e.touches(node_id));
        self.diagram.edges = kept;

        let selection_gone = match &self.selection {
            Selection::Node(id) => *id == node.id,
            Selection::Edge(id) => removed.iter().any(|e| e.id == *id),
            Selection::None => false,
        };
        if selection_gone {
            self.selection = Selection::None;
        }

        debug!(node = %node.id, edges = removed.len(), "deleted node");
        Ok((node, removed))
    }

    pub fn delete_edge(&mut self, edge_id: &str) -> Result<Edge, EditorError> {
        let index = self
            .diagram
            .edges
            .iter()
            .position(|e| e.id == edge_id)
            .ok_or_else(|| EditorError::EdgeNotFound(edge_id.to_string()))?;
        let edge = self.diagram.edges.remove(index);
        if self.selection == Selection::Edge(edge.id.clone()) {
            self.selection = Selection::None;
        }
        Ok(edge)
    }

    /// Select a node, an edge or nothing. Selecting one entity drops any other.
    pub fn select(&mut self, selection: Selection) -> Result<(), EditorError> {
        match &selection {
            Selection::Node(id) if self.diagram.node(id).is_none() => {
                return Err(EditorError::NodeNotFound(id.clone()));
            }
            Selection::Edge(id) if self.diagram.edge(id).is_none() => {
                return Err(EditorError::EdgeNotFound(id.clone()));
            }
            _ => {}
        }
        self.selection = selection;
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    /// Swap in a whole diagram from storage, an import, or the generation service.
    ///
    /// On rejection the current diagram and selection are left exactly as they were.
    /// Returns the tolerated issues (always empty for `Trust::Generated`).
    pub fn replace(&mut self, mut diagram: Diagram, trust: Trust) -> Result<Vec<Issue>, EditorError> {
        let issues = check::check(&diagram, self.catalog);
        let reject = match trust {
            Trust::Generated => !issues.is_empty(),
            Trust::Stored => issues.iter().any(Issue::is_structural),
        };
        if reject {
            warn!(?trust, issues = issues.len(), "rejecting replacement diagram: {}", summarize(&issues));
            return Err(EditorError::Rejected(issues));
        }
        for issue in &issues {
            warn!(%issue, "flagged on load");
        }

        for node in &mut diagram.nodes {
            let style = node.style.get_or_insert_with(NodeStyle::default);
            if style.background_color.is_none() {
                style.background_color = Some(self.catalog.color_for(&node.data.component_type).to_string());
            }
        }

        self.ids.reserve_past(&diagram);
        info!(
            ?trust,
            nodes = diagram.nodes.len(),
            edges = diagram.edges.len(),
            "diagram replaced"
        );
        self.diagram = diagram;
        self.selection = Selection::None;
        Ok(issues)
    }

    /// The export file body: pretty JSON `{nodes, edges}`.
    pub fn export(&self) -> Result<String, EditorError> {
        Ok(self.diagram.to_json_pretty()?)
    }

    /// Load an export file. Same rules as a stored diagram.
    pub fn import(&mut self, raw: &str) -> Result<Vec<Issue>, EditorError> {
        let diagram = Diagram::from_json(raw)?;
        self.replace(diagram, Trust::Stored)
    }

    fn fresh_node_id(&mut self) -> String {
        loop {
            let id = self.ids.next_node_id();
            if self.diagram.node(&id).is_none() {
                return id;
            }
        }
    }

    fn fresh_edge_id(&mut self) -> String {
        loop {
            let id = self.ids.next_edge_id();
            if self.diagram.edge(&id).is_none() {
                return id;
            }
        }
    }
}
