//! Side-panel models for the selected node or edge.
//!
//! A panel is derived from the current entity and its schema; edits go back through the
//! editor as whole config maps or style updates.

use serde::Serialize;

use crate::catalog::Catalog;
use crate::config::{ConfigError, ConfigMap, ConfigValue, ParamKind};
use crate::editor::{EdgeStyleUpdate, Editor, EditorError};
use crate::model::{Edge, Node};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Input {
    Text,
    Number,
    Picker { options: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub input: Input,
    /// Current value, `None` when the key is unset on the node.
    pub value: Option<ConfigValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "panel", rename_all = "camelCase")]
pub enum NodePanel {
    #[serde(rename_all = "camelCase")]
    Fields {
        node_id: String,
        title: String,
        component_type: String,
        fields: Vec<Field>,
        #[serde(skip)]
        config: ConfigMap,
    },
    /// The node's type has no schema in the catalog.
    #[serde(rename_all = "camelCase")]
    NoConfiguration {
        node_id: String,
        title: String,
        component_type: String,
    },
}

impl NodePanel {
    pub fn for_node(node: &Node, catalog: &Catalog) -> Self {
        let Some(schema) = catalog.lookup(&node.data.component_type) else {
            return NodePanel::NoConfiguration {
                node_id: node.id.clone(),
                title: node.data.label.clone(),
                component_type: node.data.component_type.clone(),
            };
        };

        let fields = schema
            .config
            .iter()
            .map(|param| Field {
                id: param.id.clone(),
                label: param.label.clone(),
                description: param.description.clone(),
                input: match &param.kind {
                    ParamKind::Text => Input::Text,
                    ParamKind::Number => Input::Number,
                    ParamKind::Enum { options } => Input::Picker {
                        options: options.clone(),
                    },
                },
                value: node.data.config.get(&param.id).cloned(),
            })
            .collect();

        NodePanel::Fields {
            node_id: node.id.clone(),
            title: node.data.label.clone(),
            component_type: schema.type_tag.clone(),
            fields,
            config: node.data.config.clone(),
        }
    }

    /// Apply raw text typed or picked into one field. Returns the full updated config for
    /// `Editor::update_node_config`.
    pub fn edit(&self, field_id: &str, raw: &str) -> Result<ConfigMap, ConfigError> {
        let (component_type, fields, config) = match self {
            NodePanel::Fields {
                component_type,
                fields,
                config,
                ..
            } => (component_type, fields, config),
            NodePanel::NoConfiguration { component_type, .. } => {
                return Err(ConfigError::UnknownComponent {
                    component: component_type.clone(),
                });
            }
        };

        let field = fields
            .iter()
            .find(|f| f.id == field_id)
            .ok_or_else(|| ConfigError::UnknownParameter {
                component: component_type.clone(),
                key: field_id.to_string(),
            })?;

        let value = match &field.input {
            Input::Text => ConfigValue::from(raw),
            Input::Number => {
                let n = raw
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .ok_or_else(|| ConfigError::InvalidNumber {
                        key: field.id.clone(),
                        input: raw.to_string(),
                    })?;
                ConfigValue::Number(n)
            }
            Input::Picker { options } => {
                if !options.iter().any(|o| o == raw) {
                    return Err(ConfigError::NotAnOption {
                        key: field.id.clone(),
                        value: raw.to_string(),
                        options: options.clone(),
                    });
                }
                ConfigValue::from(raw)
            }
        };

        let mut updated = config.clone();
        updated.insert(field.id.clone(), value);
        Ok(updated)
    }
}

/// The two pathway toggles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgePanel {
    pub edge_id: String,
    pub animated: bool,
    pub dashed: bool,
}

impl EdgePanel {
    pub fn for_edge(edge: &Edge) -> Self {
        Self {
            edge_id: edge.id.clone(),
            animated: edge.is_animated(),
            dashed: edge.is_dashed(),
        }
    }

    pub fn set_animated(&self, animated: bool) -> EdgeStyleUpdate {
        EdgeStyleUpdate {
            animated: Some(animated),
            dashed: None,
        }
    }

    pub fn set_dashed(&self, dashed: bool) -> EdgeStyleUpdate {
        EdgeStyleUpdate {
            animated: None,
            dashed: Some(dashed),
        }
    }

    pub fn toggle_animated(&self) -> EdgeStyleUpdate {
        self.set_animated(!self.animated)
    }

    pub fn toggle_dashed(&self) -> EdgeStyleUpdate {
        self.set_dashed(!self.dashed)
    }
}

impl Editor {
    pub fn node_panel(&self, node_id: &str) -> Result<NodePanel, EditorError> {
        let node = self
            .diagram()
            .node(node_id)
            .ok_or_else(|| EditorError::NodeNotFound(node_id.to_string()))?;
        Ok(NodePanel::for_node(node, self.catalog()))
    }

    pub fn edge_panel(&self, edge_id: &str) -> Result<EdgePanel, EditorError> {
        let edge = self
            .diagram()
            .edge(edge_id)
            .ok_or_else(|| EditorError::EdgeNotFound(edge_id.to_string()))?;
        Ok(EdgePanel::for_edge(edge))
    }

    /// Edit one config field of a node through its panel.
    pub fn edit_field(&mut self, node_id: &str, field_id: &str, raw: &str) -> Result<(), EditorError> {
        let config = self
            .node_panel(node_id)?
            .edit(field_id, raw)
            .map_err(|source| EditorError::InvalidConfig {
                node: node_id.to_string(),
                source,
            })?;
        self.update_node_config(node_id, config)
    }
}
