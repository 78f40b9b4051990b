//! Structural and schema checks for whole diagrams arriving from outside the editor
//! (storage, import files, the generation service).

use std::collections::HashSet;

use thiserror::Error;

use crate::catalog::Catalog;
use crate::config::ConfigError;
use crate::model::{Diagram, NODE_KIND};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Issue {
    #[error("duplicate node id '{0}'")]
    DuplicateNodeId(String),

    #[error("duplicate edge id '{0}'")]
    DuplicateEdgeId(String),

    #[error("edge '{edge}' references missing node '{endpoint}'")]
    DanglingEdge { edge: String, endpoint: String },

    #[error("node '{node}' has unknown component type '{component_type}'")]
    UnknownComponentType { node: String, component_type: String },

    #[error("node '{node}' has kind '{kind}', expected 'default'")]
    UnexpectedNodeKind { node: String, kind: String },

    #[error("node '{node}' has invalid config: {source}")]
    InvalidConfig {
        node: String,
        #[source]
        source: ConfigError,
    },
}

impl Issue {
    /// Structural issues break graph invariants and are never accepted. The rest are
    /// schema issues, which a stored diagram may carry (flagged, rendered degraded).
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Issue::DuplicateNodeId(_) | Issue::DuplicateEdgeId(_) | Issue::DanglingEdge { .. }
        )
    }
}

pub(crate) fn summarize(issues: &[Issue]) -> String {
    match issues {
        [] => "no issues".to_string(),
        [one] => one.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}

/// Collect every issue in `diagram`, in node order then edge order.
pub fn check(diagram: &Diagram, catalog: &Catalog) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut node_ids = HashSet::new();

    for node in &diagram.nodes {
        if !node_ids.insert(node.id.as_str()) {
            issues.push(Issue::DuplicateNodeId(node.id.clone()));
        }
        if node.kind != NODE_KIND {
            issues.push(Issue::UnexpectedNodeKind {
                node: node.id.clone(),
                kind: node.kind.clone(),
            });
        }
        match catalog.lookup(&node.data.component_type) {
            Some(schema) => {
                if let Err(source) = schema.check_config(&node.data.config) {
                    issues.push(Issue::InvalidConfig {
                        node: node.id.clone(),
                        source,
                    });
                }
            }
            None => issues.push(Issue::UnknownComponentType {
                node: node.id.clone(),
                component_type: node.data.component_type.clone(),
            }),
        }
    }

    let mut edge_ids = HashSet::new();
    for edge in &diagram.edges {
        if !edge_ids.insert(edge.id.as_str()) {
            issues.push(Issue::DuplicateEdgeId(edge.id.clone()));
        }
        for endpoint in [&edge.source, &edge.target] {
            if !node_ids.contains(endpoint.as_str()) {
                issues.push(Issue::DanglingEdge {
                    edge: edge.id.clone(),
                    endpoint: endpoint.clone(),
                });
            }
        }
    }

    issues
}
