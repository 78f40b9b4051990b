//! Pointer and keyboard events from the canvas, translated into editor mutations.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::editor::{Editor, EditorError, Selection};
use crate::model::Position;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum CanvasEvent {
    /// A palette entry was dropped at a canvas position.
    #[serde(rename_all = "camelCase")]
    Drop {
        component_type: String,
        position: Position,
    },
    /// The user dragged a connection from one node handle to another.
    Connect { source: String, target: String },
    NodeClick { id: String },
    EdgeClick { id: String },
    /// Click on empty canvas.
    PaneClick,
    NodeDragStop { id: String, position: Position },
    /// Delete key with something selected.
    DeleteSelection,
}

/// What a handled event did to the diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    NodeAdded(String),
    EdgeAdded(String),
    Selected(Selection),
    Moved(String),
    NodeDeleted { id: String, edges: usize },
    EdgeDeleted(String),
    Ignored,
}

impl Editor {
    pub fn handle(&mut self, event: CanvasEvent) -> Result<Effect, EditorError> {
        debug!(?event, "canvas event");
        match event {
            // Drags that carry no component payload are not ours.
            CanvasEvent::Drop { component_type, .. } if component_type.is_empty() => Ok(Effect::Ignored),
            CanvasEvent::Drop {
                component_type,
                position,
            } => {
                let node = self.add_node(&component_type, position)?;
                Ok(Effect::NodeAdded(node.id.clone()))
            }
            CanvasEvent::Connect { source, target } => {
                let edge = self.connect(&source, &target)?;
                Ok(Effect::EdgeAdded(edge.id.clone()))
            }
            CanvasEvent::NodeClick { id } => self.select_effect(Selection::Node(id)),
            CanvasEvent::EdgeClick { id } => self.select_effect(Selection::Edge(id)),
            CanvasEvent::PaneClick => self.select_effect(Selection::None),
            CanvasEvent::NodeDragStop { id, position } => {
                self.move_node(&id, position)?;
                Ok(Effect::Moved(id))
            }
            CanvasEvent::DeleteSelection => match self.selection().clone() {
                Selection::Node(id) => {
                    let (node, edges) = self.delete_node(&id)?;
                    Ok(Effect::NodeDeleted {
                        id: node.id,
                        edges: edges.len(),
                    })
                }
                Selection::Edge(id) => {
                    let edge = self.delete_edge(&id)?;
                    Ok(Effect::EdgeDeleted(edge.id))
                }
                Selection::None => Ok(Effect::Ignored),
            },
        }
    }

    fn select_effect(&mut self, selection: Selection) -> Result<Effect, EditorError> {
        self.select(selection.clone())?;
        Ok(Effect::Selected(selection))
    }
}
