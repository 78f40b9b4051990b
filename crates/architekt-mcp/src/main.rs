use std::fmt::Display;
use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use architekt_core::{
    Catalog, ConfigMap, EdgeStyleUpdate, FileStore, NoticeLevel, Position, Selection, Session,
};

/// Environment variable naming the owner whose designs this server reads and writes.
const OWNER_ENV: &str = "ARCHITEKT_OWNER";
const DEFAULT_OWNER: &str = "local";

// --- Request types ---

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct AddNodeRequest {
    /// Component type tag from list_components, e.g. "load-balancer", "database"
    component_type: String,
    /// X position on canvas. Default: 0
    x: Option<f64>,
    /// Y position on canvas. Default: 0
    y: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct ConnectRequest {
    /// Source node ID (e.g. "dnd-node_1")
    source: String,
    /// Target node ID
    target: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct UpdateNodeConfigRequest {
    /// ID of the node to configure
    node_id: String,
    /// The complete new config: parameter id to value. Replaces the old config wholesale. Keys must be parameters of the node's component; enum values must be one of the listed options.
    config: ConfigMap,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SetConfigFieldRequest {
    /// ID of the node to configure
    node_id: String,
    /// Parameter id, e.g. "ttl"
    field_id: String,
    /// New value as typed into the panel. Numbers are parsed; options must match exactly.
    value: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct UpdateEdgeStyleRequest {
    /// ID of the edge to restyle
    edge_id: String,
    /// Render the pathway animated. Omit to leave unchanged.
    animated: Option<bool>,
    /// Render the pathway dashed. Omit to leave unchanged.
    dashed: Option<bool>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct MoveNodeRequest {
    /// ID of the node to move
    node_id: String,
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct RenameNodeRequest {
    /// ID of the node to rename
    node_id: String,
    /// New display label
    label: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct NodeIdRequest {
    /// ID of the node
    node_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct EdgeIdRequest {
    /// ID of the edge
    edge_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SelectRequest {
    /// "node", "edge" or "none"
    kind: String,
    /// ID of the node or edge. Omit for "none".
    id: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct ImportDesignRequest {
    /// Export file contents: a JSON object with "nodes" and "edges" arrays
    data: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SaveDesignRequest {
    /// Display name for the saved design. Default: "Untitled Design"
    name: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct LoadDesignRequest {
    /// ID of a saved design, as returned by list_designs
    design_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct GenerateDesignRequest {
    /// Plain-language description of the desired architecture
    prompt: String,
}

// --- Server ---

#[derive(Clone)]
pub struct ArchitektServer {
    session: Arc<Session>,
    tool_router: ToolRouter<Self>,
}

fn json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("Serialization error: {e}"))
}

fn fail(e: impl Display) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
}

#[tool_router]
impl ArchitektServer {
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(session),
            tool_router: Self::tool_router(),
        }
    }

    /// Success result followed by any notices the session raised.
    fn reply(&self, text: String) -> Result<CallToolResult, McpError> {
        let mut content = vec![Content::text(text)];
        for notice in self.session.take_notices() {
            let level = match notice.level {
                NoticeLevel::Info => "info",
                NoticeLevel::Error => "error",
            };
            content.push(Content::text(format!(
                "[{level}] {}: {}",
                notice.title, notice.description
            )));
        }
        Ok(CallToolResult::success(content))
    }

    /// Error result followed by any notices the session raised.
    fn reply_error(&self, e: impl Display) -> Result<CallToolResult, McpError> {
        let mut content = vec![Content::text(e.to_string())];
        for notice in self.session.take_notices() {
            content.push(Content::text(format!("{}: {}", notice.title, notice.description)));
        }
        Ok(CallToolResult::error(content))
    }

    #[tool(
        description = "List every component type in the palette with its label, description, colour and config parameters (id, label, type string|number|enum, options, defaultValue)."
    )]
    fn list_components(&self) -> Result<CallToolResult, McpError> {
        let palette: Vec<_> = Catalog::builtin().palette().collect();
        Ok(CallToolResult::success(vec![Content::text(json(&palette))]))
    }

    #[tool(
        description = "Get the current design. Returns {nodes: [{id, type, position, data: {label, type, config}, style}], edges: [{id, source, target, animated?, style?}], selection}."
    )]
    fn get_design(&self) -> Result<CallToolResult, McpError> {
        let editor = self.session.editor();
        let body = serde_json::json!({
            "nodes": editor.diagram().nodes,
            "edges": editor.diagram().edges,
            "selection": editor.selection(),
        });
        Ok(CallToolResult::success(vec![Content::text(json(&body))]))
    }

    #[tool(description = "Place a new component on the canvas, seeded with its default config")]
    fn add_node(
        &self,
        Parameters(req): Parameters<AddNodeRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut editor = self.session.editor();
        let position = Position::new(req.x.unwrap_or(0.0), req.y.unwrap_or(0.0));
        match editor.add_node(&req.component_type, position) {
            Ok(node) => Ok(CallToolResult::success(vec![Content::text(json(node))])),
            Err(e) => fail(format!("{e}. Use list_components to see valid types.")),
        }
    }

    #[tool(description = "Draw a pathway (directed edge) from one node to another")]
    fn connect(
        &self,
        Parameters(req): Parameters<ConnectRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut editor = self.session.editor();
        match editor.connect(&req.source, &req.target) {
            Ok(edge) => Ok(CallToolResult::success(vec![Content::text(json(edge))])),
            Err(e) => fail(e),
        }
    }

    #[tool(description = "Replace a node's config. Rejected without change if any key or value does not fit the component's schema.")]
    fn update_node_config(
        &self,
        Parameters(req): Parameters<UpdateNodeConfigRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut editor = self.session.editor();
        match editor.update_node_config(&req.node_id, req.config) {
            Ok(()) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Updated config of {}",
                req.node_id
            ))])),
            Err(e) => fail(e),
        }
    }

    #[tool(description = "Set one config field of a node from text, as the config panel does")]
    fn set_config_field(
        &self,
        Parameters(req): Parameters<SetConfigFieldRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut editor = self.session.editor();
        match editor.edit_field(&req.node_id, &req.field_id, &req.value) {
            Ok(()) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Set {}.{} = {}",
                req.node_id, req.field_id, req.value
            ))])),
            Err(e) => fail(e),
        }
    }

    #[tool(description = "Toggle a pathway's animated and dashed rendering")]
    fn update_edge_style(
        &self,
        Parameters(req): Parameters<UpdateEdgeStyleRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut editor = self.session.editor();
        let update = EdgeStyleUpdate {
            animated: req.animated,
            dashed: req.dashed,
        };
        match editor.update_edge_style(&req.edge_id, update) {
            Ok(()) => match editor.diagram().edge(&req.edge_id) {
                Some(edge) => Ok(CallToolResult::success(vec![Content::text(json(edge))])),
                None => fail(format!("Edge '{}' not found", req.edge_id)),
            },
            Err(e) => fail(e),
        }
    }

    #[tool(description = "Move a node to a new canvas position")]
    fn move_node(
        &self,
        Parameters(req): Parameters<MoveNodeRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut editor = self.session.editor();
        match editor.move_node(&req.node_id, Position::new(req.x, req.y)) {
            Ok(()) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Moved {} to ({}, {})",
                req.node_id, req.x, req.y
            ))])),
            Err(e) => fail(e),
        }
    }

    #[tool(description = "Change a node's display label")]
    fn rename_node(
        &self,
        Parameters(req): Parameters<RenameNodeRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut editor = self.session.editor();
        match editor.rename_node(&req.node_id, &req.label) {
            Ok(()) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Renamed {} to \"{}\"",
                req.node_id, req.label
            ))])),
            Err(e) => fail(e),
        }
    }

    #[tool(description = "Delete a node and every pathway touching it")]
    fn delete_node(
        &self,
        Parameters(req): Parameters<NodeIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut editor = self.session.editor();
        match editor.delete_node(&req.node_id) {
            Ok((node, edges)) => {
                let removed: Vec<&str> = edges.iter().map(|e| e.id.as_str()).collect();
                let text = if removed.is_empty() {
                    format!("Deleted {}", node.id)
                } else {
                    format!("Deleted {} and edges: {}", node.id, removed.join(", "))
                };
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => fail(e),
        }
    }

    #[tool(description = "Delete a single pathway")]
    fn delete_edge(
        &self,
        Parameters(req): Parameters<EdgeIdRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut editor = self.session.editor();
        match editor.delete_edge(&req.edge_id) {
            Ok(edge) => Ok(CallToolResult::success(vec![Content::text(format!(
                "Deleted {}",
                edge.id
            ))])),
            Err(e) => fail(e),
        }
    }

    #[tool(description = "Select a node or edge for the config panel, or clear the selection")]
    fn select(
        &self,
        Parameters(req): Parameters<SelectRequest>,
    ) -> Result<CallToolResult, McpError> {
        let selection = match (req.kind.as_str(), req.id) {
            ("none", _) => Selection::None,
            ("node", Some(id)) => Selection::Node(id),
            ("edge", Some(id)) => Selection::Edge(id),
            (kind @ ("node" | "edge"), None) => return fail(format!("Selecting a {kind} needs an id")),
            (other, _) => return fail(format!("Unknown selection kind '{other}'. Use node, edge or none.")),
        };
        let mut editor = self.session.editor();
        match editor.select(selection) {
            Ok(()) => Ok(CallToolResult::success(vec![Content::text(json(editor.selection()))])),
            Err(e) => fail(e),
        }
    }

    #[tool(
        description = "Get the config panel for the current selection: the node's fields (id, label, input kind, options, current value) or the edge's animated/dashed toggles."
    )]
    fn get_config_panel(&self) -> Result<CallToolResult, McpError> {
        let editor = self.session.editor();
        let panel = match editor.selection().clone() {
            Selection::Node(id) => editor.node_panel(&id).map(|p| json(&p)),
            Selection::Edge(id) => editor.edge_panel(&id).map(|p| json(&p)),
            Selection::None => {
                return Ok(CallToolResult::success(vec![Content::text(
                    "Nothing selected. Use select first.",
                )]));
            }
        };
        match panel {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => fail(e),
        }
    }

    #[tool(description = "Export the design as the architekt-design.json file body")]
    fn export_design(&self) -> Result<CallToolResult, McpError> {
        match self.session.export() {
            Ok(body) => self.reply(body),
            Err(e) => self.reply_error(e),
        }
    }

    #[tool(
        description = "Replace the design with an export file. Structural problems (duplicate ids, edges to missing nodes) reject it; schema problems are reported but kept."
    )]
    fn import_design(
        &self,
        Parameters(req): Parameters<ImportDesignRequest>,
    ) -> Result<CallToolResult, McpError> {
        match self.session.import(&req.data) {
            Ok(issues) if issues.is_empty() => self.reply("Design imported".to_string()),
            Ok(issues) => {
                let lines: Vec<String> = issues.iter().map(|i| format!("- {i}")).collect();
                self.reply(format!("Design imported with issues:\n{}", lines.join("\n")))
            }
            Err(e) => self.reply_error(e),
        }
    }

    #[tool(description = "Save a snapshot of the current design. Returns the new design id.")]
    async fn save_design(
        &self,
        Parameters(req): Parameters<SaveDesignRequest>,
    ) -> Result<CallToolResult, McpError> {
        match self.session.save(req.name.as_deref()).await {
            Ok(id) => self.reply(id),
            Err(e) => self.reply_error(e),
        }
    }

    #[tool(description = "List saved designs, newest first (at most 50)")]
    async fn list_designs(&self) -> Result<CallToolResult, McpError> {
        match self.session.list().await {
            Ok(designs) if designs.is_empty() => {
                self.reply("No saved designs. Use save_design to create one.".to_string())
            }
            Ok(designs) => self.reply(json(&designs)),
            Err(e) => self.reply_error(e),
        }
    }

    #[tool(
        description = "Replace the current design with a saved one, then run advisory validation if a generation service is configured"
    )]
    async fn load_design(
        &self,
        Parameters(req): Parameters<LoadDesignRequest>,
    ) -> Result<CallToolResult, McpError> {
        match self.session.load(&req.design_id).await {
            Ok(issues) if issues.is_empty() => self.reply(format!("Loaded {}", req.design_id)),
            Ok(issues) => {
                let lines: Vec<String> = issues.iter().map(|i| format!("- {i}")).collect();
                self.reply(format!(
                    "Loaded {} with issues:\n{}",
                    req.design_id,
                    lines.join("\n")
                ))
            }
            Err(e) => self.reply_error(e),
        }
    }

    #[tool(
        description = "Generate a complete design from a plain-language prompt and replace the current one. Nothing changes if the service fails or returns an invalid design."
    )]
    async fn generate_design(
        &self,
        Parameters(req): Parameters<GenerateDesignRequest>,
    ) -> Result<CallToolResult, McpError> {
        match self.session.generate(&req.prompt).await {
            Ok(()) => {
                let summary = {
                    let editor = self.session.editor();
                    format!(
                        "Generated {} nodes and {} edges",
                        editor.diagram().nodes.len(),
                        editor.diagram().edges.len()
                    )
                };
                self.reply(summary)
            }
            Err(e) => self.reply_error(e),
        }
    }

    #[tool(description = "Ask the generation service whether the current design fits the component catalog")]
    async fn validate_design(&self) -> Result<CallToolResult, McpError> {
        match self.session.validate().await {
            Ok(report) => Ok(CallToolResult::success(vec![Content::text(json(&report))])),
            Err(e) => fail(e),
        }
    }
}

#[tool_handler]
impl ServerHandler for ArchitektServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

const INSTRUCTIONS: &str = r#"architekt is a system architecture diagram editor. A design is a directed graph of infrastructure components (nodes) joined by pathways (edges).

## Components
Call `list_components` for the palette. Each component has a type tag (e.g. "load-balancer", "web-server", "database", "client-device"), a label, a colour and typed config parameters (string, number, or enum with fixed options).

## Editing
- `add_node` places a component with its default config. Node IDs look like "dnd-node_N", edge IDs like "dnd-edge_N".
- `connect` draws a pathway. Self-loops and parallel pathways are allowed.
- `update_node_config` replaces a node's config wholesale; `set_config_field` changes one field from text. Values outside the schema are rejected.
- `update_edge_style` toggles animated/dashed rendering.
- `delete_node` also removes every pathway touching the node.
- `select` + `get_config_panel` show what the side panel would show.

## Designs
- `save_design`, `list_designs`, `load_design` keep named snapshots.
- `export_design` / `import_design` move designs as JSON files.
- `generate_design` replaces the whole design from a prompt; `validate_design` asks for an advisory review. Both need an AI provider in settings.json."#;

fn init_tracing() {
    // stdout carries the MCP transport, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

fn build_session() -> Session {
    let owner = std::env::var(OWNER_ENV)
        .ok()
        .filter(|o| !o.is_empty())
        .unwrap_or_else(|| DEFAULT_OWNER.to_string());
    let store = FileStore::open_default();
    info!(%owner, root = %store.root().display(), "opening design store");

    let session = Session::new(owner, Arc::new(store));
    let settings = architekt_core::read_settings();
    match architekt_gen::from_settings(&settings) {
        Ok(generator) => session.with_generator(Arc::new(generator)),
        Err(e) => {
            warn!(error = %e, "design generation disabled");
            session
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let service = ArchitektServer::new(build_session())
        .serve(rmcp::transport::io::stdio())
        .await
        .inspect_err(|e| tracing::error!("MCP server error: {e}"))?;
    service.waiting().await?;
    Ok(())
}
