pub mod engine;
mod parse;
mod prompt;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use architekt_core::{
    ai_configured, check, AiSettings, Catalog, DesignGenerator, Diagram, GatewayError,
    ValidationReport,
};

use crate::engine::LlmEngine;

#[derive(Debug, Error)]
pub enum GenError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("AI provider is not configured")]
    NotConfigured,

    #[error("build LLM: {0}")]
    Build(String),

    #[error("chat: {0}")]
    Chat(String),

    #[error("LLM returned no text")]
    EmptyReply,
}

impl From<GenError> for GatewayError {
    fn from(e: GenError) -> Self {
        GatewayError::Service(e.to_string())
    }
}

/// One system + user message exchange with a language model.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, system: &str, user_msg: &str) -> Result<String, GenError>;
}

/// `DesignGenerator` over any chat completion backend.
pub struct Generator<C> {
    completion: C,
    catalog: &'static Catalog,
}

impl<C: Completion> Generator<C> {
    pub fn new(completion: C) -> Self {
        Self::with_catalog(completion, Catalog::builtin())
    }

    pub fn with_catalog(completion: C, catalog: &'static Catalog) -> Self {
        Self { completion, catalog }
    }

    /// Ask the model to judge `design_json` against `components_schema`. Input that is not
    /// JSON is answered locally without calling the model.
    pub async fn validate_json(
        &self,
        design_json: &str,
        components_schema: &str,
    ) -> Result<ValidationReport, GatewayError> {
        let parsed = serde_json::from_str::<serde_json::Value>(design_json)
            .and_then(|_| serde_json::from_str::<serde_json::Value>(components_schema));
        if let Err(e) = parsed {
            return Ok(ValidationReport {
                is_valid: false,
                validation_feedback: format!("The design JSON or schema JSON is not valid JSON: {e}"),
            });
        }

        let raw = self
            .completion
            .complete(
                &prompt::validation_system(),
                &prompt::validation_user(design_json, components_schema),
            )
            .await?;
        debug!(reply_len = raw.len(), "validation reply");
        parse::report(&raw)
    }
}

/// Fill parameters the model left out with their schema defaults.
fn fill_defaults(diagram: &mut Diagram, catalog: &Catalog) {
    for node in &mut diagram.nodes {
        if let Some(schema) = catalog.lookup(&node.data.component_type) {
            for param in &schema.config {
                node.data
                    .config
                    .entry(param.id.clone())
                    .or_insert_with(|| param.default_value.clone());
            }
        }
    }
}

#[async_trait]
impl<C: Completion> DesignGenerator for Generator<C> {
    async fn generate(&self, prompt: &str) -> Result<Diagram, GatewayError> {
        let system = prompt::generation_system(self.catalog);
        let user_msg = prompt::generation_user(prompt);

        let raw = self.completion.complete(&system, &user_msg).await?;
        debug!(reply_len = raw.len(), "generation reply");

        let mut diagram = parse::design(&raw)?;
        let issues = check(&diagram, self.catalog);
        if !issues.is_empty() {
            warn!(issues = issues.len(), "generated design failed checks");
            return Err(GatewayError::Rejected(issues));
        }
        fill_defaults(&mut diagram, self.catalog);

        info!(
            nodes = diagram.nodes.len(),
            edges = diagram.edges.len(),
            "design generated"
        );
        Ok(diagram)
    }

    async fn validate(&self, diagram: &Diagram) -> Result<ValidationReport, GatewayError> {
        let design_json =
            serde_json::to_string(diagram).map_err(|e| GatewayError::Malformed(e.to_string()))?;
        let schema_json = self
            .catalog
            .to_json()
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;
        self.validate_json(&design_json, &schema_json).await
    }
}

/// Build a generator from the user's settings, or `NotConfigured` when no usable
/// provider is set.
pub fn from_settings(settings: &AiSettings) -> Result<Generator<LlmEngine>, GenError> {
    if !ai_configured(settings) {
        return Err(GenError::NotConfigured);
    }
    let engine = LlmEngine::new(settings.clone())?;
    info!(provider = %settings.provider, model = %settings.model, "generation enabled");
    Ok(Generator::new(engine))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use architekt_core::{ConfigValue, Issue};

    /// Replies with a canned string and records what it was asked.
    struct Canned {
        reply: Result<String, String>,
        calls: AtomicUsize,
        last_user: Mutex<String>,
    }

    impl Canned {
        fn new(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
                last_user: Mutex::new(String::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                ..Self::new("")
            }
        }
    }

    #[async_trait]
    impl Completion for Canned {
        async fn complete(&self, _system: &str, user_msg: &str) -> Result<String, GenError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_user.lock().unwrap() = user_msg.to_string();
            self.reply.clone().map_err(GenError::Chat)
        }
    }

    const THREE_TIER: &str = r#"Sure! Here it is:
```json
{
  "nodes": [
    {"id": "dnd-node_1", "type": "default", "position": {"x": 250, "y": 0},
     "data": {"label": "Load Balancer", "type": "load-balancer", "config": {"algorithm": "least-connections"}}},
    {"id": "dnd-node_2", "type": "default", "position": {"x": 250, "y": 150},
     "data": {"label": "Web Server", "type": "web-server", "config": {}}},
    {"id": "dnd-node_3", "type": "default", "position": {"x": 250, "y": 300},
     "data": {"label": "PostgreSQL", "type": "database", "config": {"type": "PostgreSQL"}}}
  ],
  "edges": [
    {"id": "reactflow__edge-dnd-node_1-dnd-node_2", "source": "dnd-node_1", "target": "dnd-node_2"},
    {"id": "reactflow__edge-dnd-node_2-dnd-node_3", "source": "dnd-node_2", "target": "dnd-node_3"}
  ]
}
```"#;

    #[tokio::test]
    async fn three_tier_design_is_parsed_and_defaulted() {
        let generator = Generator::new(Canned::new(THREE_TIER));
        let diagram = generator
            .generate("a load balancer, a web server and a PostgreSQL database")
            .await
            .unwrap();

        let types: Vec<&str> = diagram.nodes.iter().map(|n| n.data.component_type.as_str()).collect();
        assert_eq!(types, ["load-balancer", "web-server", "database"]);
        assert_eq!(diagram.edges.len(), 2);

        let lb = &diagram.nodes[0].data.config;
        assert_eq!(lb.get("algorithm"), Some(&ConfigValue::from("least-connections")));
        let db = &diagram.nodes[2].data.config;
        assert_eq!(db.get("replicas"), Some(&ConfigValue::from(1)));

        let asked = generator.completion.last_user.lock().unwrap().clone();
        assert_eq!(asked, "Prompt: a load balancer, a web server and a PostgreSQL database");
    }

    #[tokio::test]
    async fn unknown_component_rejects_the_whole_design() {
        let reply = THREE_TIER.replace("\"web-server\"", "\"mainframe\"");
        let generator = Generator::new(Canned::new(&reply));
        let err = generator.generate("anything").await.unwrap_err();
        let GatewayError::Rejected(issues) = &err else {
            panic!("expected rejection, got {err:?}");
        };
        assert!(matches!(&issues[0], Issue::UnknownComponentType { component_type, .. } if component_type == "mainframe"));
    }

    #[tokio::test]
    async fn dangling_edge_rejects_the_whole_design() {
        let reply = THREE_TIER.replace("\"target\": \"dnd-node_3\"", "\"target\": \"dnd-node_9\"");
        let generator = Generator::new(Canned::new(&reply));
        assert!(matches!(
            generator.generate("anything").await,
            Err(GatewayError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn service_failure_surfaces_as_service_error() {
        let generator = Generator::new(Canned::failing("connection refused"));
        let err = generator.generate("anything").await.unwrap_err();
        assert!(matches!(err, GatewayError::Service(ref m) if m.contains("connection refused")));
    }

    #[tokio::test]
    async fn malformed_input_never_reaches_the_model() {
        let generator = Generator::new(Canned::new("{\"isValid\": true, \"validationFeedback\": \"ok\"}"));
        let report = generator.validate_json("{not json", "{}").await.unwrap();
        assert!(!report.is_valid);
        assert!(report
            .validation_feedback
            .starts_with("The design JSON or schema JSON is not valid JSON: "));
        assert_eq!(generator.completion.calls.load(Ordering::SeqCst), 0);

        let report = generator.validate_json("{}", "[oops").await.unwrap();
        assert!(!report.is_valid);
        assert_eq!(generator.completion.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn validate_sends_design_and_catalog() {
        let generator = Generator::new(Canned::new(
            "{\"isValid\": true, \"validationFeedback\": \"All components match the schema.\"}",
        ));
        let report = generator.validate(&Diagram::default()).await.unwrap();
        assert!(report.is_valid);
        assert_eq!(generator.completion.calls.load(Ordering::SeqCst), 1);

        let asked = generator.completion.last_user.lock().unwrap().clone();
        assert!(asked.starts_with("System Design:\n{\"nodes\":[],\"edges\":[]}"));
        assert!(asked.contains("\"load-balancer\""));
    }

    #[test]
    fn unconfigured_settings_build_nothing() {
        assert!(matches!(
            from_settings(&AiSettings::default()),
            Err(GenError::NotConfigured)
        ));
        let settings = AiSettings {
            provider: "ollama".into(),
            api_key: String::new(),
            model: "llama3".into(),
        };
        assert!(from_settings(&settings).is_ok());
    }
}
