//! Contract for the generation service: a text prompt in, a whole diagram out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::check::{summarize, Issue};
use crate::model::Diagram;

/// Verdict of the advisory validation call. Never blocks a load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub validation_feedback: String,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The service could not be reached or refused the request.
    #[error("generation service failed: {0}")]
    Service(String),

    /// The reply was not JSON, or not the expected shape.
    #[error("generation service returned a malformed reply: {0}")]
    Malformed(String),

    /// The reply parsed but describes an invalid diagram.
    #[error("generated design rejected: {}", summarize(.0))]
    Rejected(Vec<Issue>),
}

#[async_trait]
pub trait DesignGenerator: Send + Sync {
    /// Produce a complete diagram for `prompt`. The result has already passed every
    /// structural and schema check.
    async fn generate(&self, prompt: &str) -> Result<Diagram, GatewayError>;

    /// Ask the service to assess `diagram` against the component catalog.
    async fn validate(&self, diagram: &Diagram) -> Result<ValidationReport, GatewayError>;
}
