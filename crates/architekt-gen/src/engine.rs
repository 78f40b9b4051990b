use async_trait::async_trait;
use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::ChatMessage;
use tracing::debug;

use architekt_core::AiSettings;

use crate::{Completion, GenError};

pub fn map_backend(provider: &str) -> Result<LLMBackend, GenError> {
    match provider {
        "openai" => Ok(LLMBackend::OpenAI),
        "anthropic" => Ok(LLMBackend::Anthropic),
        "google" => Ok(LLMBackend::Google),
        "ollama" => Ok(LLMBackend::Ollama),
        "groq" => Ok(LLMBackend::Groq),
        "mistral" => Ok(LLMBackend::Mistral),
        "deepseek" => Ok(LLMBackend::DeepSeek),
        other => Err(GenError::UnknownProvider(other.to_string())),
    }
}

/// Chat completion through the configured provider. A client is built per call so
/// settings changes apply without a restart.
#[derive(Debug, Clone)]
pub struct LlmEngine {
    settings: AiSettings,
}

impl LlmEngine {
    pub fn new(settings: AiSettings) -> Result<Self, GenError> {
        map_backend(&settings.provider)?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &AiSettings {
        &self.settings
    }
}

#[async_trait]
impl Completion for LlmEngine {
    async fn complete(&self, system: &str, user_msg: &str) -> Result<String, GenError> {
        let backend = map_backend(&self.settings.provider)?;

        let mut builder = LLMBuilder::new()
            .backend(backend)
            .model(&self.settings.model)
            .system(system);

        if !self.settings.api_key.is_empty() {
            builder = builder.api_key(&self.settings.api_key);
        }

        let llm = builder.build().map_err(|e| GenError::Build(e.to_string()))?;

        let messages = vec![ChatMessage::user().content(user_msg).build()];

        debug!(provider = %self.settings.provider, model = %self.settings.model, "sending chat");
        let response = llm
            .chat(&messages)
            .await
            .map_err(|e| GenError::Chat(e.to_string()))?;

        match response.text() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(GenError::EmptyReply),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_providers_map() {
        for provider in ["openai", "anthropic", "google", "ollama", "groq", "mistral", "deepseek"] {
            assert!(map_backend(provider).is_ok(), "{provider}");
        }
    }

    #[test]
    fn unknown_provider_is_refused_up_front() {
        let settings = AiSettings {
            provider: "clippy".into(),
            api_key: "k".into(),
            model: "m".into(),
        };
        assert!(matches!(
            LlmEngine::new(settings),
            Err(GenError::UnknownProvider(p)) if p == "clippy"
        ));
    }
}
