use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Environment variable overriding the architekt directory.
pub const HOME_ENV: &str = "ARCHITEKT_HOME";

/// Resolve the architekt directory: `$ARCHITEKT_HOME`, else `~/.architekt/`.
pub fn architekt_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".architekt")
}

// --- AI Settings ---

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    pub provider: String,
    pub api_key: String,
    pub model: String,
}

fn settings_path() -> PathBuf {
    architekt_dir().join("settings.json")
}

/// Read settings, falling back to defaults when the file is missing or unreadable.
pub fn read_settings() -> AiSettings {
    let path = settings_path();
    if !path.exists() {
        return AiSettings::default();
    }
    fs::read_to_string(&path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

pub fn ai_configured(settings: &AiSettings) -> bool {
    !settings.provider.is_empty()
        && !settings.model.is_empty()
        && (settings.provider == "ollama" || !settings.api_key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ollama_needs_no_key() {
        let settings = AiSettings {
            provider: "ollama".into(),
            api_key: String::new(),
            model: "llama3".into(),
        };
        assert!(ai_configured(&settings));
    }

    #[test]
    fn hosted_providers_need_a_key() {
        let mut settings = AiSettings {
            provider: "openai".into(),
            api_key: String::new(),
            model: "gpt-4o-mini".into(),
        };
        assert!(!ai_configured(&settings));
        settings.api_key = "sk-test".into();
        assert!(ai_configured(&settings));
        assert!(!ai_configured(&AiSettings::default()));
    }

    #[test]
    fn settings_use_camel_case_keys() {
        let parsed: AiSettings =
            serde_json::from_str(r#"{"provider":"anthropic","apiKey":"k","model":"m"}"#).unwrap();
        assert_eq!(parsed.api_key, "k");
    }
}
