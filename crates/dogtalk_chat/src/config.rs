//! LLM configuration.
//!
//! Resolution order:
//! 1. `<root>/.dogtalk/settings.json` (`defaultProvider`, `defaultModel`),
//!    with the API key taken from the provider's environment variable
//! 2. `OPENAI_API_KEY`, then `ANTHROPIC_API_KEY`
//!
//! `DOGTALK_LLM_MODEL` overrides the model in the environment path.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ChatError, ChatResult};

pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";
pub const ANTHROPIC_KEY_VAR: &str = "ANTHROPIC_API_KEY";
pub const MODEL_VAR: &str = "DOGTALK_LLM_MODEL";

/// LLM provider type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAI,
    Anthropic,
}

impl LlmProvider {
    /// Default model for the provider; both can read images.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAI => "gpt-4o",
            Self::Anthropic => "claude-sonnet-4-5",
        }
    }

    pub fn key_var(&self) -> &'static str {
        match self {
            Self::OpenAI => OPENAI_KEY_VAR,
            Self::Anthropic => ANTHROPIC_KEY_VAR,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
        }
    }
}

/// Contents of `.dogtalk/settings.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<LlmProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl Settings {
    /// Path of the settings file for a workspace
    pub fn path(workspace_root: &Path) -> PathBuf {
        workspace_root.join(".dogtalk").join("settings.json")
    }

    /// Load settings; a missing file means defaults.
    pub fn load(workspace_root: &Path) -> ChatResult<Self> {
        let path = Self::path(workspace_root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let settings = serde_json::from_str(&content)
            .map_err(|e| ChatError::Config(format!("invalid {:?}: {}", path, e)))?;
        Ok(settings)
    }

    pub fn save(&self, workspace_root: &Path) -> ChatResult<()> {
        let path = Self::path(workspace_root);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Everything needed to talk to an LLM
#[derive(Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: String,
    pub model: String,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("api_key", &"***")
            .field("model", &self.model)
            .finish()
    }
}

impl LlmConfig {
    pub fn new(provider: LlmProvider, api_key: impl Into<String>, model: Option<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: model.unwrap_or_else(|| provider.default_model().to_string()),
        }
    }

    /// Resolve from settings and an environment lookup.
    pub fn resolve<F>(settings: &Settings, env: F) -> ChatResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key_for = |provider: LlmProvider| env(provider.key_var()).filter(|k| !k.is_empty());

        if let Some(provider) = settings.default_provider {
            let key = key_for(provider).ok_or(ChatError::LlmNotConfigured)?;
            return Ok(Self::new(provider, key, settings.default_model.clone()));
        }

        let model = env(MODEL_VAR)
            .filter(|m| !m.is_empty())
            .or_else(|| settings.default_model.clone());
        for provider in [LlmProvider::OpenAI, LlmProvider::Anthropic] {
            if let Some(key) = key_for(provider) {
                return Ok(Self::new(provider, key, model));
            }
        }

        Err(ChatError::LlmNotConfigured)
    }

    /// Resolve from the process environment only.
    pub fn from_env() -> ChatResult<Self> {
        Self::resolve(&Settings::default(), |name| std::env::var(name).ok())
    }

    /// Resolve from workspace settings, falling back to the environment.
    pub fn from_workspace(workspace_root: &Path) -> ChatResult<Self> {
        let settings = Settings::load(workspace_root).unwrap_or_else(|e| {
            warn!("Ignoring workspace settings: {}", e);
            Settings::default()
        });
        let config = Self::resolve(&settings, |name| std::env::var(name).ok())?;
        debug!(provider = ?config.provider, model = %config.model, "Resolved LLM config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_no_keys() {
        let result = LlmConfig::resolve(&Settings::default(), env_of(&[]));
        assert!(matches!(result, Err(ChatError::LlmNotConfigured)));

        let result = LlmConfig::resolve(&Settings::default(), env_of(&[(OPENAI_KEY_VAR, "")]));
        assert!(matches!(result, Err(ChatError::LlmNotConfigured)));
    }

    #[test]
    fn test_env_prefers_openai() {
        let env = env_of(&[(OPENAI_KEY_VAR, "sk-1"), (ANTHROPIC_KEY_VAR, "sk-2")]);
        let config = LlmConfig::resolve(&Settings::default(), env).unwrap();
        assert_eq!(config.provider, LlmProvider::OpenAI);
        assert_eq!(config.model, "gpt-4o");

        let env = env_of(&[(ANTHROPIC_KEY_VAR, "sk-2"), (MODEL_VAR, "claude-haiku-4-5")]);
        let config = LlmConfig::resolve(&Settings::default(), env).unwrap();
        assert_eq!(config.provider, LlmProvider::Anthropic);
        assert_eq!(config.model, "claude-haiku-4-5");
    }

    #[test]
    fn test_settings_pick_provider() {
        let settings = Settings {
            default_provider: Some(LlmProvider::Anthropic),
            default_model: None,
        };
        let env = env_of(&[(OPENAI_KEY_VAR, "sk-1"), (ANTHROPIC_KEY_VAR, "sk-2")]);
        let config = LlmConfig::resolve(&settings, env).unwrap();
        assert_eq!(config.provider, LlmProvider::Anthropic);
        assert_eq!(config.api_key, "sk-2");

        // Chosen provider without a key does not fall back
        let result = LlmConfig::resolve(&settings, env_of(&[(OPENAI_KEY_VAR, "sk-1")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_file_round_trip() {
        let temp = tempdir().unwrap();
        assert_eq!(Settings::load(temp.path()).unwrap(), Settings::default());

        let settings = Settings {
            default_provider: Some(LlmProvider::OpenAI),
            default_model: Some("gpt-4o-mini".to_string()),
        };
        settings.save(temp.path()).unwrap();

        let raw = std::fs::read_to_string(Settings::path(temp.path())).unwrap();
        assert!(raw.contains("\"defaultProvider\": \"openai\""));
        assert_eq!(Settings::load(temp.path()).unwrap(), settings);
    }

    #[test]
    fn test_debug_hides_key() {
        let config = LlmConfig::new(LlmProvider::OpenAI, "sk-secret", None);
        assert!(!format!("{:?}", config).contains("sk-secret"));
    }
}
