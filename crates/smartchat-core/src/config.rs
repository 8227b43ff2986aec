//! Configuration management for smartchat.
//!
//! Loads configuration from ${SMARTCHAT_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use smartchat_providers::{ProviderKind, resolve_api_key};

use crate::session::ChatSettings;

fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for smartchat configuration and data directories.
    //!
    //! SMARTCHAT_HOME resolution order:
    //! 1. SMARTCHAT_HOME environment variable (if set)
    //! 2. ~/.config/smartchat (default)

    use std::path::PathBuf;

    pub const HOME_ENV: &str = "SMARTCHAT_HOME";

    /// Returns the smartchat home directory.
    ///
    /// Falls back to `./.smartchat` when no home directory can be determined.
    pub fn smartchat_home() -> PathBuf {
        if let Ok(home) = std::env::var(HOME_ENV) {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".smartchat"),
            |h| h.join(".config").join("smartchat"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        smartchat_home().join("config.toml")
    }

    /// Returns the directory holding stored conversations.
    pub fn conversations_dir() -> PathBuf {
        smartchat_home().join("conversations")
    }
}

/// Per-provider connection overrides.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ProviderConfig {
    /// Optional API key (overrides environment variable).
    pub api_key: Option<String>,
    /// Optional API base URL (for proxies).
    pub base_url: Option<String>,
}

impl ProviderConfig {
    /// Returns the effective API key if set and non-empty.
    pub fn effective_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Returns the effective base URL if set and non-empty.
    pub fn effective_base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openai: ProviderConfig,
    pub anthropic: ProviderConfig,
    pub gemini: ProviderConfig,
}

impl ProvidersConfig {
    /// Returns the provider config for a given provider kind.
    pub fn get(&self, kind: ProviderKind) -> &ProviderConfig {
        match kind {
            ProviderKind::OpenAI => &self.openai,
            ProviderKind::Anthropic => &self.anthropic,
            ProviderKind::Gemini => &self.gemini,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Provider id: "openai", "anthropic" or "gemini"
    pub provider: String,

    /// Model identifier, passed through verbatim
    pub model: String,

    /// Optional background text sent with every request
    pub context: Option<String>,

    /// Strip markdown from replies
    pub clean_markdown: bool,

    /// Conversation used when none is given on the command line
    pub conversation_id: String,

    pub providers: ProvidersConfig,
}

impl Config {
    const DEFAULT_PROVIDER: &str = "openai";
    const DEFAULT_MODEL: &str = "gpt-4o-mini";
    const DEFAULT_CONVERSATION_ID: &str = "default";

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    ///
    /// # Errors
    /// Returns an error if the file exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Trimmed context, empty when unset.
    pub fn effective_context(&self) -> &str {
        self.context.as_deref().map_or("", str::trim)
    }

    /// Builds session settings for the configured provider.
    ///
    /// A missing API key is not an error here; the session reports it as a
    /// blocking notice instead.
    ///
    /// # Errors
    /// Returns an error if `provider` is not a supported id.
    pub fn chat_settings(&self) -> Result<ChatSettings> {
        let Some(kind) = ProviderKind::from_id(&self.provider) else {
            bail!(
                "Unsupported provider '{}' in config. Expected one of: openai, anthropic, gemini",
                self.provider
            );
        };
        let provider_config = self.providers.get(kind);
        let api_key = resolve_api_key(
            provider_config.effective_api_key(),
            kind.api_key_env_var(),
            kind.id(),
        )
        .unwrap_or_default();

        Ok(ChatSettings {
            provider: kind.id().to_string(),
            api_key,
            model: self.model.trim().to_string(),
            context: self.effective_context().to_string(),
            clean_markdown: self.clean_markdown,
            base_url: provider_config.effective_base_url().map(str::to_string),
        })
    }

    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Self::DEFAULT_PROVIDER.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            context: None,
            clean_markdown: true,
            conversation_id: Self::DEFAULT_CONVERSATION_ID.to_string(),
            providers: ProvidersConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nonexistent.toml")).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-4o-mini");
        assert!(config.clean_markdown);
        assert_eq!(config.conversation_id, "default");
    }

    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(
            &config_path,
            "provider = \"anthropic\"\nclean_markdown = false\n\n[providers.anthropic]\nbase_url = \"http://localhost:8080\"\n",
        )
        .unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.provider, "anthropic");
        assert_eq!(config.model, "gpt-4o-mini");
        assert!(!config.clean_markdown);
        assert_eq!(
            config.providers.anthropic.effective_base_url(),
            Some("http://localhost:8080")
        );
        assert_eq!(config.providers.openai, ProviderConfig::default());
    }

    #[test]
    fn test_load_invalid_toml_is_error() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "provider = [").unwrap();

        let err = Config::load_from(&config_path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_init_creates_parseable_template() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("subdir").join("config.toml");

        Config::init(&config_path).unwrap();

        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("gpt-4o-mini"));
        assert!(contents.contains("# context ="));
        assert_eq!(Config::load_from(&config_path).unwrap(), Config::default());
    }

    #[test]
    fn test_init_fails_if_exists() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "").unwrap();

        assert!(Config::init(&config_path).is_err());
    }

    #[test]
    fn test_chat_settings_prefers_config_api_key() {
        let config = Config {
            provider: "Gemini".to_string(),
            model: " gemini-1.5-pro ".to_string(),
            context: Some("  FAQ  ".to_string()),
            providers: ProvidersConfig {
                gemini: ProviderConfig {
                    api_key: Some(" from-config ".to_string()),
                    base_url: Some("http://localhost:9".to_string()),
                },
                ..Default::default()
            },
            ..Default::default()
        };

        let settings = config.chat_settings().unwrap();
        assert_eq!(settings.provider, "gemini");
        assert_eq!(settings.api_key, "from-config");
        assert_eq!(settings.model, "gemini-1.5-pro");
        assert_eq!(settings.context, "FAQ");
        assert_eq!(settings.base_url.as_deref(), Some("http://localhost:9"));
    }

    #[test]
    fn test_chat_settings_rejects_unknown_provider() {
        let config = Config {
            provider: "mistral".to_string(),
            ..Default::default()
        };
        let err = config.chat_settings().unwrap_err();
        assert!(err.to_string().contains("mistral"));
    }

    #[test]
    fn test_effective_context_blank_is_empty() {
        let config = Config {
            context: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.effective_context(), "");
    }
}
