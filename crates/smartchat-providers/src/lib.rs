//! Provider adapter for hosted chat models.
//!
//! Encodes a transcript of [`Message`]s into the request shape of one of three
//! providers (OpenAI chat completions, Anthropic messages, Gemini
//! generateContent), performs the call, and extracts the generated text.
//!
//! The provider set is closed: [`ProviderKind`] has one variant per backend
//! and each backend module owns its request builder and response extractor.

pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod shared;

use std::fmt;
use std::str::FromStr;

use smartchat_types::Message;
use tracing::debug;

pub use shared::{
    MAX_TOKENS, ProviderError, ProviderErrorKind, ProviderResult, TEMPERATURE, USER_AGENT,
    resolve_api_key, resolve_base_url,
};

/// The supported providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAI,
    Anthropic,
    Gemini,
}

impl ProviderKind {
    /// Returns all provider kinds.
    pub fn all() -> &'static [ProviderKind] {
        &[
            ProviderKind::OpenAI,
            ProviderKind::Anthropic,
            ProviderKind::Gemini,
        ]
    }

    /// Returns the string identifier used in config files and on the command line.
    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
        }
    }

    /// Returns the `ProviderKind` for a given id string.
    pub fn from_id(id: &str) -> Option<ProviderKind> {
        match id.trim().to_lowercase().as_str() {
            "openai" => Some(ProviderKind::OpenAI),
            "anthropic" => Some(ProviderKind::Anthropic),
            "gemini" => Some(ProviderKind::Gemini),
            _ => None,
        }
    }

    /// Returns the human-readable label used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OpenAI",
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::Gemini => "Gemini",
        }
    }

    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
        }
    }

    pub fn base_url_env_var(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OPENAI_BASE_URL",
            ProviderKind::Anthropic => "ANTHROPIC_BASE_URL",
            ProviderKind::Gemini => "GEMINI_BASE_URL",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => openai::DEFAULT_BASE_URL,
            ProviderKind::Anthropic => anthropic::DEFAULT_BASE_URL,
            ProviderKind::Gemini => gemini::DEFAULT_BASE_URL,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ProviderKind::from_id(value).ok_or_else(|| ProviderError::unsupported_provider(value))
    }
}

/// Everything needed to address one provider endpoint.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub kind: ProviderKind,
    pub api_key: String,
    /// Base URL without a trailing slash
    pub base_url: String,
    pub model: String,
}

impl ClientConfig {
    /// Creates a config pointing at the provider's production endpoint.
    pub fn new(kind: ProviderKind, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            kind,
            api_key: api_key.into(),
            base_url: kind.default_base_url().to_string(),
            model: model.into(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Stateless client for one provider endpoint.
///
/// Holds no per-conversation state; the same client can serve any number of
/// transcripts, concurrently or not.
pub struct ProviderClient {
    config: ClientConfig,
    http: reqwest::Client,
}

impl ProviderClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Sends the full transcript (plus optional context) and returns the reply text.
    ///
    /// An empty `context` adds nothing to the request.
    ///
    /// # Errors
    /// Returns a [`ProviderError`] for blocked endpoints, transport failures,
    /// non-2xx statuses, and responses without the expected text field.
    pub async fn generate_reply(
        &self,
        transcript: &[Message],
        context: &str,
    ) -> ProviderResult<String> {
        shared::ensure_endpoint_allowed(self.config.kind, &self.config.base_url)?;

        debug!(
            provider = self.config.kind.id(),
            model = %self.config.model,
            messages = transcript.len(),
            has_context = !context.is_empty(),
            "sending chat request"
        );

        match self.config.kind {
            ProviderKind::OpenAI => {
                openai::generate(&self.http, &self.config, transcript, context).await
            }
            ProviderKind::Anthropic => {
                anthropic::generate(&self.http, &self.config, transcript, context).await
            }
            ProviderKind::Gemini => {
                gemini::generate(&self.http, &self.config, transcript, context).await
            }
        }
    }
}

/// One-shot entry point: dispatches on the provider id string.
///
/// The base URL honors `<PROVIDER>_BASE_URL`, otherwise the production endpoint
/// is used. An unknown provider id fails before any network access.
///
/// # Errors
/// See [`ProviderClient::generate_reply`]; additionally
/// [`ProviderErrorKind::UnsupportedProvider`] for unknown ids.
pub async fn generate_reply(
    provider: &str,
    credential: &str,
    model: &str,
    transcript: &[Message],
    context: &str,
) -> ProviderResult<String> {
    let kind: ProviderKind = provider.parse()?;
    let base_url = resolve_base_url(
        None,
        kind.base_url_env_var(),
        kind.default_base_url(),
        kind.label(),
    )
    .map_err(|e| ProviderError::config(format!("{e:#}")))?;

    let config = ClientConfig::new(kind, credential, model).with_base_url(base_url);
    ProviderClient::new(config)
        .generate_reply(transcript, context)
        .await
}
