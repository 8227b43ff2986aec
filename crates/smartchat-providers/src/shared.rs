//! Provider-agnostic types and helpers shared across the three backends.

use std::fmt;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::ProviderKind;

/// Standard User-Agent header for smartchat API requests.
pub const USER_AGENT: &str = concat!("smartchat/", env!("CARGO_PKG_VERSION"));

/// Sampling temperature sent to providers whose wire shape carries one.
pub const TEMPERATURE: f64 = 0.7;

/// Output token cap sent with every request.
pub const MAX_TOKENS: u32 = 1000;

/// Env var that turns any request against a production endpoint into an error.
pub const BLOCK_REAL_API_ENV: &str = "SMARTCHAT_BLOCK_REAL_API";

/// Wraps the caller's context string for providers without a system role.
pub(crate) fn context_preamble(context: &str) -> String {
    format!("Context: {context}\n\nPlease use this context to provide more accurate responses.")
}

// ============================================================================
// Config resolution helpers
// ============================================================================

/// Resolves an API key with precedence: config > env.
///
/// # Errors
/// Returns an error if neither source provides a non-empty key.
pub fn resolve_api_key(
    config_api_key: Option<&str>,
    env_var: &str,
    config_section: &str,
) -> Result<String> {
    if let Some(key) = config_api_key {
        let trimmed = key.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }

    std::env::var(env_var).context(format!(
        "No API key available. Set {env_var} or api_key in [providers.{config_section}]."
    ))
}

/// Resolves a base URL with precedence: env > config > default.
///
/// # Errors
/// Returns an error if the selected URL does not parse.
pub fn resolve_base_url(
    config_base_url: Option<&str>,
    env_var: &str,
    default_url: &str,
    provider_name: &str,
) -> Result<String> {
    if let Ok(env_url) = std::env::var(env_var) {
        let trimmed = env_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed, provider_name)?;
            return Ok(trimmed.to_string());
        }
    }

    if let Some(config_url) = config_base_url {
        let trimmed = config_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed, provider_name)?;
            return Ok(trimmed.to_string());
        }
    }

    Ok(default_url.to_string())
}

fn validate_url(url: &str, provider_name: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid {provider_name} base URL: {url}"))?;
    Ok(())
}

// ============================================================================
// Errors
// ============================================================================

/// Categories of provider errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// Provider discriminator outside the supported set
    UnsupportedProvider,
    /// Unusable client configuration (bad base URL, blocked endpoint)
    Config,
    /// HTTP status error (4xx, 5xx)
    HttpStatus,
    /// Connection timeout or request timeout
    Timeout,
    /// Any other transport failure where no response arrived
    Network,
    /// Response body missing or not in the expected shape
    Parse,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderErrorKind::UnsupportedProvider => write!(f, "unsupported_provider"),
            ProviderErrorKind::Config => write!(f, "config"),
            ProviderErrorKind::HttpStatus => write!(f, "http_status"),
            ProviderErrorKind::Timeout => write!(f, "timeout"),
            ProviderErrorKind::Network => write!(f, "network"),
            ProviderErrorKind::Parse => write!(f, "parse"),
        }
    }
}

/// Structured error from the provider with kind and details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderError {
    /// Error category
    pub kind: ProviderErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn unsupported_provider(provider: &str) -> Self {
        Self::new(
            ProviderErrorKind::UnsupportedProvider,
            format!("Unsupported provider: {provider}"),
        )
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Config, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Parse, message)
    }

    /// Creates an HTTP status error qualified with the provider label.
    ///
    /// Prefers `error.message` from a JSON body, then the status reason phrase.
    pub fn http_status(provider_label: &str, status: StatusCode, body: &str) -> Self {
        let reason = error_message_from_body(body)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        let details = (!body.is_empty()).then(|| body.to_string());

        Self {
            kind: ProviderErrorKind::HttpStatus,
            message: format!("{provider_label} API error: {reason}"),
            details,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProviderError {}

/// Result type for provider operations.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

fn error_message_from_body(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    json.get("error")?
        .get("message")?
        .as_str()
        .filter(|msg| !msg.is_empty())
        .map(str::to_string)
}

pub(crate) fn classify_reqwest_error(e: &reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::new(ProviderErrorKind::Timeout, format!("Request timed out: {e}"))
    } else if e.is_connect() {
        ProviderError::new(ProviderErrorKind::Network, format!("Connection failed: {e}"))
    } else if e.is_request() {
        ProviderError::new(ProviderErrorKind::Network, format!("Request error: {e}"))
    } else {
        ProviderError::new(ProviderErrorKind::Network, format!("Network error: {e}"))
    }
}

/// Sends a JSON body and decodes the success payload.
///
/// Non-2xx responses become provider-qualified `HttpStatus` errors.
pub(crate) async fn send_json<B, R>(
    builder: reqwest::RequestBuilder,
    body: &B,
    provider: ProviderKind,
) -> ProviderResult<R>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = builder
        .header("user-agent", USER_AGENT)
        .json(body)
        .send()
        .await
        .map_err(|e| classify_reqwest_error(&e))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| classify_reqwest_error(&e))?;

    if !status.is_success() {
        warn!(
            provider = provider.id(),
            status = status.as_u16(),
            "provider returned an error status"
        );
        return Err(ProviderError::http_status(provider.label(), status, &text));
    }

    serde_json::from_str(&text).map_err(|e| {
        ProviderError::parse(format!("{} returned malformed JSON: {e}", provider.label()))
            .with_details(text)
    })
}

/// Fails when `SMARTCHAT_BLOCK_REAL_API=1` and the request targets a production endpoint.
pub(crate) fn ensure_endpoint_allowed(provider: ProviderKind, base_url: &str) -> ProviderResult<()> {
    let blocked = std::env::var(BLOCK_REAL_API_ENV).is_ok_and(|v| v == "1");
    if blocked && targets_production(provider, base_url) {
        return Err(ProviderError::config(format!(
            "{BLOCK_REAL_API_ENV}=1 but trying to use the production {} API. \
             Set {} to a mock server.",
            provider.label(),
            provider.base_url_env_var()
        )));
    }
    Ok(())
}

/// Whether `base_url` points at the provider's production host.
///
/// Compares parsed hosts, so trailing slashes, case and extra path segments
/// do not matter. An unparseable URL is treated as production.
fn targets_production(provider: ProviderKind, base_url: &str) -> bool {
    let host = |raw: &str| {
        url::Url::parse(raw)
            .ok()
            .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
    };

    match (host(base_url), host(provider.default_base_url())) {
        (Some(target), Some(production)) => target == production,
        _ => true,
    }
}
