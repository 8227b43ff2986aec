//! Anthropic Messages API wire shape.
//!
//! Context is sent as a leading `user` turn wrapped in a fixed preamble rather
//! than through the `system` field.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use smartchat_types::{Message, Role};

use crate::shared::{MAX_TOKENS, ProviderError, ProviderResult, context_preamble, send_json};
use crate::{ClientConfig, ProviderKind};

/// Default base URL for the Anthropic API.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

const MESSAGES_PATH: &str = "/v1/messages";
const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
pub(crate) struct MessagesRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: Cow<'a, str>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

fn api_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

pub(crate) fn build_request<'a>(
    model: &'a str,
    transcript: &'a [Message],
    context: &str,
) -> MessagesRequest<'a> {
    let mut messages = Vec::with_capacity(transcript.len() + 1);

    if !context.is_empty() {
        messages.push(ApiMessage {
            role: "user",
            content: Cow::Owned(context_preamble(context)),
        });
    }

    messages.extend(transcript.iter().map(|msg| ApiMessage {
        role: api_role(msg.role()),
        content: Cow::Borrowed(msg.content()),
    }));

    MessagesRequest {
        model,
        messages,
        max_tokens: MAX_TOKENS,
    }
}

/// Extracts `content[0].text`.
pub(crate) fn extract_text(response: MessagesResponse) -> ProviderResult<String> {
    response
        .content
        .into_iter()
        .next()
        .and_then(|block| block.text)
        .ok_or_else(|| ProviderError::parse("Anthropic response missing content[0].text"))
}

pub(crate) async fn generate(
    http: &reqwest::Client,
    config: &ClientConfig,
    transcript: &[Message],
    context: &str,
) -> ProviderResult<String> {
    let request = build_request(&config.model, transcript, context);
    let url = format!("{}{}", config.base_url, MESSAGES_PATH);

    let builder = http
        .post(&url)
        .header("x-api-key", &config.api_key)
        .header("anthropic-version", API_VERSION);

    let response: MessagesResponse = send_json(builder, &request, ProviderKind::Anthropic).await?;
    extract_text(response)
}
