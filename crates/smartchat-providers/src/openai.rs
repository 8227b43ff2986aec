//! OpenAI Chat Completions wire shape.
//!
//! The context string travels as a leading `system` message.

use serde::{Deserialize, Serialize};
use smartchat_types::{Message, Role};

use crate::shared::{MAX_TOKENS, ProviderError, ProviderResult, TEMPERATURE, send_json};
use crate::{ClientConfig, ProviderKind};

/// Default base URL for the OpenAI API.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatCompletionMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatCompletionMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
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
    context: &'a str,
) -> ChatCompletionRequest<'a> {
    let mut messages = Vec::with_capacity(transcript.len() + 1);

    if !context.is_empty() {
        messages.push(ChatCompletionMessage {
            role: "system",
            content: context,
        });
    }

    messages.extend(transcript.iter().map(|msg| ChatCompletionMessage {
        role: api_role(msg.role()),
        content: msg.content(),
    }));

    ChatCompletionRequest {
        model,
        messages,
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
    }
}

/// Extracts `choices[0].message.content`.
pub(crate) fn extract_text(response: ChatCompletionResponse) -> ProviderResult<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| ProviderError::parse("OpenAI response missing choices[0].message.content"))
}

pub(crate) async fn generate(
    http: &reqwest::Client,
    config: &ClientConfig,
    transcript: &[Message],
    context: &str,
) -> ProviderResult<String> {
    let request = build_request(&config.model, transcript, context);
    let url = format!("{}{}", config.base_url, CHAT_COMPLETIONS_PATH);

    let builder = http
        .post(&url)
        .header("Authorization", format!("Bearer {}", config.api_key));

    let response: ChatCompletionResponse = send_json(builder, &request, ProviderKind::OpenAI).await?;
    extract_text(response)
}
