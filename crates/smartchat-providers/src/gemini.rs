//! Gemini generateContent wire shape.
//!
//! The model id is part of the request path and the API key is sent as the
//! `key` query parameter. Assistant turns use the `model` role.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use smartchat_types::{Message, Role};

use crate::shared::{
    MAX_TOKENS, ProviderError, ProviderResult, TEMPERATURE, context_preamble, send_json,
};
use crate::{ClientConfig, ProviderKind};

/// Default base URL for the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: Cow<'a, str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn api_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

fn text_turn<'a>(role: &'static str, text: Cow<'a, str>) -> Content<'a> {
    Content {
        role,
        parts: vec![Part { text }],
    }
}

pub(crate) fn build_request<'a>(
    transcript: &'a [Message],
    context: &str,
) -> GenerateContentRequest<'a> {
    let mut contents = Vec::with_capacity(transcript.len() + 1);

    if !context.is_empty() {
        contents.push(text_turn("user", Cow::Owned(context_preamble(context))));
    }

    contents.extend(
        transcript
            .iter()
            .map(|msg| text_turn(api_role(msg.role()), Cow::Borrowed(msg.content()))),
    );

    GenerateContentRequest {
        contents,
        generation_config: GenerationConfig {
            temperature: TEMPERATURE,
            max_output_tokens: MAX_TOKENS,
        },
    }
}

/// Extracts `candidates[0].content.parts[0].text`.
pub(crate) fn extract_text(response: GenerateContentResponse) -> ProviderResult<String> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or_else(|| {
            ProviderError::parse("Gemini response missing candidates[0].content.parts[0].text")
        })
}

pub(crate) async fn generate(
    http: &reqwest::Client,
    config: &ClientConfig,
    transcript: &[Message],
    context: &str,
) -> ProviderResult<String> {
    let request = build_request(transcript, context);
    let url = format!(
        "{}/models/{}:generateContent",
        config.base_url, config.model
    );

    let builder = http
        .post(&url)
        .query(&[("key", config.api_key.as_str())]);

    let response: GenerateContentResponse =
        send_json(builder, &request, ProviderKind::Gemini).await?;
    extract_text(response)
}
