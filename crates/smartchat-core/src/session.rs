//! One chat surface: settings, the active conversation, and turn handling.
//!
//! A session owns its store and transcript. `submit` takes `&mut self`, so a
//! session can have at most one provider call in flight.

use anyhow::Result;
use smartchat_providers::{
    ClientConfig, ProviderClient, ProviderError, ProviderKind, ProviderResult, resolve_base_url,
};
use smartchat_types::Message;
use tracing::{debug, warn};

use crate::markdown::clean_markdown;
use crate::storage::KeyValueStore;
use crate::transcript::{load_transcript, save_transcript};

/// Shown instead of calling the provider when the session cannot run.
pub const MISSING_SETTINGS_NOTICE: &str =
    "Missing required settings: api_key and model are required";

/// Per-surface settings supplied by the host.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    /// Provider id; validated at dispatch time, not here.
    pub provider: String,
    pub api_key: String,
    pub model: String,
    /// Free-form background text; empty means none.
    pub context: String,
    pub clean_markdown: bool,
    /// Overrides the provider's production endpoint (`<PROVIDER>_BASE_URL` still wins).
    pub base_url: Option<String>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAI.id().to_string(),
            api_key: String::new(),
            model: String::new(),
            context: String::new(),
            clean_markdown: true,
            base_url: None,
        }
    }
}

impl ChatSettings {
    fn is_complete(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.model.trim().is_empty()
    }
}

/// Result of a single `submit` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Input was empty after trimming; nothing changed.
    Ignored,
    /// Settings are incomplete; nothing changed.
    Blocked,
    /// The assistant reply that was appended.
    Replied(String),
    /// The provider call failed. The user message stays in the transcript.
    Failed(String),
}

pub struct ChatSession<S: KeyValueStore> {
    settings: ChatSettings,
    store: S,
    conversation_id: String,
    transcript: Vec<Message>,
    error: Option<String>,
}

impl<S: KeyValueStore> ChatSession<S> {
    /// Opens a session on `conversation_id`, loading any stored transcript.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn open(settings: ChatSettings, store: S, conversation_id: impl Into<String>) -> Result<Self> {
        let conversation_id = conversation_id.into();
        let transcript = load_transcript(&store, &conversation_id)?;
        debug!(
            conversation = %conversation_id,
            messages = transcript.len(),
            "opened conversation"
        );

        Ok(Self {
            settings,
            store,
            conversation_id,
            transcript,
            error: None,
        })
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Text of the last failed turn, cleared by the next submission.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The notice to display when the session cannot send, if any.
    pub fn blocking_notice(&self) -> Option<&'static str> {
        (!self.settings.is_complete()).then_some(MISSING_SETTINGS_NOTICE)
    }

    /// Makes `conversation_id` active. A conversation with nothing stored
    /// starts empty.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn switch_conversation(&mut self, conversation_id: impl Into<String>) -> Result<()> {
        let conversation_id = conversation_id.into();
        self.transcript = load_transcript(&self.store, &conversation_id)?;
        self.conversation_id = conversation_id;
        self.error = None;
        Ok(())
    }

    /// Empties the active transcript and persists the empty state.
    ///
    /// # Errors
    /// Returns an error if the store write fails.
    pub fn clear(&mut self) -> Result<()> {
        self.transcript.clear();
        self.error = None;
        self.persist()
    }

    /// Runs one user turn.
    ///
    /// Provider failures are reported through [`TurnOutcome::Failed`] and the
    /// session's error indicator.
    ///
    /// # Errors
    /// Returns an error only if persisting the transcript fails.
    pub async fn submit(&mut self, input: &str) -> Result<TurnOutcome> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(TurnOutcome::Ignored);
        }
        if self.blocking_notice().is_some() {
            return Ok(TurnOutcome::Blocked);
        }

        self.transcript.push(Message::user(input));
        self.persist()?;
        self.error = None;

        match self.request_reply().await {
            Ok(reply) => {
                let reply = if self.settings.clean_markdown {
                    clean_markdown(&reply)
                } else {
                    reply
                };
                self.transcript.push(Message::assistant(reply.clone()));
                self.persist()?;
                Ok(TurnOutcome::Replied(reply))
            }
            Err(e) => {
                warn!(
                    conversation = %self.conversation_id,
                    kind = %e.kind,
                    "chat turn failed"
                );
                let message = e.to_string();
                self.error = Some(message.clone());
                Ok(TurnOutcome::Failed(message))
            }
        }
    }

    async fn request_reply(&self) -> ProviderResult<String> {
        let kind: ProviderKind = self.settings.provider.parse()?;
        let base_url = resolve_base_url(
            self.settings.base_url.as_deref(),
            kind.base_url_env_var(),
            kind.default_base_url(),
            kind.label(),
        )
        .map_err(|e| ProviderError::config(format!("{e:#}")))?;

        let config = ClientConfig::new(kind, self.settings.api_key.trim(), self.settings.model.trim())
            .with_base_url(base_url);
        ProviderClient::new(config)
            .generate_reply(&self.transcript, &self.settings.context)
            .await
    }

    fn persist(&mut self) -> Result<()> {
        save_transcript(&mut self.store, &self.conversation_id, &self.transcript)
    }
}
