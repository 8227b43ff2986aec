//! CLI command handlers.

pub mod chat;
pub mod clean;
pub mod config;
pub mod conversations;
pub mod exec;

use anyhow::{Context, Result};
use smartchat_core::config::{Config, paths};
use smartchat_core::{ChatSession, FileStore, KeyValueStore, MemoryStore};
use tracing::debug;

type DynStore = Box<dyn KeyValueStore>;

fn conversation_store() -> FileStore {
    FileStore::new(paths::conversations_dir())
}

/// Opens a session on the configured conversation.
fn open_session(config: &Config, no_save: bool) -> Result<ChatSession<DynStore>> {
    let settings = config.chat_settings()?;
    debug!(
        provider = %settings.provider,
        conversation = %config.conversation_id,
        no_save,
        "opening session"
    );
    let store: DynStore = if no_save {
        Box::new(MemoryStore::new())
    } else {
        Box::new(conversation_store())
    };

    ChatSession::open(settings, store, config.conversation_id.clone())
        .with_context(|| format!("open conversation '{}'", config.conversation_id))
}
