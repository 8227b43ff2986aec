//! Per-conversation transcript persistence on top of a [`KeyValueStore`].
//!
//! Each conversation is stored as one JSON array of messages under
//! `chatbot-{conversation_id}`.

use anyhow::{Context, Result};
use smartchat_types::Message;
use tracing::warn;

use crate::storage::KeyValueStore;

const KEY_PREFIX: &str = "chatbot-";

/// Storage key for a conversation id.
pub fn conversation_key(conversation_id: &str) -> String {
    format!("{KEY_PREFIX}{conversation_id}")
}

/// Loads the stored transcript for a conversation.
///
/// A missing entry is an empty transcript. So is an entry that does not parse
/// as a message array; that case is logged and otherwise ignored.
///
/// # Errors
/// Returns an error only if the store itself fails.
pub fn load_transcript<S>(store: &S, conversation_id: &str) -> Result<Vec<Message>>
where
    S: KeyValueStore + ?Sized,
{
    let key = conversation_key(conversation_id);
    let Some(raw) = store.get(&key)? else {
        return Ok(Vec::new());
    };

    match serde_json::from_str::<Vec<Message>>(&raw) {
        Ok(messages) => Ok(messages),
        Err(e) => {
            warn!(key = %key, error = %e, "ignoring malformed stored transcript");
            Ok(Vec::new())
        }
    }
}

/// Replaces the stored transcript for a conversation.
///
/// # Errors
/// Returns an error if serialization or the store write fails.
pub fn save_transcript<S>(store: &mut S, conversation_id: &str, messages: &[Message]) -> Result<()>
where
    S: KeyValueStore + ?Sized,
{
    let key = conversation_key(conversation_id);
    let json = serde_json::to_string(messages).context("Failed to serialize transcript")?;
    store
        .set(&key, &json)
        .with_context(|| format!("Failed to save conversation '{conversation_id}'"))
}

/// Removes a conversation's stored transcript.
///
/// # Errors
/// Returns an error if the store fails.
pub fn delete_transcript<S>(store: &mut S, conversation_id: &str) -> Result<()>
where
    S: KeyValueStore + ?Sized,
{
    store
        .remove(&conversation_key(conversation_id))
        .with_context(|| format!("Failed to delete conversation '{conversation_id}'"))
}

/// Lists conversation ids with a stored transcript, sorted.
///
/// # Errors
/// Returns an error if the store cannot be listed.
pub fn list_conversations<S>(store: &S) -> Result<Vec<String>>
where
    S: KeyValueStore + ?Sized,
{
    Ok(store
        .keys()?
        .into_iter()
        .filter_map(|key| key.strip_prefix(KEY_PREFIX).map(str::to_string))
        .collect())
}

#[cfg(test)]
mod tests {
    use smartchat_types::Role;

    use super::*;
    use crate::storage::{FileStore, MemoryStore};

    #[test]
    fn test_conversation_key_format() {
        assert_eq!(conversation_key("default"), "chatbot-default");
        assert_eq!(conversation_key(""), "chatbot-");
    }

    #[test]
    fn test_missing_transcript_is_empty() {
        let store = MemoryStore::new();
        assert!(load_transcript(&store, "default").unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load_preserves_order() {
        let mut store = MemoryStore::new();
        let messages = vec![Message::user("Hi"), Message::assistant("Hello")];

        save_transcript(&mut store, "support", &messages).unwrap();
        let loaded = load_transcript(&store, "support").unwrap();

        assert_eq!(loaded, messages);
        assert_eq!(loaded[1].role(), Role::Assistant);
    }

    #[test]
    fn test_malformed_transcript_is_empty() {
        let mut store = MemoryStore::new();
        store.set("chatbot-broken", "{not json").unwrap();
        store
            .set(
                "chatbot-bad-role",
                r#"[{"id":"1","role":"system","content":"x","timestamp":"t"}]"#,
            )
            .unwrap();

        assert!(load_transcript(&store, "broken").unwrap().is_empty());
        assert!(load_transcript(&store, "bad-role").unwrap().is_empty());
    }

    #[test]
    fn test_list_and_delete_conversations() {
        let mut store = MemoryStore::new();
        save_transcript(&mut store, "b", &[Message::user("x")]).unwrap();
        save_transcript(&mut store, "a", &[]).unwrap();
        store.set("unrelated", "1").unwrap();

        assert_eq!(list_conversations(&store).unwrap(), vec!["a", "b"]);

        delete_transcript(&mut store, "a").unwrap();
        assert_eq!(list_conversations(&store).unwrap(), vec!["b"]);
    }

    #[test]
    fn test_file_backed_conversations_with_similar_ids_are_separate() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());

        save_transcript(&mut store, "my chat", &[Message::user("private to 'my chat'")]).unwrap();

        assert!(load_transcript(&store, "my_chat").unwrap().is_empty());
        assert!(load_transcript(&store, "my/chat").unwrap().is_empty());

        save_transcript(&mut store, "my_chat", &[Message::user("other")]).unwrap();
        let original = load_transcript(&store, "my chat").unwrap();
        assert_eq!(original.len(), 1);
        assert_eq!(original[0].content(), "private to 'my chat'");

        assert_eq!(list_conversations(&store).unwrap(), vec!["my chat", "my_chat"]);
    }
}
