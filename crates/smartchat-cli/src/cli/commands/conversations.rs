//! Conversation command handlers.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use smartchat_core::transcript;
use smartchat_types::Message;

use super::conversation_store;

pub fn list() -> Result<()> {
    let store = conversation_store();
    let ids = transcript::list_conversations(&store).context("list conversations")?;
    if ids.is_empty() {
        println!("No conversations found.");
        return Ok(());
    }

    for id in ids {
        let messages = transcript::load_transcript(&store, &id)
            .with_context(|| format!("load conversation '{id}'"))?;
        let last = messages
            .last()
            .map_or_else(|| "-".to_string(), |m| format_timestamp(m.timestamp()));
        println!("{id}  {} messages  {last}", messages.len());
    }
    Ok(())
}

pub fn show(id: &str) -> Result<()> {
    let messages = transcript::load_transcript(&conversation_store(), id)
        .with_context(|| format!("load conversation '{id}'"))?;
    if messages.is_empty() {
        println!("Conversation '{id}' is empty or not found.");
    } else {
        println!("{}", format_transcript(&messages));
    }
    Ok(())
}

pub fn clear(id: &str) -> Result<()> {
    transcript::delete_transcript(&mut conversation_store(), id)?;
    println!("Cleared conversation '{id}'");
    Ok(())
}

/// Renders an RFC 3339 timestamp in local time, or returns it unchanged.
fn format_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw).map_or_else(
        |_| raw.to_string(),
        |ts| ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
    )
}

fn format_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| {
            format!(
                "[{}] {}: {}",
                format_timestamp(m.timestamp()),
                m.role(),
                m.content()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp_passes_through_garbage() {
        assert_eq!(format_timestamp("yesterday"), "yesterday");
        assert_eq!(format_timestamp("2024-01-01T00:00:00.000Z").len(), 16);
    }

    #[test]
    fn test_format_transcript_labels_roles() {
        let out = format_transcript(&[Message::user("Hi"), Message::assistant("Hello")]);
        assert!(out.contains("user: Hi"));
        assert!(out.contains("assistant: Hello"));
    }
}
