//! Shared helpers for CLI integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::json;

const PROVIDER_ENV_VARS: [&str; 6] = [
    "OPENAI_API_KEY",
    "OPENAI_BASE_URL",
    "ANTHROPIC_API_KEY",
    "ANTHROPIC_BASE_URL",
    "GEMINI_API_KEY",
    "GEMINI_BASE_URL",
];

/// A `smartchat` command isolated from the caller's home and provider env.
pub fn smartchat(home: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("smartchat");
    for var in PROVIDER_ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.env("SMARTCHAT_HOME", home)
        .env("SMARTCHAT_BLOCK_REAL_API", "1")
        .env_remove("SMARTCHAT_LOG");
    cmd
}

/// Writes a stored conversation the way the file store lays it out.
pub fn write_conversation(home: &Path, id: &str, messages: &[(&str, &str)]) {
    let dir = home.join("conversations");
    fs::create_dir_all(&dir).unwrap();

    let entries: Vec<_> = messages
        .iter()
        .enumerate()
        .map(|(i, (role, content))| {
            json!({
                "id": format!("msg-{i}"),
                "role": role,
                "content": content,
                "timestamp": "2024-01-01T12:00:00.000Z"
            })
        })
        .collect();

    fs::write(
        dir.join(format!("chatbot-{id}.json")),
        serde_json::to_string(&entries).unwrap(),
    )
    .unwrap();
}
