//! Exec command handler.

use anyhow::{Result, bail};
use smartchat_core::config::Config;
use smartchat_core::{MISSING_SETTINGS_NOTICE, TurnOutcome};

pub async fn run(config: &Config, no_save: bool, prompt: &str) -> Result<()> {
    let mut session = super::open_session(config, no_save)?;

    match session.submit(prompt).await? {
        TurnOutcome::Replied(reply) => {
            println!("{reply}");
            Ok(())
        }
        TurnOutcome::Failed(message) => bail!("{message}"),
        TurnOutcome::Blocked => bail!("{MISSING_SETTINGS_NOTICE}"),
        TurnOutcome::Ignored => bail!("Prompt is empty"),
    }
}
