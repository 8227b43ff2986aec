//! Interactive line chat.
//!
//! Reads one prompt per line from stdin. `:q` quits and `:clear` empties the
//! active conversation; end of input also quits.

use anyhow::{Context, Result};
use smartchat_core::TurnOutcome;
use smartchat_core::config::Config;
use tokio::io::{AsyncBufReadExt, BufReader};

const QUIT_COMMANDS: [&str; 3] = [":q", ":quit", ":exit"];
const CLEAR_COMMAND: &str = ":clear";

pub async fn run(config: &Config, no_save: bool) -> Result<()> {
    let mut session = super::open_session(config, no_save)?;

    eprintln!(
        "smartchat: {} / {} (conversation '{}', {} messages). Type :q to quit.",
        session.settings().provider,
        session.settings().model,
        session.conversation_id(),
        session.transcript().len()
    );
    if let Some(notice) = session.blocking_notice() {
        eprintln!("{notice}");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("read stdin")? {
        let line = line.trim();

        if QUIT_COMMANDS.contains(&line) {
            println!("Goodbye!");
            return Ok(());
        }
        if line == CLEAR_COMMAND {
            session.clear()?;
            println!("Conversation cleared.");
            continue;
        }

        match session.submit(line).await? {
            TurnOutcome::Ignored => {}
            TurnOutcome::Replied(reply) => println!("{reply}"),
            TurnOutcome::Failed(message) => eprintln!("Error: {message}"),
            TurnOutcome::Blocked => {
                if let Some(notice) = session.blocking_notice() {
                    eprintln!("{notice}");
                }
            }
        }
    }

    Ok(())
}
