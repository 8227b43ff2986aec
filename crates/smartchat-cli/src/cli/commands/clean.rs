//! Markdown cleanup of stdin.

use anyhow::{Context, Result};
use smartchat_core::clean_markdown;
use tokio::io::AsyncReadExt;

pub async fn run() -> Result<()> {
    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("read stdin")?;

    println!("{}", clean_markdown(&input));
    Ok(())
}
