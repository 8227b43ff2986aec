//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use smartchat_core::config;
use tracing_subscriber::EnvFilter;

mod commands;

const LOG_ENV: &str = "SMARTCHAT_LOG";

#[derive(Parser)]
#[command(name = "smartchat")]
#[command(version)]
#[command(about = "Chat with OpenAI, Anthropic or Gemini models from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    session_args: SessionArgs,
}

/// Overrides for the values loaded from config.toml.
#[derive(clap::Args, Debug, Clone, Default)]
struct SessionArgs {
    /// Provider to use (openai, anthropic, gemini)
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Override the model from config
    #[arg(long, global = true)]
    model: Option<String>,

    /// Background context sent with every request
    #[arg(long, global = true)]
    context: Option<String>,

    /// Conversation to use
    #[arg(long, value_name = "ID", global = true)]
    conversation: Option<String>,

    /// Keep markdown in replies
    #[arg(long, global = true)]
    raw: bool,

    /// Keep the transcript in memory only
    #[arg(long = "no-save", global = true)]
    no_save: bool,
}

impl SessionArgs {
    fn apply(&self, config: &mut config::Config) {
        if let Some(provider) = &self.provider {
            config.provider.clone_from(provider);
        }
        if let Some(model) = &self.model {
            config.model.clone_from(model);
        }
        if let Some(context) = &self.context {
            config.context = Some(context.clone());
        }
        if let Some(id) = &self.conversation {
            config.conversation_id.clone_from(id);
        }
        if self.raw {
            config.clean_markdown = false;
        }
    }
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Interactive chat (default)
    Chat,
    /// Sends a single prompt and prints the reply
    Exec {
        /// The prompt to send
        #[arg(short, long)]
        prompt: String,
    },
    /// Manage stored conversations
    Conversations {
        #[command(subcommand)]
        command: ConversationCommands,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Strips markdown from stdin and prints the result
    Clean,
}

#[derive(clap::Subcommand)]
enum ConversationCommands {
    /// Lists stored conversations
    List,
    /// Shows a stored conversation
    Show {
        #[arg(value_name = "CONVERSATION_ID")]
        id: String,
    },
    /// Deletes a stored conversation (defaults to the active one)
    Clear {
        #[arg(value_name = "CONVERSATION_ID")]
        id: Option<String>,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Cli {
        command,
        session_args,
    } = cli;

    // Config commands must work even when config.toml does not parse.
    let load_config = || -> Result<config::Config> {
        let mut config = config::Config::load().context("load config")?;
        session_args.apply(&mut config);
        Ok(config)
    };

    match command.unwrap_or(Commands::Chat) {
        Commands::Chat => commands::chat::run(&load_config()?, session_args.no_save).await,
        Commands::Exec { prompt } => {
            commands::exec::run(&load_config()?, session_args.no_save, &prompt).await
        }
        Commands::Conversations { command } => match command {
            ConversationCommands::List => commands::conversations::list(),
            ConversationCommands::Show { id } => commands::conversations::show(&id),
            ConversationCommands::Clear { id } => match id {
                Some(id) => commands::conversations::clear(&id),
                None => commands::conversations::clear(&load_config()?.conversation_id),
            },
        },
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
        Commands::Clean => commands::clean::run().await,
    }
}
