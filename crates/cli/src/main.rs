//! Aurion CLI — the main entry point.
//!
//! Commands:
//! - `onboard`        — Create `~/.aurion` and a default config
//! - `chat`           — Interactive conversation
//! - `ask`            — Single message, single reply
//! - `conversations`  — List, show, create, delete or clear conversations
//! - `roles`          — List assistant roles
//! - `doctor`         — Diagnose the local setup

use aurion_agent::Role;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "aurion",
    about = "Aurion — a role-aware conversational assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and data directory
    Onboard,

    /// Chat interactively
    Chat {
        /// Role to start in (general, tutor, coder, mentor)
        #[arg(short, long)]
        role: Option<Role>,

        /// Conversation to continue or create
        #[arg(short, long)]
        conversation: Option<String>,

        /// Start a fresh conversation
        #[arg(long, conflicts_with = "conversation")]
        new: bool,

        /// Print replies in one piece
        #[arg(long)]
        no_stream: bool,
    },

    /// Send a single message
    Ask {
        /// The message to send
        message: String,

        /// Role to answer in
        #[arg(short, long)]
        role: Option<Role>,

        /// Conversation to record the exchange in
        #[arg(short, long)]
        conversation: Option<String>,

        /// Stream the reply as it is generated
        #[arg(long)]
        stream: bool,
    },

    /// Manage stored conversations
    Conversations {
        #[command(subcommand)]
        action: ConversationsAction,
    },

    /// List assistant roles
    Roles,

    /// Diagnose system health
    Doctor,
}

#[derive(Subcommand)]
enum ConversationsAction {
    /// List conversations
    List,

    /// Print a conversation
    Show {
        id: String,

        /// Only the last N turns
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Create a conversation and make it current
    New,

    /// Delete a conversation
    Delete { id: String },

    /// Remove all turns from a conversation (the current one by default)
    Clear { id: Option<String> },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so they never mix with replies on stdout.
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat {
            role,
            conversation,
            new,
            no_stream,
        } => commands::chat::run(role, conversation, new, no_stream).await?,
        Commands::Ask {
            message,
            role,
            conversation,
            stream,
        } => commands::ask::run(message, role, conversation, stream).await?,
        Commands::Conversations { action } => match action {
            ConversationsAction::List => commands::conversations::list().await?,
            ConversationsAction::Show { id, limit } => {
                commands::conversations::show(id, limit).await?
            }
            ConversationsAction::New => commands::conversations::new().await?,
            ConversationsAction::Delete { id } => commands::conversations::delete(id).await?,
            ConversationsAction::Clear { id } => commands::conversations::clear(id).await?,
        },
        Commands::Roles => commands::roles::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
