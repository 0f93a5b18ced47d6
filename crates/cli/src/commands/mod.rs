//! Subcommand implementations and the setup they share.

pub mod ask;
pub mod chat;
pub mod conversations;
pub mod doctor;
pub mod onboard;
pub mod roles;

use std::sync::Arc;

use aurion_agent::{Assistant, Role};
use aurion_config::{AppConfig, ConfigError};
use aurion_core::turn::Turn;
use aurion_memory::ConversationStore;
use aurion_providers::BuildError;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

pub(crate) fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

pub(crate) fn open_store(config: &AppConfig) -> Arc<ConversationStore> {
    Arc::new(ConversationStore::open(config.memory_path()))
}

/// Wire store, engine and role into an assistant, explaining how to add a
/// key when none is configured.
pub(crate) fn build_assistant(
    config: &AppConfig,
    role: Option<Role>,
) -> Result<Assistant, Box<dyn std::error::Error>> {
    let engine = match aurion_providers::build_from_config(config) {
        Ok(engine) => engine,
        Err(BuildError::Config(ConfigError::MissingApiKey)) => {
            print_missing_key_help();
            return Err("No API key found. See above for setup instructions.".into());
        }
        Err(e) => return Err(format!("Failed to set up the Gemini engine: {e}").into()),
    };

    let store = open_store(config);
    tracing::debug!(
        model = %config.model,
        store = %store.path().display(),
        "Assistant ready"
    );

    let assistant = Assistant::from_config(store, engine, config);
    Ok(match role {
        Some(role) => assistant.with_role(role),
        None => assistant,
    })
}

fn print_missing_key_help() {
    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    GEMINI_API_KEY=AIza...   (recommended)");
    eprintln!("    AURION_API_KEY=AIza...   (generic)");
    eprintln!();
    eprintln!("  Or add `api_key` to your config file:");
    eprintln!("    {}", AppConfig::config_path().display());
    eprintln!();
    eprintln!("  Get a key at: https://aistudio.google.com/apikey");
    eprintln!();
}

/// Print turns as `  <time>  <Role>: <message>`, indenting continuation lines.
pub(crate) fn print_turns(turns: &[Turn]) {
    for turn in turns {
        let stamp = turn.timestamp.format("%Y-%m-%d %H:%M");
        let mut lines = turn.message.lines();
        println!(
            "  {stamp}  {}: {}",
            turn.role.label(),
            lines.next().unwrap_or_default()
        );
        for line in lines {
            println!("{:20}{line}", "");
        }
    }
}
