//! `aurion chat` — Interactive conversation with slash commands.

use std::io::Write;

use aurion_agent::{Assistant, Role};
use aurion_core::speech::SpeechRecognizer;
use aurion_core::turn::ConversationId;
use aurion_voice::CommandRecognizer;
use tokio::io::{self, AsyncBufReadExt, BufReader};

use super::{CmdResult, build_assistant, load_config, print_turns};

/// A line starting with `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    New,
    List,
    Switch(String),
    Delete(String),
    Clear,
    History,
    Role(Option<String>),
    Roles,
    Stream,
    Window(Option<usize>),
    Voice,
    Help,
    Exit,
    /// Known command with a missing or malformed argument.
    Usage(&'static str),
    Unknown(String),
}

impl SlashCommand {
    /// `None` when the line is a message rather than a command.
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.trim().strip_prefix('/')?;
        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default().to_ascii_lowercase();
        let arg = parts.next().map(str::to_string);

        Some(match name.as_str() {
            "new" => Self::New,
            "list" | "ls" => Self::List,
            "switch" => arg.map_or(Self::Usage("/switch ID"), Self::Switch),
            "delete" => arg.map_or(Self::Usage("/delete ID"), Self::Delete),
            "clear" => Self::Clear,
            "history" => Self::History,
            "role" => Self::Role(arg),
            "roles" => Self::Roles,
            "stream" => Self::Stream,
            "window" => match arg.map(|a| a.parse::<usize>()) {
                None => Self::Window(None),
                Some(Ok(n)) => Self::Window(Some(n)),
                Some(Err(_)) => Self::Usage("/window N"),
            },
            "voice" => Self::Voice,
            "help" | "?" => Self::Help,
            "exit" | "quit" | "q" => Self::Exit,
            _ => Self::Unknown(name),
        })
    }
}

enum Flow {
    Continue,
    Exit,
}

/// The interactive session: the assistant plus front-end toggles.
pub struct ChatSession {
    assistant: Assistant,
    streaming: bool,
    voice: Option<CommandRecognizer>,
}

impl ChatSession {
    pub fn new(assistant: Assistant, streaming: bool, voice: Option<CommandRecognizer>) -> Self {
        Self {
            assistant,
            streaming,
            voice,
        }
    }

    async fn current_label(&self) -> String {
        match self.assistant.store().current().await {
            Some(id) => id.to_string(),
            None => "(none yet)".into(),
        }
    }

    async fn greet_if_empty(&self) {
        if self.assistant.store().message_count(None).await == 0 {
            println!("  Aurion > {}", self.assistant.greeting());
            println!();
        }
    }

    async fn print_banner(&self, model: &str) {
        println!();
        println!("  ╔══════════════════════════════════════════════╗");
        println!("  ║          Aurion — Interactive Chat           ║");
        println!("  ╚══════════════════════════════════════════════╝");
        println!();
        println!("  Model:         {model}");
        println!("  Role:          {}", self.assistant.current_role());
        println!("  Conversation:  {}", self.current_label().await);
        println!("  Streaming:     {}", on_off(self.streaming));
        println!("  Context:       {} turns", self.assistant.context_window());
        println!();
        println!("  Type your message and press Enter. /help lists commands.");
        println!();
    }

    async fn send(&self, input: &str) -> std::io::Result<()> {
        if self.streaming {
            print!("  Aurion > ");
            std::io::stdout().flush()?;
            let mut stream = self.assistant.respond_stream(input, None).await;
            while let Some(fragment) = stream.next().await {
                print!("{fragment}");
                std::io::stdout().flush()?;
            }
            println!();
        } else {
            eprint!("  ...");
            let reply = self.assistant.respond(input, None).await;
            eprint!("\r     \r");
            for line in reply.lines() {
                println!("  Aurion > {line}");
            }
        }
        println!();
        Ok(())
    }

    async fn handle(&mut self, command: SlashCommand) -> Result<Flow, Box<dyn std::error::Error>> {
        let store = self.assistant.store().clone();

        match command {
            SlashCommand::New => {
                let id = store.new_conversation().await?;
                println!("  Started conversation {id}");
                println!();
                self.greet_if_empty().await;
            }
            SlashCommand::List => self.list_conversations().await,
            SlashCommand::Switch(id) => {
                let id = ConversationId::from(id);
                if store.set_current(&id).await? {
                    let count = store.message_count(Some(&id)).await;
                    println!("  Switched to {id} ({count} messages)");
                } else {
                    println!("  No conversation named {id}. /list shows what exists.");
                }
            }
            SlashCommand::Delete(id) => {
                let id = ConversationId::from(id);
                if store.delete_conversation(&id).await? {
                    println!("  Deleted {id}");
                } else {
                    println!("  No conversation named {id}");
                }
            }
            SlashCommand::Clear => match store.current().await {
                Some(id) => {
                    store.clear(Some(&id)).await?;
                    println!("  Cleared {id}");
                }
                None => println!("  No current conversation to clear"),
            },
            SlashCommand::History => {
                let turns = store.history(None, None).await;
                if turns.is_empty() {
                    println!("  {}", aurion_memory::NO_HISTORY);
                } else {
                    print_turns(&turns);
                }
            }
            SlashCommand::Role(None) => {
                println!("  Current role: {}", self.assistant.current_role());
                print_roles(self.assistant.role());
            }
            SlashCommand::Role(Some(name)) => {
                if self.assistant.set_role(&name) {
                    println!("  Role: {}", self.assistant.current_role());
                    println!("  Aurion > {}", self.assistant.greeting());
                } else {
                    println!("  Unknown role '{name}'. Available:");
                    print_roles(self.assistant.role());
                }
            }
            SlashCommand::Roles => print_roles(self.assistant.role()),
            SlashCommand::Stream => {
                self.streaming = !self.streaming;
                println!("  Streaming {}", on_off(self.streaming));
            }
            SlashCommand::Window(None) => {
                println!("  Context window: {} turns", self.assistant.context_window());
            }
            SlashCommand::Window(Some(size)) => {
                self.assistant.set_context_window(size);
                println!("  Context window: {} turns", self.assistant.context_window());
            }
            SlashCommand::Voice => self.listen().await?,
            SlashCommand::Help => print_help(),
            SlashCommand::Exit => return Ok(Flow::Exit),
            SlashCommand::Usage(usage) => println!("  Usage: {usage}"),
            SlashCommand::Unknown(name) => {
                println!("  Unknown command /{name}. Type /help for the list.");
            }
        }
        println!();
        Ok(Flow::Continue)
    }

    async fn list_conversations(&self) {
        let store = self.assistant.store();
        let ids = store.conversation_ids().await;
        if ids.is_empty() {
            println!("  No conversations yet");
            return;
        }
        let current = store.current().await;
        for id in ids {
            let marker = if current.as_ref() == Some(&id) { "*" } else { " " };
            let count = store.message_count(Some(&id)).await;
            println!("  {marker} {id:<12} {count:>4} messages");
        }
    }

    async fn listen(&self) -> std::io::Result<()> {
        let Some(recognizer) = &self.voice else {
            println!("  Voice input is not configured. Set `command` under [voice] in config.toml");
            return Ok(());
        };

        println!("  Listening...");
        match recognizer.recognize().await {
            Some(text) => {
                println!("  You (voice) > {text}");
                println!();
                self.send(&text).await?;
            }
            None => println!("  Sorry, I didn't catch that."),
        }
        Ok(())
    }

    /// Read lines from stdin until EOF or `/exit`.
    pub async fn run(&mut self) -> CmdResult {
        self.greet_if_empty().await;

        let mut lines = BufReader::new(io::stdin()).lines();
        loop {
            print!("  You > ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if matches!(line, "exit" | "quit") {
                break;
            }

            match SlashCommand::parse(line) {
                Some(command) => match self.handle(command).await {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Exit) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, "Chat command failed");
                        eprintln!("  [Error] {e}\n");
                    }
                },
                None => {
                    println!();
                    self.send(line).await?;
                }
            }
        }

        println!();
        println!("  Goodbye!");
        println!();
        Ok(())
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

fn print_roles(active: Role) {
    for role in Role::ALL {
        let marker = if role == active { "*" } else { " " };
        println!("  {marker} {:<8} {}", role.id(), role.display_name());
    }
}

fn print_help() {
    println!("  Commands:");
    println!("    /new            Start a new conversation");
    println!("    /list           List conversations (* marks the current one)");
    println!("    /switch ID      Switch to a conversation");
    println!("    /delete ID      Delete a conversation");
    println!("    /clear          Clear the current conversation");
    println!("    /history        Show the current conversation");
    println!("    /role [R]       Show or change the role");
    println!("    /roles          List roles");
    println!("    /stream         Toggle streaming replies");
    println!("    /window [N]     Show or set how many turns go into each prompt");
    println!("    /voice          Speak one message");
    println!("    /help           Show this help");
    println!("    /exit           Quit");
}

pub async fn run(
    role: Option<Role>,
    conversation: Option<String>,
    new: bool,
    no_stream: bool,
) -> CmdResult {
    let config = load_config()?;
    let assistant = build_assistant(&config, role)?;

    let store = assistant.store().clone();
    if new {
        store.new_conversation().await?;
    } else if let Some(id) = conversation {
        store.create_conversation(&ConversationId::from(id)).await?;
    }

    let voice = CommandRecognizer::from_config(&config.voice);
    let mut session = ChatSession::new(assistant, config.streaming && !no_stream, voice);
    session.print_banner(&config.model).await;
    session.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use aurion_agent::test_helpers::ScriptedEngine;
    use aurion_core::turn::TurnRole;
    use aurion_memory::ConversationStore;
    use tempfile::TempDir;

    fn session() -> (TempDir, ChatSession) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(ConversationStore::open(dir.path().join("memory.json")));
        let assistant = Assistant::new(store, Arc::new(ScriptedEngine::new(Vec::new())));
        (dir, ChatSession::new(assistant, false, None))
    }

    #[tokio::test]
    async fn clear_without_current_conversation_changes_nothing() {
        let (_dir, mut session) = session();
        let flow = session.handle(SlashCommand::Clear).await.unwrap();
        assert!(matches!(flow, Flow::Continue));

        let store = session.assistant.store();
        assert!(store.current().await.is_none());
        assert!(store.conversation_ids().await.is_empty());
    }

    #[tokio::test]
    async fn clear_empties_only_the_current_conversation() {
        let (_dir, mut session) = session();
        let store = session.assistant.store().clone();
        let other = ConversationId::from("other");
        store.append(TurnRole::User, "keep me", Some(&other)).await.unwrap();
        store.append(TurnRole::User, "drop me", None).await.unwrap();

        session.handle(SlashCommand::Clear).await.unwrap();

        assert_eq!(store.message_count(None).await, 0);
        assert_eq!(store.message_count(Some(&other)).await, 1);
        assert_eq!(store.current().await, Some(ConversationId::from("default")));
    }

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(SlashCommand::parse("hello there"), None);
        assert_eq!(SlashCommand::parse("what is 1/2?"), None);
    }

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(
            SlashCommand::parse("/switch work"),
            Some(SlashCommand::Switch("work".into()))
        );
        assert_eq!(
            SlashCommand::parse("  /ROLE coder "),
            Some(SlashCommand::Role(Some("coder".into())))
        );
        assert_eq!(SlashCommand::parse("/role"), Some(SlashCommand::Role(None)));
        assert_eq!(
            SlashCommand::parse("/window 5"),
            Some(SlashCommand::Window(Some(5)))
        );
        assert_eq!(SlashCommand::parse("/window"), Some(SlashCommand::Window(None)));
    }

    #[test]
    fn missing_or_bad_arguments_show_usage() {
        assert_eq!(
            SlashCommand::parse("/switch"),
            Some(SlashCommand::Usage("/switch ID"))
        );
        assert_eq!(
            SlashCommand::parse("/delete"),
            Some(SlashCommand::Usage("/delete ID"))
        );
        assert_eq!(
            SlashCommand::parse("/window many"),
            Some(SlashCommand::Usage("/window N"))
        );
    }

    #[test]
    fn aliases_and_unknowns() {
        assert_eq!(SlashCommand::parse("/quit"), Some(SlashCommand::Exit));
        assert_eq!(SlashCommand::parse("/ls"), Some(SlashCommand::List));
        assert_eq!(
            SlashCommand::parse("/dance"),
            Some(SlashCommand::Unknown("dance".into()))
        );
    }
}
