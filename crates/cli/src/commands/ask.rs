//! `aurion ask` — Send one message and print the reply.

use std::io::Write;

use aurion_agent::Role;
use aurion_core::turn::ConversationId;

use super::{CmdResult, build_assistant, load_config};

pub async fn run(
    message: String,
    role: Option<Role>,
    conversation: Option<String>,
    stream: bool,
) -> CmdResult {
    let config = load_config()?;
    let assistant = build_assistant(&config, role)?;
    let conversation = conversation.map(ConversationId::from);

    if stream {
        let mut fragments = assistant.respond_stream(&message, conversation.as_ref()).await;
        while let Some(fragment) = fragments.next().await {
            print!("{fragment}");
            std::io::stdout().flush()?;
        }
        println!();
    } else {
        eprint!("  Thinking...");
        let reply = assistant.respond(&message, conversation.as_ref()).await;
        eprint!("\r              \r");
        println!("{reply}");
    }

    Ok(())
}
