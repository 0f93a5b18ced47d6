//! `aurion roles` — List the assistant roles.

use aurion_agent::Role;

use super::{CmdResult, load_config};

pub async fn run() -> CmdResult {
    let config = load_config()?;
    let default = Role::from_str_or_default(&config.default_role);

    println!("Roles (* = default):");
    println!();
    for role in Role::ALL {
        let marker = if role == default { "*" } else { " " };
        println!("  {marker} {:<8} {}", role.id(), role.display_name());
        println!("             {}", role.greeting());
    }
    println!();
    println!("Pick one with `aurion chat --role <id>` or `/role <id>` inside a chat.");

    Ok(())
}
