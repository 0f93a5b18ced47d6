//! `aurion conversations` — Inspect and manage stored conversations.

use aurion_core::turn::ConversationId;
use aurion_memory::{ConversationStore, NO_HISTORY};

use super::{CmdResult, load_config, open_store, print_turns};

fn store() -> Result<std::sync::Arc<ConversationStore>, Box<dyn std::error::Error>> {
    let config = load_config()?;
    Ok(open_store(&config))
}

pub async fn list() -> CmdResult {
    let store = store()?;
    let ids = store.conversation_ids().await;

    println!("Conversations in {}", store.path().display());
    println!();
    if ids.is_empty() {
        println!("  (none yet)");
        return Ok(());
    }

    let current = store.current().await;
    for id in &ids {
        let marker = if current.as_ref() == Some(id) { "*" } else { " " };
        let count = store.message_count(Some(id)).await;
        let last = store
            .history(Some(id), Some(1))
            .await
            .first()
            .map(|t| t.timestamp.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".into());
        println!("  {marker} {id:<12} {count:>4} messages   last: {last}");
    }
    println!();
    println!(
        "  {} conversation(s), updated {}",
        ids.len(),
        store.last_updated().await.format("%Y-%m-%d %H:%M")
    );

    Ok(())
}

pub async fn show(id: String, limit: Option<usize>) -> CmdResult {
    let store = store()?;
    let id = ConversationId::from(id);

    if !store.conversation_ids().await.contains(&id) {
        return Err(format!("No conversation named {id}").into());
    }

    let turns = store.history(Some(&id), limit).await;
    if turns.is_empty() {
        println!("  {NO_HISTORY}");
    } else {
        print_turns(&turns);
    }
    Ok(())
}

pub async fn new() -> CmdResult {
    let store = store()?;
    let id = store.new_conversation().await?;
    println!("Created conversation {id} (now current)");
    Ok(())
}

pub async fn delete(id: String) -> CmdResult {
    let store = store()?;
    let id = ConversationId::from(id);
    if store.delete_conversation(&id).await? {
        println!("Deleted {id}");
    } else {
        println!("No conversation named {id}");
    }
    Ok(())
}

pub async fn clear(id: Option<String>) -> CmdResult {
    let store = store()?;
    let id = id.map(ConversationId::from);

    let Some(target) = id.or(store.current().await) else {
        println!("No current conversation to clear");
        return Ok(());
    };

    if !store.conversation_ids().await.contains(&target) {
        return Err(format!("No conversation named {target}").into());
    }
    store.clear(Some(&target)).await?;
    println!("Cleared {target}");
    Ok(())
}
