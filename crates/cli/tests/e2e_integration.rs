//! End-to-end tests for the Aurion conversation pipeline.
//!
//! These drive the assistant against scripted engines and an on-disk store,
//! then reopen the store to check what actually reached the file.

use std::path::PathBuf;
use std::sync::Arc;

use aurion_agent::test_helpers::{FailingEngine, ScriptedEngine, StreamingEngine};
use aurion_agent::{Assistant, Role};
use aurion_core::error::GenerationError;
use aurion_core::turn::{ConversationId, TurnRole};
use aurion_memory::ConversationStore;
use futures::StreamExt;
use tempfile::TempDir;

// ── Helpers ──────────────────────────────────────────────────────────────

struct Fixture {
    _dir: TempDir,
    path: PathBuf,
    store: Arc<ConversationStore>,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("memory.json");
        let store = Arc::new(ConversationStore::open(&path));
        Self {
            _dir: dir,
            path,
            store,
        }
    }

    /// A second handle on the same file, as a new process would see it.
    fn reopen(&self) -> ConversationStore {
        ConversationStore::open(&self.path)
    }
}

// ── E2E: Conversation lifecycle ──────────────────────────────────────────

#[tokio::test]
async fn e2e_first_message_creates_default_conversation_on_disk() {
    let fx = Fixture::new();
    let engine = Arc::new(ScriptedEngine::replies(["Hi! What shall we learn?"]));
    let assistant = Assistant::new(fx.store.clone(), engine).with_role(Role::Tutor);

    let reply = assistant.respond("Hello", None).await;
    assert_eq!(reply, "Hi! What shall we learn?");
    assert!(fx.path.exists());

    let reloaded = fx.reopen();
    let default = ConversationId::from("default");
    assert_eq!(reloaded.conversation_ids().await, vec![default.clone()]);
    assert_eq!(reloaded.current().await, Some(default.clone()));

    let turns = reloaded.history(Some(&default), None).await;
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, TurnRole::User);
    assert_eq!(turns[0].message, "Hello");
    assert_eq!(turns[1].message, "Hi! What shall we learn?");
}

#[tokio::test]
async fn e2e_multi_turn_prompt_contains_prior_exchange() {
    let fx = Fixture::new();
    let engine = Arc::new(ScriptedEngine::replies([
        "A for-loop repeats.",
        "Like this: for i in 0..3 {}",
    ]));
    let mut assistant = Assistant::new(fx.store.clone(), engine.clone());
    assert!(assistant.set_role("coder"));

    assistant.respond("What is a loop?", None).await;
    assistant.respond("Show me one", None).await;

    let prompts = engine.prompts();
    assert_eq!(prompts.len(), 2);
    let second = &prompts[1];
    assert!(second.starts_with(Role::Coder.system_instruction()));
    assert!(second.contains("User: What is a loop?\nAssistant: A for-loop repeats."));
    // The fresh input appears in the context block and again as the final user line.
    assert_eq!(second.matches("User: Show me one").count(), 2);
    assert!(second.ends_with("User: Show me one\n\nAssistant:"));
}

#[tokio::test]
async fn e2e_conversations_stay_isolated() {
    let fx = Fixture::new();
    let engine = Arc::new(ScriptedEngine::replies(["one", "two", "three"]));
    let assistant = Assistant::new(fx.store.clone(), engine.clone());

    assistant.respond("first chat", None).await;
    let first = fx.store.current().await.unwrap();

    let second = fx.store.new_conversation().await.unwrap();
    assert_ne!(first, second);
    assistant.respond("second chat", None).await;

    assert!(fx.store.set_current(&first).await.unwrap());
    assistant.respond("back to first", None).await;

    let reloaded = fx.reopen();
    assert_eq!(reloaded.conversation_ids().await, vec![first.clone(), second.clone()]);
    assert_eq!(reloaded.message_count(Some(&first)).await, 4);
    assert_eq!(reloaded.message_count(Some(&second)).await, 2);

    // The third prompt only saw the first conversation.
    let third = &engine.prompts()[2];
    assert!(third.contains("User: first chat"));
    assert!(!third.contains("second chat"));
}

#[tokio::test]
async fn e2e_explicit_conversation_does_not_move_selection() {
    let fx = Fixture::new();
    let engine = Arc::new(ScriptedEngine::replies(["a", "b"]));
    let assistant = Assistant::new(fx.store.clone(), engine);

    assistant.respond("in default", None).await;
    let side = ConversationId::from("side");
    assistant.respond("on the side", Some(&side)).await;

    assert_eq!(fx.store.current().await, Some(ConversationId::from("default")));
    assert_eq!(fx.store.message_count(Some(&side)).await, 2);
}

#[tokio::test]
async fn e2e_clear_and_delete_survive_reload() {
    let fx = Fixture::new();
    let engine = Arc::new(ScriptedEngine::replies(["1", "2", "3"]));
    let assistant = Assistant::new(fx.store.clone(), engine);

    let x = ConversationId::from("X");
    let y = ConversationId::from("Y");
    assistant.respond("u1", Some(&x)).await;
    assistant.respond("u2", Some(&x)).await;
    assistant.respond("u3", Some(&y)).await;
    assert_eq!(fx.store.message_count(Some(&x)).await, 4);

    // Only the last two turns by position, in order.
    let last_two = fx.store.history(Some(&x), Some(2)).await;
    assert_eq!(last_two[0].message, "u2");
    assert_eq!(last_two[1].message, "2");

    fx.store.clear(Some(&x)).await.unwrap();
    assert!(fx.store.delete_conversation(&y).await.unwrap());

    let reloaded = fx.reopen();
    assert_eq!(reloaded.message_count(Some(&x)).await, 0);
    assert_eq!(reloaded.conversation_ids().await, vec![x]);
}

// ── E2E: Failure handling ────────────────────────────────────────────────

#[tokio::test]
async fn e2e_engine_failure_is_answered_and_recorded() {
    let fx = Fixture::new();
    let engine = Arc::new(FailingEngine::new(GenerationError::RateLimited {
        retry_after_secs: 30,
    }));
    let assistant = Assistant::new(fx.store.clone(), engine);

    let reply = assistant.respond("hi", None).await;
    assert!(!reply.is_empty());
    assert!(reply.starts_with("I apologize, but I encountered an error:"));

    let turns = fx.reopen().history(None, None).await;
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].message, "hi");
    assert_eq!(turns[1].role, TurnRole::Assistant);
    assert_eq!(turns[1].message, reply);
}

#[tokio::test]
async fn e2e_corrupt_store_starts_empty_and_recovers() {
    let fx = Fixture::new();
    std::fs::create_dir_all(fx.path.parent().unwrap()).unwrap();
    std::fs::write(&fx.path, "{ not json").unwrap();

    let store = Arc::new(fx.reopen());
    assert!(store.conversation_ids().await.is_empty());

    let assistant = Assistant::new(store, Arc::new(ScriptedEngine::replies(["fresh start"])));
    assistant.respond("anyone there?", None).await;

    let reloaded = fx.reopen();
    assert_eq!(reloaded.message_count(None).await, 2);
}

// ── E2E: Streaming ───────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_streamed_reply_is_persisted_whole() {
    let fx = Fixture::new();
    let engine = Arc::new(StreamingEngine::new(["Career ", "paths ", "vary."]));
    let assistant = Assistant::new(fx.store.clone(), engine.clone()).with_role(Role::Mentor);

    let fragments: Vec<String> = assistant
        .respond_stream("Where do I start?", None)
        .await
        .into_stream()
        .collect()
        .await;
    assert_eq!(fragments.concat(), "Career paths vary.");

    engine.join().await;
    let turns = fx.reopen().history(None, None).await;
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1].message, "Career paths vary.");
}

#[tokio::test]
async fn e2e_interrupted_stream_records_apology_only() {
    let fx = Fixture::new();
    let engine = StreamingEngine::new(["half an ans"])
        .then_fail(GenerationError::StreamInterrupted("connection reset".into()));
    let assistant = Assistant::new(fx.store.clone(), Arc::new(engine));

    let mut stream = assistant.respond_stream("explain", None).await;
    assert_eq!(stream.next().await.as_deref(), Some("half an ans"));
    let apology = stream.next().await.unwrap();
    assert!(apology.contains("connection reset"));
    assert!(stream.next().await.is_none());

    let turns = fx.reopen().history(None, None).await;
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1].message, apology);
}
