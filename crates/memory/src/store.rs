//! File-backed conversation store — one JSON document for all conversations.
//!
//! The whole state (every conversation, the current selection, and a
//! last-updated stamp) is loaded into memory on open and rewritten in full
//! on every mutation. That keeps reads fast and the file human-inspectable;
//! the cost is a save proportional to the total number of turns.
//!
//! Storage location: `~/.aurion/data/memory.json`
//!
//! Single-writer: nothing coordinates two processes sharing one file.

use std::path::{Path, PathBuf};

use aurion_core::error::StoreError;
use aurion_core::turn::{ConversationId, Turn, TurnRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::conversations::Conversations;

/// Rendered by [`ConversationStore::formatted_history`] when there is nothing to show.
pub const NO_HISTORY: &str = "No previous conversation.";

/// The persisted document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreState {
    pub conversations: Conversations,

    #[serde(default)]
    pub current_conversation_id: Option<ConversationId>,

    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
}

impl StoreState {
    fn empty() -> Self {
        Self {
            conversations: Conversations::default(),
            current_conversation_id: None,
            last_updated: Utc::now(),
        }
    }

    /// Explicit id first, then the current selection.
    fn resolve(&self, conversation_id: Option<&ConversationId>) -> Option<ConversationId> {
        conversation_id
            .or(self.current_conversation_id.as_ref())
            .cloned()
    }
}

/// Durable mapping from conversation id to its ordered turns.
pub struct ConversationStore {
    path: PathBuf,
    state: RwLock<StoreState>,
}

impl ConversationStore {
    /// Open the store at `path`.
    ///
    /// A missing or unreadable document starts the store empty; the file is
    /// created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = Self::load_from_disk(&path);
        debug!(
            path = %path.display(),
            conversations = state.conversations.len(),
            "Conversation store loaded"
        );
        Self {
            path,
            state: RwLock::new(state),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the document from disk, replacing in-memory state.
    ///
    /// Never fails: missing or invalid content resets to empty state.
    pub async fn load(&self) {
        let fresh = Self::load_from_disk(&self.path);
        *self.state.write().await = fresh;
    }

    fn load_from_disk(path: &Path) -> StoreState {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return StoreState::empty(), // File doesn't exist yet — start empty
        };

        let mut state = match serde_json::from_str::<StoreState>(&content) {
            Ok(state) => state,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Conversation store is corrupt, starting empty");
                return StoreState::empty();
            }
        };

        if let Some(current) = &state.current_conversation_id {
            if !state.conversations.contains(current) {
                warn!(conversation_id = %current, "Current conversation no longer exists, clearing selection");
                state.current_conversation_id = None;
            }
        }

        state
    }

    /// Write the full document: temp file first, then rename over the target.
    fn persist(&self, state: &mut StoreState) -> Result<(), StoreError> {
        state.last_updated = Utc::now();

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        let content = serde_json::to_string_pretty(state)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), "Conversation store saved");
        Ok(())
    }

    /// Persist `next`, and only then make it the live state. On failure the
    /// live state is left as it was.
    fn commit(&self, live: &mut StoreState, mut next: StoreState) -> Result<(), StoreError> {
        self.persist(&mut next)?;
        *live = next;
        Ok(())
    }

    fn io_error(&self, err: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            reason: err.to_string(),
        }
    }

    /// Create `id` if absent and make it current. Idempotent.
    pub async fn create_conversation(&self, id: &ConversationId) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        next.conversations.get_or_create(id);
        next.current_conversation_id = Some(id.clone());
        self.commit(&mut state, next)
    }

    /// Create a conversation under a freshly generated short id and select it.
    pub async fn new_conversation(&self) -> Result<ConversationId, StoreError> {
        let id = ConversationId::generate();
        self.create_conversation(&id).await?;
        Ok(id)
    }

    /// Select an existing conversation. Returns false, changing nothing,
    /// when `id` is unknown.
    pub async fn set_current(&self, id: &ConversationId) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        if !state.conversations.contains(id) {
            return Ok(false);
        }
        let mut next = state.clone();
        next.current_conversation_id = Some(id.clone());
        self.commit(&mut state, next)?;
        Ok(true)
    }

    pub async fn current(&self) -> Option<ConversationId> {
        self.state.read().await.current_conversation_id.clone()
    }

    /// Append a turn, stamped now.
    ///
    /// Target: `conversation_id`, else the current conversation, else
    /// `"default"` (created and selected). An explicit id that does not
    /// exist yet is created without changing the selection.
    pub async fn append(
        &self,
        role: TurnRole,
        message: impl Into<String>,
        conversation_id: Option<&ConversationId>,
    ) -> Result<Turn, StoreError> {
        let turn = Turn::new(role, message);
        let mut state = self.state.write().await;
        let mut next = state.clone();

        let target = match next.resolve(conversation_id) {
            Some(id) => id,
            None => {
                let id = ConversationId::fallback();
                next.current_conversation_id = Some(id.clone());
                id
            }
        };

        next.conversations.get_or_create(&target).push(turn.clone());
        self.commit(&mut state, next)?;
        Ok(turn)
    }

    /// Turns of a conversation in order; the last `limit` when given.
    pub async fn history(
        &self,
        conversation_id: Option<&ConversationId>,
        limit: Option<usize>,
    ) -> Vec<Turn> {
        let state = self.state.read().await;
        let Some(id) = state.resolve(conversation_id) else {
            return Vec::new();
        };
        let Some(turns) = state.conversations.get(&id) else {
            return Vec::new();
        };

        let start = limit.map_or(0, |limit| turns.len().saturating_sub(limit));
        turns[start..].to_vec()
    }

    /// History as `"<Role>: <message>"` lines, or [`NO_HISTORY`].
    pub async fn formatted_history(
        &self,
        conversation_id: Option<&ConversationId>,
        limit: Option<usize>,
    ) -> String {
        let turns = self.history(conversation_id, limit).await;
        if turns.is_empty() {
            return NO_HISTORY.to_string();
        }
        turns
            .iter()
            .map(Turn::to_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Empty a conversation, keeping its id. No-op when nothing resolves.
    pub async fn clear(&self, conversation_id: Option<&ConversationId>) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let Some(id) = state.resolve(conversation_id) else {
            return Ok(());
        };
        let mut next = state.clone();
        if let Some(turns) = next.conversations.get_mut(&id) {
            turns.clear();
        }
        self.commit(&mut state, next)
    }

    /// Remove a conversation. Returns whether it existed.
    pub async fn delete_conversation(&self, id: &ConversationId) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let removed = next.conversations.remove(id).is_some();
        if next.current_conversation_id.as_ref() == Some(id) {
            next.current_conversation_id = None;
        }
        self.commit(&mut state, next)?;
        Ok(removed)
    }

    /// Conversation ids in creation order.
    pub async fn conversation_ids(&self) -> Vec<ConversationId> {
        self.state.read().await.conversations.ids()
    }

    pub async fn message_count(&self, conversation_id: Option<&ConversationId>) -> usize {
        let state = self.state.read().await;
        state
            .resolve(conversation_id)
            .and_then(|id| state.conversations.get(&id).map(Vec::len))
            .unwrap_or(0)
    }

    pub async fn last_updated(&self) -> DateTime<Utc> {
        self.state.read().await.last_updated
    }
}
