//! The assistant orchestrator.
//!
//! One exchange runs: record the user turn, read back the recent history,
//! compose the role prompt, call the engine, record the reply. Failures of
//! the engine are turned into an apology that is stored and returned like
//! any other reply, so callers always get text back.

use std::sync::Arc;

use aurion_config::{AppConfig, MAX_CONTEXT_WINDOW, MIN_CONTEXT_WINDOW};
use aurion_core::engine::GenerationEngine;
use aurion_core::error::GenerationError;
use aurion_core::turn::{ConversationId, TurnRole};
use aurion_memory::{ConversationStore, NO_HISTORY};
use tracing::{debug, error, info, warn};

use crate::prompt::{DEFAULT_CONTEXT_TURNS, Role, RolePromptBuilder};
use crate::stream::ResponseStream;

/// The reply recorded when the engine fails.
pub fn apology(error: &GenerationError) -> String {
    format!("I apologize, but I encountered an error: {error}")
}

/// A conversational session: store, engine, active role and context window.
pub struct Assistant {
    /// Where turns are recorded
    store: Arc<ConversationStore>,

    /// Text generation backend
    engine: Arc<dyn GenerationEngine>,

    /// Active role and prompt layout
    prompt: RolePromptBuilder,

    /// Recent turns included in each prompt
    context_window: usize,
}

impl Assistant {
    pub fn new(store: Arc<ConversationStore>, engine: Arc<dyn GenerationEngine>) -> Self {
        Self {
            store,
            engine,
            prompt: RolePromptBuilder::default(),
            context_window: DEFAULT_CONTEXT_TURNS,
        }
    }

    /// Apply `default_role` and `context_window` from config.
    pub fn from_config(
        store: Arc<ConversationStore>,
        engine: Arc<dyn GenerationEngine>,
        config: &AppConfig,
    ) -> Self {
        Self::new(store, engine)
            .with_role(Role::from_str_or_default(&config.default_role))
            .with_context_window(config.context_window)
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.prompt = RolePromptBuilder::new(role);
        self
    }

    pub fn with_context_window(mut self, size: usize) -> Self {
        self.set_context_window(size);
        self
    }

    /// Answer `input` in one piece.
    ///
    /// Never fails: an engine error comes back as the apology text, which is
    /// also what gets recorded as the assistant turn.
    pub async fn respond(&self, input: &str, conversation_id: Option<&ConversationId>) -> String {
        let prompt = self.prepare(input, conversation_id).await;

        let reply = match self.engine.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(engine = self.engine.name(), error = %e, "Generation failed");
                apology(&e)
            }
        };

        if let Err(e) = self
            .store
            .append(TurnRole::Assistant, reply.as_str(), conversation_id)
            .await
        {
            error!(error = %e, "Failed to save assistant reply");
        }
        reply
    }

    /// Answer `input` fragment by fragment.
    ///
    /// The user turn is recorded before this returns; the assistant turn is
    /// recorded by the stream once it has been read to the end.
    pub async fn respond_stream(
        &self,
        input: &str,
        conversation_id: Option<&ConversationId>,
    ) -> ResponseStream {
        let prompt = self.prepare(input, conversation_id).await;
        let store = Arc::clone(&self.store);
        let conversation_id = conversation_id.cloned();

        match self.engine.generate_stream(&prompt).await {
            Ok(rx) => ResponseStream::receiving(rx, store, conversation_id),
            Err(e) => ResponseStream::failed(e, store, conversation_id),
        }
    }

    /// Record the user turn and compose the prompt for it.
    async fn prepare(&self, input: &str, conversation_id: Option<&ConversationId>) -> String {
        info!(
            role = self.prompt.role().id(),
            conversation_id = conversation_id.map(ConversationId::as_str),
            "Processing message"
        );

        if let Err(e) = self.store.append(TurnRole::User, input, conversation_id).await {
            error!(error = %e, "Failed to save user message");
        }

        // The history already ends with the turn just recorded.
        let history = self
            .store
            .formatted_history(conversation_id, Some(self.context_window))
            .await;
        let context = (history != NO_HISTORY).then_some(history.as_str());

        let prompt = self.prompt.build_prompt(input, context, self.context_window);
        debug!(chars = prompt.len(), "Prompt composed");
        prompt
    }

    /// Switch roles. Unknown names return false and change nothing.
    pub fn set_role(&mut self, role: &str) -> bool {
        let changed = self.prompt.set_role(role);
        if changed {
            info!(role = self.prompt.role().id(), "Role changed");
        } else {
            debug!(requested = role, "Unknown role ignored");
        }
        changed
    }

    /// Display name of the active role.
    pub fn current_role(&self) -> &'static str {
        self.prompt.role_name()
    }

    pub fn role(&self) -> Role {
        self.prompt.role()
    }

    pub fn greeting(&self) -> &'static str {
        self.prompt.greeting()
    }

    pub fn available_roles(&self) -> Vec<(&'static str, &'static str)> {
        RolePromptBuilder::available_roles()
    }

    pub async fn clear_history(&self, conversation_id: Option<&ConversationId>) {
        if let Err(e) = self.store.clear(conversation_id).await {
            error!(error = %e, "Failed to clear conversation");
        }
    }

    /// Set how many recent turns go into a prompt, clamped to the allowed range.
    pub fn set_context_window(&mut self, size: usize) {
        let clamped = size.clamp(MIN_CONTEXT_WINDOW, MAX_CONTEXT_WINDOW);
        if clamped != size {
            debug!(requested = size, applied = clamped, "Context window clamped");
        }
        self.context_window = clamped;
    }

    pub fn context_window(&self) -> usize {
        self.context_window
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }
}
