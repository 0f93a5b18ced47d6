//! Conversation memory for Aurion.
//!
//! A single JSON document holds every conversation; see [`ConversationStore`].

pub mod conversations;
pub mod store;

pub use conversations::Conversations;
pub use store::{ConversationStore, NO_HISTORY, StoreState};
