//! # Aurion Core
//!
//! Domain types, collaborator traits, and error definitions for the Aurion
//! assistant. Every other crate in the workspace depends inward on this one.
//!
//! ## Design Philosophy
//!
//! The things the assistant talks to (the text-generation service, the
//! speech recognizer) are traits here. Adapters live in their own crates,
//! which keeps the conversation logic testable with scripted stand-ins.

pub mod engine;
pub mod error;
pub mod speech;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use engine::{FragmentReceiver, GenerationEngine};
pub use error::{GenerationError, RoleError, StoreError};
pub use speech::SpeechRecognizer;
pub use turn::{ConversationId, Turn, TurnRole};
