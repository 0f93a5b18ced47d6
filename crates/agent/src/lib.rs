//! The conversational core of Aurion.
//!
//! Each exchange follows the same path:
//!
//! 1. **Record** the user message in the conversation store
//! 2. **Recall** the most recent turns of that conversation
//! 3. **Compose** a prompt for the active role
//! 4. **Generate** a reply, whole or as a stream of fragments
//! 5. **Record** the reply (or an apology when generation failed)

pub mod assistant;
pub mod prompt;
pub mod stream;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use assistant::{Assistant, apology};
pub use prompt::{DEFAULT_CONTEXT_TURNS, Role, RolePromptBuilder};
pub use stream::ResponseStream;
