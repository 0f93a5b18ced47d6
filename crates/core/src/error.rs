//! Error types for the Aurion domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use thiserror::Error;

/// Failures reported by a text-generation engine.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Provider returned no text")]
    EmptyResponse,

    #[error("Engine not configured: {0}")]
    NotConfigured(String),
}

/// Failures while persisting the conversation store.
///
/// Load-time problems never surface as this type: a missing or corrupt
/// document is replaced with empty state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O failed at {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to serialize store: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// An assistant role name outside the fixed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleError {
    #[error("Unknown role '{0}' (expected one of: general, tutor, coder, mentor)")]
    Unknown(String),
}
