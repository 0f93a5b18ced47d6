//! Text-generation engines for Aurion.
//!
//! All engines implement the `aurion_core::GenerationEngine` trait.
//! [`build_from_config`] wires the configured engine from an `AppConfig`.

pub mod gemini;

pub use gemini::GeminiEngine;

use std::sync::Arc;
use std::time::Duration;

use aurion_config::{AppConfig, ConfigError};
use aurion_core::engine::GenerationEngine;
use aurion_core::error::GenerationError;

/// Errors while wiring an engine from configuration.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] GenerationError),
}

/// Build the Gemini engine described by `config`.
///
/// Fails with `ConfigError::MissingApiKey` before anything else is touched
/// when no key is configured.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn GenerationEngine>, BuildError> {
    let api_key = config.load_api_key()?;

    let engine = GeminiEngine::with_timeout(
        api_key,
        &config.model,
        Duration::from_secs(config.request_timeout_secs),
    )?
    .with_base_url(&config.api_base_url)
    .with_temperature(config.temperature)
    .with_max_output_tokens(config.max_output_tokens);

    tracing::debug!(model = %config.model, "Gemini engine configured");
    Ok(Arc::new(engine))
}
