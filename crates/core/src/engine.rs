//! GenerationEngine trait — the abstraction over text-generation backends.
//!
//! An engine takes a fully composed prompt string and returns text, either
//! all at once or as a sequence of fragments.
//!
//! Implementations: Gemini (in `aurion-providers`), scripted engines in tests.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::GenerationError;

/// Receiving half of a fragment stream.
///
/// The channel is bounded; a producer blocks until the consumer pulls, and
/// dropping the receiver tells the producer to stop.
pub type FragmentReceiver = mpsc::Receiver<Result<String, GenerationError>>;

/// The core GenerationEngine trait.
///
/// The orchestrator calls `generate()` or `generate_stream()` without
/// knowing which service is behind it.
#[async_trait]
pub trait GenerationEngine: Send + Sync {
    /// A human-readable name for this engine (e.g., "gemini").
    fn name(&self) -> &str;

    /// Send a prompt and get the complete response text.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Send a prompt and get a stream of response fragments.
    ///
    /// Default implementation calls `generate()` and yields its result as a
    /// single fragment.
    async fn generate_stream(&self, prompt: &str) -> Result<FragmentReceiver, GenerationError> {
        let text = self.generate(prompt).await?;
        let (tx, rx) = mpsc::channel(1);
        let _ = tx.send(Ok(text)).await;
        Ok(rx)
    }

    /// Health check — can we reach the service with the configured credentials?
    async fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoEngine;

    #[async_trait]
    impl GenerationEngine for EchoEngine {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            Ok(format!("echo: {prompt}"))
        }
    }

    struct BrokenEngine;

    #[async_trait]
    impl GenerationEngine for BrokenEngine {
        fn name(&self) -> &str {
            "broken"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            Err(GenerationError::Network("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn default_stream_yields_single_fragment() {
        let mut rx = EchoEngine.generate_stream("hi").await.unwrap();
        assert_eq!(rx.recv().await.unwrap().unwrap(), "echo: hi");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn default_stream_propagates_start_failure() {
        let err = BrokenEngine.generate_stream("hi").await.unwrap_err();
        assert!(matches!(err, GenerationError::Network(_)));
    }

    #[tokio::test]
    async fn default_health_check_is_optimistic() {
        assert!(EchoEngine.is_available().await);
    }
}
