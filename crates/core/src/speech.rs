//! SpeechRecognizer trait — turns spoken input into text.
//!
//! Recognition failures are deliberately coarse: a timeout, audio that could
//! not be understood, and a broken recognition service all come back as
//! `None`. Callers only need to know whether they got text.

use async_trait::async_trait;

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// The recognizer name (e.g., "command").
    fn name(&self) -> &str;

    /// Capture one utterance and return the recognized text, if any.
    async fn recognize(&self) -> Option<String>;

    /// Whether a capture device / backend is present at all.
    async fn is_available(&self) -> bool {
        true
    }
}
