//! Pull-based streaming replies.
//!
//! A [`ResponseStream`] forwards engine fragments to the caller one at a time
//! and records the assistant turn once the engine is done. The engine side
//! writes into a bounded channel, so a consumer that stops pulling (or drops
//! the stream) stops the engine as well.

use std::sync::Arc;

use aurion_core::engine::FragmentReceiver;
use aurion_core::error::GenerationError;
use aurion_core::turn::{ConversationId, TurnRole};
use aurion_memory::ConversationStore;
use futures::Stream;
use tracing::{debug, error, warn};

use crate::assistant::apology;

enum Source {
    Receiving(FragmentReceiver),
    /// The engine could not start; the apology is still owed.
    Failed(GenerationError),
    Finished,
}

/// A single-consumer sequence of reply fragments.
///
/// Not restartable: after `next()` returns `None` it keeps returning `None`.
pub struct ResponseStream {
    source: Source,
    store: Arc<ConversationStore>,
    conversation_id: Option<ConversationId>,
    collected: String,
    fragments: usize,
}

impl ResponseStream {
    pub(crate) fn receiving(
        rx: FragmentReceiver,
        store: Arc<ConversationStore>,
        conversation_id: Option<ConversationId>,
    ) -> Self {
        Self::with_source(Source::Receiving(rx), store, conversation_id)
    }

    pub(crate) fn failed(
        error: GenerationError,
        store: Arc<ConversationStore>,
        conversation_id: Option<ConversationId>,
    ) -> Self {
        Self::with_source(Source::Failed(error), store, conversation_id)
    }

    fn with_source(
        source: Source,
        store: Arc<ConversationStore>,
        conversation_id: Option<ConversationId>,
    ) -> Self {
        Self {
            source,
            store,
            conversation_id,
            collected: String::new(),
            fragments: 0,
        }
    }

    /// The next fragment, or `None` once the reply is complete and recorded.
    pub async fn next(&mut self) -> Option<String> {
        match std::mem::replace(&mut self.source, Source::Finished) {
            Source::Finished => None,
            Source::Failed(e) => Some(self.fail(e).await),
            Source::Receiving(mut rx) => match rx.recv().await {
                Some(Ok(fragment)) => {
                    self.collected.push_str(&fragment);
                    self.fragments += 1;
                    self.source = Source::Receiving(rx);
                    Some(fragment)
                }
                Some(Err(e)) => Some(self.fail(e).await),
                None if self.collected.is_empty() => {
                    Some(self.fail(GenerationError::EmptyResponse).await)
                }
                None => {
                    debug!(fragments = self.fragments, "Stream complete");
                    let reply = std::mem::take(&mut self.collected);
                    self.record(reply).await;
                    None
                }
            },
        }
    }

    /// Text received so far.
    pub fn collected(&self) -> &str {
        &self.collected
    }

    /// Adapt into a [`futures::Stream`] of fragments.
    pub fn into_stream(self) -> impl Stream<Item = String> + Send {
        futures::stream::unfold(self, |mut this| async move {
            this.next().await.map(|fragment| (fragment, this))
        })
    }

    async fn fail(&mut self, e: GenerationError) -> String {
        warn!(error = %e, fragments = self.fragments, "Streaming generation failed");
        let message = apology(&e);
        self.collected.clear();
        self.record(message.clone()).await;
        message
    }

    async fn record(&self, reply: String) {
        if let Err(e) = self
            .store
            .append(TurnRole::Assistant, reply, self.conversation_id.as_ref())
            .await
        {
            error!(error = %e, "Failed to save assistant reply");
        }
    }
}
