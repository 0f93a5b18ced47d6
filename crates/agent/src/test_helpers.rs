//! Scripted generation engines shared by unit and integration tests.
//!
//! Enabled for this crate's tests and, through the `test-helpers` feature,
//! for downstream test suites.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use aurion_core::engine::{FragmentReceiver, GenerationEngine};
use aurion_core::error::GenerationError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Returns scripted replies in order and records every prompt it sees.
///
/// Panics if more calls are made than replies provided.
pub struct ScriptedEngine {
    replies: Mutex<VecDeque<Result<String, GenerationError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedEngine {
    pub fn new(replies: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// An engine that answers each call with the next text.
    pub fn replies<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(|t| Ok(t.into())).collect())
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerationEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let call = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len()
        };
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedEngine: no reply left for call #{call}"))
    }
}

/// Fails every call with the same error.
pub struct FailingEngine {
    error: GenerationError,
}

impl FailingEngine {
    pub fn new(error: GenerationError) -> Self {
        Self { error }
    }

    pub fn network(reason: &str) -> Self {
        Self::new(GenerationError::Network(reason.to_string()))
    }
}

#[async_trait]
impl GenerationEngine for FailingEngine {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(self.error.clone())
    }

    async fn generate_stream(&self, _prompt: &str) -> Result<FragmentReceiver, GenerationError> {
        Err(self.error.clone())
    }

    async fn is_available(&self) -> bool {
        false
    }
}

/// Streams fixed fragments, optionally followed by a mid-stream error.
///
/// Each stream is fed by a spawned task, like a network-backed engine.
/// `stopped_early` turns true when a consumer hangs up before the end.
pub struct StreamingEngine {
    fragments: Vec<String>,
    trailing_error: Option<GenerationError>,
    stopped_early: Arc<AtomicBool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl StreamingEngine {
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
            trailing_error: None,
            stopped_early: Arc::new(AtomicBool::new(false)),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn then_fail(mut self, error: GenerationError) -> Self {
        self.trailing_error = Some(error);
        self
    }

    pub fn stopped_early(&self) -> bool {
        self.stopped_early.load(Ordering::SeqCst)
    }

    /// Wait for every producer task spawned so far.
    pub async fn join(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock().unwrap());
        for task in tasks {
            task.await.unwrap();
        }
    }
}

#[async_trait]
impl GenerationEngine for StreamingEngine {
    fn name(&self) -> &str {
        "streaming"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        match &self.trailing_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.fragments.concat()),
        }
    }

    async fn generate_stream(&self, _prompt: &str) -> Result<FragmentReceiver, GenerationError> {
        let (tx, rx) = mpsc::channel(1);
        let fragments = self.fragments.clone();
        let trailing = self.trailing_error.clone();
        let stopped_early = Arc::clone(&self.stopped_early);

        let task = tokio::spawn(async move {
            for fragment in fragments {
                if tx.send(Ok(fragment)).await.is_err() {
                    stopped_early.store(true, Ordering::SeqCst);
                    return;
                }
            }
            if let Some(e) = trailing {
                if tx.send(Err(e)).await.is_err() {
                    stopped_early.store(true, Ordering::SeqCst);
                }
            }
        });
        self.tasks.lock().unwrap().push(task);
        Ok(rx)
    }
}
