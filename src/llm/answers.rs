//! Answer fetching on the tokio runtime
//!
//! Each question becomes one task. Tasks wait for a semaphore permit before
//! calling the generator, so only a few requests are in flight at a time.
//! Finished answers are handed to the UI thread over a channel; they arrive
//! in completion order, which may differ from submission order.

use super::gemini::TextGenerator;
use crate::{CatMiniError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

/// Prefix of the answer shown when the generator fails
pub const GENERATION_ERROR_PREFIX: &str = "⚠️ Error al contactar Gemini: ";

/// Text shown in place of an answer when generation fails
pub fn generation_failure_message(error: &CatMiniError) -> String {
    let detail = match error {
        CatMiniError::GenerationError(message) => message.clone(),
        other => other.to_string(),
    };
    format!("{}{}", GENERATION_ERROR_PREFIX, detail)
}

/// A finished fetch
#[derive(Debug, Clone)]
pub struct Answer {
    pub request_id: Uuid,
    /// Answer text, or the error message if `failed`
    pub text: String,
    pub failed: bool,
    pub elapsed: Duration,
}

pub struct AnswerService {
    generator: Arc<dyn TextGenerator>,
    runtime: Handle,
    limiter: Arc<Semaphore>,
    shutdown: CancellationToken,
    in_flight: Arc<AtomicUsize>,
    answer_tx: Sender<Answer>,
    answer_rx: Receiver<Answer>,
}

impl AnswerService {
    pub fn new(generator: Arc<dyn TextGenerator>, runtime: Handle, max_concurrent: usize) -> Self {
        let (answer_tx, answer_rx) = unbounded();
        Self {
            generator,
            runtime,
            limiter: Arc::new(Semaphore::new(max_concurrent.max(1))),
            shutdown: CancellationToken::new(),
            in_flight: Arc::new(AtomicUsize::new(0)),
            answer_tx,
            answer_rx,
        }
    }

    /// Start fetching an answer; never blocks
    pub fn submit(&self, question: impl Into<String>) -> Uuid {
        let request_id = Uuid::new_v4();
        let question = question.into();
        let generator = Arc::clone(&self.generator);
        let limiter = Arc::clone(&self.limiter);
        let cancel = self.shutdown.child_token();
        let in_flight = Arc::clone(&self.in_flight);
        let answer_tx = self.answer_tx.clone();

        in_flight.fetch_add(1, Ordering::SeqCst);
        debug!("Submitting question {}", request_id);

        self.runtime.spawn(async move {
            let start = Instant::now();
            let result = tokio::select! {
                _ = cancel.cancelled() => None,
                result = fetch_answer(generator.as_ref(), &limiter, &question) => Some(result),
            };
            in_flight.fetch_sub(1, Ordering::SeqCst);

            let Some(result) = result else {
                debug!("Question {} cancelled", request_id);
                return;
            };

            let answer = match result {
                Ok(text) => Answer {
                    request_id,
                    text,
                    failed: false,
                    elapsed: start.elapsed(),
                },
                Err(e) => {
                    warn!("Answer fetch {} failed: {}", request_id, e);
                    Answer {
                        request_id,
                        text: generation_failure_message(&e),
                        failed: true,
                        elapsed: start.elapsed(),
                    }
                }
            };

            let _ = answer_tx.send(answer);
        });

        request_id
    }

    /// Next finished answer, if any
    pub fn try_recv(&self) -> Option<Answer> {
        match self.answer_rx.try_recv() {
            Ok(answer) => Some(answer),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Fetches submitted but not yet finished
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Abandon outstanding fetches
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

async fn fetch_answer(
    generator: &dyn TextGenerator,
    limiter: &Semaphore,
    question: &str,
) -> Result<String> {
    let _permit = limiter
        .acquire()
        .await
        .map_err(|e| CatMiniError::GenerationError(format!("Request limiter closed: {}", e)))?;
    generator.generate(question).await
}
