//! Speech actor: the single owner of the speech synthesizer
//!
//! One worker thread consumes [`SpeechCommand`]s in order and speaks one
//! utterance at a time. Every utterance carries its own cancellation token;
//! [`SpeechHandle::speak`] cancels the previous token before queueing the next
//! utterance, so the worker drops whatever it was saying and moves on.

use crate::speech::{SpeechOutcome, SpeechSynthesizer};
use crate::{CatMiniError, Result};
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use parking_lot::Mutex;
use std::thread;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Pending commands the worker may queue
const COMMAND_QUEUE_SIZE: usize = 16;

/// Events buffered for the UI thread
const EVENT_QUEUE_SIZE: usize = 64;

/// Command sent to the speech worker
#[derive(Debug)]
pub enum SpeechCommand {
    Speak {
        session_id: Uuid,
        utterance_id: Uuid,
        text: String,
        cancel: CancellationToken,
    },
    Shutdown,
}

/// How an utterance ended, as reported back to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechFinish {
    Completed,
    Interrupted,
    /// The synthesizer failed; playback ends early
    Failed(String),
}

/// Event emitted by the speech worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Started {
        session_id: Uuid,
        utterance_id: Uuid,
    },
    Finished {
        session_id: Uuid,
        utterance_id: Uuid,
        outcome: SpeechFinish,
    },
}

/// Stand-in used when the real synthesizer could not be built
///
/// Every utterance fails right away, so playback ends as soon as it starts.
pub struct UnavailableSynthesizer {
    reason: String,
}

impl UnavailableSynthesizer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl SpeechSynthesizer for UnavailableSynthesizer {
    fn speak(&mut self, _text: &str, _cancel: &CancellationToken) -> Result<SpeechOutcome> {
        Err(CatMiniError::TTSError(format!(
            "Speech output unavailable: {}",
            self.reason
        )))
    }
}

/// Spawns the speech worker
pub struct SpeechActor;

impl SpeechActor {
    /// Start the worker thread; `factory` runs on that thread
    ///
    /// Audio output streams are tied to the thread that opened them, so the
    /// synthesizer is built inside the worker. If `factory` fails the worker
    /// keeps running with an [`UnavailableSynthesizer`].
    pub fn spawn<F>(factory: F) -> Result<SpeechHandle>
    where
        F: FnOnce() -> Result<Box<dyn SpeechSynthesizer>> + Send + 'static,
    {
        let (command_tx, command_rx) = bounded(COMMAND_QUEUE_SIZE);
        let (event_tx, event_rx) = bounded(EVENT_QUEUE_SIZE);

        thread::Builder::new()
            .name("catmini-speech".into())
            .spawn(move || {
                info!("Speech worker starting");

                let synthesizer = match factory() {
                    Ok(synthesizer) => synthesizer,
                    Err(e) => {
                        error!("Failed to initialize speech synthesizer: {}", e);
                        Box::new(UnavailableSynthesizer::new(e.to_string()))
                    }
                };

                run_worker(synthesizer, command_rx, event_tx);

                info!("Speech worker stopped");
            })?;

        Ok(SpeechHandle {
            command_tx,
            event_rx,
            current: Mutex::new(None),
        })
    }
}

fn run_worker(
    mut synthesizer: Box<dyn SpeechSynthesizer>,
    command_rx: Receiver<SpeechCommand>,
    event_tx: Sender<SpeechEvent>,
) {
    loop {
        match command_rx.recv() {
            Ok(SpeechCommand::Speak {
                session_id,
                utterance_id,
                text,
                cancel,
            }) => {
                let outcome = if cancel.is_cancelled() {
                    debug!("Utterance {} cancelled before it started", utterance_id);
                    SpeechFinish::Interrupted
                } else {
                    let _ = event_tx.send(SpeechEvent::Started {
                        session_id,
                        utterance_id,
                    });
                    match synthesizer.speak(&text, &cancel) {
                        Ok(SpeechOutcome::Completed) => SpeechFinish::Completed,
                        Ok(SpeechOutcome::Interrupted) => SpeechFinish::Interrupted,
                        Err(e) => {
                            warn!("Speech failed for utterance {}: {}", utterance_id, e);
                            SpeechFinish::Failed(e.to_string())
                        }
                    }
                };

                debug!("Utterance {} finished: {:?}", utterance_id, outcome);
                if event_tx
                    .send(SpeechEvent::Finished {
                        session_id,
                        utterance_id,
                        outcome,
                    })
                    .is_err()
                {
                    break;
                }
            }
            Ok(SpeechCommand::Shutdown) => {
                info!("Speech worker shutting down");
                break;
            }
            Err(e) => {
                debug!("Speech command channel closed: {}", e);
                break;
            }
        }
    }
}

/// Handle used by the UI thread to drive the speech worker
pub struct SpeechHandle {
    command_tx: Sender<SpeechCommand>,
    event_rx: Receiver<SpeechEvent>,
    /// Token of the most recently queued utterance
    current: Mutex<Option<CancellationToken>>,
}

impl SpeechHandle {
    /// Queue an utterance, cancelling the one before it
    pub fn speak(&self, session_id: Uuid, text: impl Into<String>) -> Result<Uuid> {
        let utterance_id = Uuid::new_v4();
        let cancel = CancellationToken::new();

        let mut current = self.current.lock();
        if let Some(previous) = current.take() {
            previous.cancel();
        }

        self.command_tx
            .try_send(SpeechCommand::Speak {
                session_id,
                utterance_id,
                text: text.into(),
                cancel: cancel.clone(),
            })
            .map_err(|e| match e {
                TrySendError::Full(_) => CatMiniError::ChannelError("Speech queue is full".into()),
                TrySendError::Disconnected(_) => {
                    CatMiniError::ChannelError("Speech worker is not running".into())
                }
            })?;

        *current = Some(cancel);
        debug!("Queued utterance {} for session {}", utterance_id, session_id);
        Ok(utterance_id)
    }

    /// Cancel the current utterance, if any
    pub fn stop(&self) {
        if let Some(token) = self.current.lock().take() {
            token.cancel();
        }
    }

    pub fn try_recv(&self) -> Option<SpeechEvent> {
        match self.event_rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Stop speaking and ask the worker to exit
    pub fn shutdown(&self) {
        self.stop();
        let _ = self.command_tx.try_send(SpeechCommand::Shutdown);
    }
}

impl Drop for SpeechHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    /// Speaks for `duration` unless cancelled, tracking overlap
    struct TimedSynthesizer {
        duration: Duration,
        active: Arc<AtomicUsize>,
        max_active: Arc<AtomicUsize>,
    }

    impl SpeechSynthesizer for TimedSynthesizer {
        fn speak(&mut self, _text: &str, cancel: &CancellationToken) -> Result<SpeechOutcome> {
            let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now_active, Ordering::SeqCst);

            let started = Instant::now();
            let outcome = loop {
                if cancel.is_cancelled() {
                    break SpeechOutcome::Interrupted;
                }
                if started.elapsed() >= self.duration {
                    break SpeechOutcome::Completed;
                }
                thread::sleep(Duration::from_millis(2));
            };

            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(outcome)
        }
    }

    fn spawn_timed(duration: Duration) -> (SpeechHandle, Arc<AtomicUsize>) {
        let max_active = Arc::new(AtomicUsize::new(0));
        let worker_max = Arc::clone(&max_active);
        let handle = SpeechActor::spawn(move || {
            Ok(Box::new(TimedSynthesizer {
                duration,
                active: Arc::new(AtomicUsize::new(0)),
                max_active: worker_max,
            }) as Box<dyn SpeechSynthesizer>)
        })
        .unwrap();
        (handle, max_active)
    }

    fn collect_finished(handle: &SpeechHandle, count: usize) -> Vec<(Uuid, SpeechFinish)> {
        let deadline = Instant::now() + Duration::from_secs(3);
        let mut finished = Vec::new();
        while finished.len() < count && Instant::now() < deadline {
            match handle.try_recv() {
                Some(SpeechEvent::Finished {
                    utterance_id,
                    outcome,
                    ..
                }) => finished.push((utterance_id, outcome)),
                Some(SpeechEvent::Started { .. }) => {}
                None => thread::sleep(Duration::from_millis(2)),
            }
        }
        finished
    }

    #[test]
    fn test_utterance_completes() {
        let (handle, _) = spawn_timed(Duration::from_millis(10));
        let utterance = handle.speak(Uuid::new_v4(), "hola").unwrap();

        let finished = collect_finished(&handle, 1);
        assert_eq!(finished, vec![(utterance, SpeechFinish::Completed)]);
    }

    #[test]
    fn test_stop_interrupts_current_utterance() {
        let (handle, _) = spawn_timed(Duration::from_secs(2));
        let utterance = handle.speak(Uuid::new_v4(), "hola").unwrap();
        thread::sleep(Duration::from_millis(20));

        let stopped_at = Instant::now();
        handle.stop();
        let finished = collect_finished(&handle, 1);

        assert_eq!(finished, vec![(utterance, SpeechFinish::Interrupted)]);
        assert!(stopped_at.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_new_utterance_cancels_previous() {
        let (handle, max_active) = spawn_timed(Duration::from_millis(200));
        let first = handle.speak(Uuid::new_v4(), "uno").unwrap();
        let second = handle.speak(Uuid::new_v4(), "dos").unwrap();

        let finished = collect_finished(&handle, 2);
        assert_eq!(
            finished,
            vec![
                (first, SpeechFinish::Interrupted),
                (second, SpeechFinish::Completed)
            ]
        );
        assert_eq!(max_active.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_factory_reports_failure() {
        let handle = SpeechActor::spawn(|| Err(CatMiniError::TTSError("no voice".into()))).unwrap();
        let utterance = handle.speak(Uuid::new_v4(), "hola").unwrap();

        let finished = collect_finished(&handle, 1);
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].0, utterance);
        assert!(matches!(&finished[0].1, SpeechFinish::Failed(reason) if reason.contains("no voice")));
    }
}
