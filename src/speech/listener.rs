//! Background worker that owns the speech recognizer
//!
//! Listening blocks for several seconds, so it never runs on the UI thread.
//! The worker handles one listen at a time; a request made while a listen is
//! in flight is rejected by [`RecognizerHandle::listen`].

use super::stt::{RecognitionError, SpeechRecognizer};
use crate::Result;
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Command sent to the recognition worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionCommand {
    /// Capture and transcribe one phrase
    Listen,
    /// Stop the worker
    Shutdown,
}

/// Result of one listen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Recognized(String),
    Failed(RecognitionError),
}

/// Handle to the recognition worker thread
pub struct RecognizerHandle {
    command_tx: Sender<RecognitionCommand>,
    event_rx: Receiver<RecognitionEvent>,
    listening: Arc<AtomicBool>,
}

impl RecognizerHandle {
    /// Spawn the worker; the recognizer is built on the worker thread
    ///
    /// If `factory` fails, the worker stays up and answers every listen with
    /// [`RecognitionError::Device`] carrying the construction error.
    pub fn spawn<F>(factory: F, timeout: Duration) -> Result<Self>
    where
        F: FnOnce() -> Result<Box<dyn SpeechRecognizer>> + Send + 'static,
    {
        let (command_tx, command_rx) = bounded(4);
        let (event_tx, event_rx) = bounded(16);
        let listening = Arc::new(AtomicBool::new(false));
        let worker_listening = Arc::clone(&listening);

        thread::Builder::new()
            .name("catmini-recognizer".into())
            .spawn(move || {
                info!("Recognition worker starting");

                let mut recognizer = match factory() {
                    Ok(recognizer) => Ok(recognizer),
                    Err(e) => {
                        error!("Failed to initialize speech recognizer: {}", e);
                        Err(e.to_string())
                    }
                };

                loop {
                    match command_rx.recv() {
                        Ok(RecognitionCommand::Listen) => {
                            let result = match recognizer.as_mut() {
                                Ok(recognizer) => recognizer.listen(timeout),
                                Err(reason) => Err(RecognitionError::Device(reason.clone())),
                            };

                            let event = match result {
                                Ok(text) => {
                                    debug!("Recognized: {}", text);
                                    RecognitionEvent::Recognized(text)
                                }
                                Err(e) => {
                                    warn!("Recognition failed: {}", e);
                                    RecognitionEvent::Failed(e)
                                }
                            };

                            worker_listening.store(false, Ordering::SeqCst);
                            if event_tx.send(event).is_err() {
                                break;
                            }
                        }
                        Ok(RecognitionCommand::Shutdown) => {
                            info!("Recognition worker shutting down");
                            break;
                        }
                        Err(e) => {
                            debug!("Recognition command channel closed: {}", e);
                            break;
                        }
                    }
                }

                info!("Recognition worker stopped");
            })?;

        Ok(Self {
            command_tx,
            event_rx,
            listening,
        })
    }

    /// Request one listen; returns `false` if a listen is already running
    pub fn listen(&self) -> bool {
        if self
            .listening
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Listen requested while already listening");
            return false;
        }

        if let Err(e) = self.command_tx.try_send(RecognitionCommand::Listen) {
            warn!("Recognition worker unavailable: {}", e);
            self.listening.store(false, Ordering::SeqCst);
            return false;
        }
        true
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Next finished listen, if any
    pub fn try_recv(&self) -> Option<RecognitionEvent> {
        match self.event_rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn shutdown(&self) {
        let _ = self.command_tx.try_send(RecognitionCommand::Shutdown);
    }
}

impl Drop for RecognizerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
