//! Fakes shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use catmini::integration::Services;
use catmini::llm::{AnswerService, TextGenerator};
use catmini::playback::{SpeechActor, SpeechHandle};
use catmini::speech::{RecognitionError, RecognizerHandle, SpeechOutcome, SpeechRecognizer, SpeechSynthesizer};
use catmini::ui::AppState;
use catmini::{CatMiniError, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Counters shared between a test and its fake synthesizer
#[derive(Clone, Default)]
pub struct SpeechRecorder {
    pub active: Arc<AtomicUsize>,
    pub max_active: Arc<AtomicUsize>,
    pub spoken: Arc<Mutex<Vec<String>>>,
    pub interrupted: Arc<AtomicUsize>,
}

impl SpeechRecorder {
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }
}

/// Synthesizer that "speaks" for a fixed time unless cancelled
pub struct FakeSynthesizer {
    duration: Duration,
    recorder: SpeechRecorder,
}

impl FakeSynthesizer {
    pub fn new(duration: Duration, recorder: SpeechRecorder) -> Self {
        Self { duration, recorder }
    }
}

impl SpeechSynthesizer for FakeSynthesizer {
    fn speak(&mut self, text: &str, cancel: &CancellationToken) -> Result<SpeechOutcome> {
        let now_active = self.recorder.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.recorder.max_active.fetch_max(now_active, Ordering::SeqCst);
        self.recorder.spoken.lock().push(text.to_string());

        let start = Instant::now();
        let outcome = loop {
            if cancel.is_cancelled() {
                self.recorder.interrupted.fetch_add(1, Ordering::SeqCst);
                break SpeechOutcome::Interrupted;
            }
            if start.elapsed() >= self.duration {
                break SpeechOutcome::Completed;
            }
            thread::sleep(Duration::from_millis(5));
        };

        self.recorder.active.fetch_sub(1, Ordering::SeqCst);
        Ok(outcome)
    }
}

pub fn spawn_speech(duration: Duration, recorder: SpeechRecorder) -> SpeechHandle {
    SpeechActor::spawn(move || Ok(Box::new(FakeSynthesizer::new(duration, recorder)) as Box<dyn SpeechSynthesizer>))
        .unwrap()
}

/// Recognizer that replays a fixed list of results
pub struct ScriptedRecognizer {
    results: VecDeque<std::result::Result<String, RecognitionError>>,
    delay: Duration,
}

impl ScriptedRecognizer {
    pub fn new(results: Vec<std::result::Result<String, RecognitionError>>) -> Self {
        Self {
            results: results.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl SpeechRecognizer for ScriptedRecognizer {
    fn listen(&mut self, _timeout: Duration) -> std::result::Result<String, RecognitionError> {
        thread::sleep(self.delay);
        self.results.pop_front().unwrap_or(Err(RecognitionError::TimedOut))
    }
}

/// Generator answering "Respuesta: <question>"
#[derive(Default)]
pub struct EchoGenerator {
    pub calls: AtomicUsize,
}

#[async_trait]
impl TextGenerator for EchoGenerator {
    async fn generate(&self, question: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("Respuesta: {}", question))
    }
}

pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _question: &str) -> Result<String> {
        Err(CatMiniError::GenerationError(
            "Gemini API error (503): The model is overloaded".into(),
        ))
    }
}

/// App state wired to fakes; keeps the runtime alive for the answer service
pub struct TestContext {
    pub runtime: tokio::runtime::Runtime,
    pub recorder: SpeechRecorder,
}

impl TestContext {
    pub fn new() -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        Self {
            runtime,
            recorder: SpeechRecorder::default(),
        }
    }

    pub fn state(
        &self,
        speech_duration: Duration,
        recognizer: ScriptedRecognizer,
        generator: Arc<dyn TextGenerator>,
    ) -> AppState {
        let speech = spawn_speech(speech_duration, self.recorder.clone());
        let recognizer = RecognizerHandle::spawn(
            move || Ok(Box::new(recognizer) as Box<dyn SpeechRecognizer>),
            Duration::from_secs(5),
        )
        .unwrap();
        let answers = AnswerService::new(generator, self.runtime.handle().clone(), 2);

        AppState::new(
            Services::from_parts(speech, recognizer, answers),
            4,
            Duration::from_millis(100),
        )
    }
}

/// Poll the state until `done` holds; false on timeout
pub fn wait_for(state: &mut AppState, mut done: impl FnMut(&AppState) -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        state.poll_events(Instant::now());
        if done(state) {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}
