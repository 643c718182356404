//! Application state management
//!
//! Everything the UI mutates lives here and is only touched from the UI
//! thread. Background workers report back through channels drained in
//! [`AppState::poll_events`].

use crate::integration::Services;
use crate::llm::{Answer, AnswerService};
use crate::messages::{ConversationLog, Message};
use crate::playback::{AvatarAnimator, PlaybackController, PlaybackIcon};
use crate::speech::{normalize_text_for_speech, RecognitionError, RecognitionEvent, RecognizerHandle};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

pub const LISTENING_NOTICE: &str = "🎤 Escuchando...";
pub const UNRECOGNIZED_NOTICE: &str = "❌ No entendí lo que dijiste";
pub const TIMEOUT_NOTICE: &str = "⏳ Tiempo de espera agotado";
pub const MIC_UNAVAILABLE_NOTICE: &str = "🎤 Micrófono no disponible";

const MAX_LOG_MESSAGES: usize = 100;

/// Debug information displayed in the debug panel
#[derive(Debug, Clone, Default)]
pub struct DebugInfo {
    pub fps: f32,
    /// Duration of the last answer fetch
    pub last_answer: Option<Duration>,
    pub answers_received: usize,
    pub failed_answers: usize,
    pub log_messages: VecDeque<String>,
}

impl DebugInfo {
    pub fn new() -> Self {
        Self {
            log_messages: VecDeque::with_capacity(MAX_LOG_MESSAGES),
            ..Default::default()
        }
    }

    pub fn add_log(&mut self, message: impl Into<String>) {
        if self.log_messages.len() >= MAX_LOG_MESSAGES {
            self.log_messages.pop_front();
        }
        let stamp = chrono::Local::now().format("%H:%M:%S");
        self.log_messages.push_back(format!("{} {}", stamp, message.into()));
    }
}

/// Central application state
pub struct AppState {
    pub log: ConversationLog,
    pub input_text: String,
    pub playback: PlaybackController,
    pub recognizer: RecognizerHandle,
    pub answers: AnswerService,
    pub debug_info: DebugInfo,
    pub show_debug_panel: bool,
    frame_times: VecDeque<f64>,
    /// Questions whose answer has not been drained yet
    pending_answers: usize,
    /// Set until the recognition result has been drained
    awaiting_voice: bool,
}

impl AppState {
    pub fn new(services: Services, avatar_frames: usize, frame_interval: Duration) -> Self {
        let Services {
            speech,
            recognizer,
            answers,
        } = services;

        Self {
            log: ConversationLog::new(),
            input_text: String::new(),
            playback: PlaybackController::new(speech, AvatarAnimator::new(avatar_frames, frame_interval)),
            recognizer,
            answers,
            debug_info: DebugInfo::new(),
            show_debug_panel: false,
            frame_times: VecDeque::with_capacity(60),
            pending_answers: 0,
            awaiting_voice: false,
        }
    }

    pub fn update_fps(&mut self, delta_time: f64) {
        self.frame_times.push_back(delta_time);
        if self.frame_times.len() > 60 {
            self.frame_times.pop_front();
        }

        let avg_time: f64 = self.frame_times.iter().sum::<f64>() / self.frame_times.len() as f64;
        self.debug_info.fps = if avg_time > 0.0 { 1.0 / avg_time as f32 } else { 0.0 };
    }

    /// Send the text box contents; returns `false` if there was nothing to send
    pub fn submit_text(&mut self) -> bool {
        let question = self.input_text.trim().to_string();
        if question.is_empty() {
            return false;
        }

        self.input_text.clear();
        self.ask(question);
        true
    }

    /// Start a voice question; returns `false` while a listen is running
    pub fn start_listening(&mut self) -> bool {
        if self.awaiting_voice || !self.recognizer.listen() {
            return false;
        }
        self.awaiting_voice = true;
        self.log.append(Message::system(LISTENING_NOTICE));
        self.debug_info.add_log("Listening for a question");
        true
    }

    /// True from the listen request until its result has been drained
    pub fn is_listening(&self) -> bool {
        self.awaiting_voice
    }

    /// Questions submitted whose answer has not reached the log yet
    pub fn pending_answers(&self) -> usize {
        self.pending_answers
    }

    /// Play/pause button of an assistant message
    pub fn toggle_playback(&mut self, message_id: Uuid, now: Instant) {
        if let Some(status) = self.playback.toggle(message_id, now) {
            self.debug_info
                .add_log(format!("Playback {} -> {:?}", short_id(message_id), status));
        }
    }

    pub fn playback_icon(&self, message_id: Uuid) -> Option<PlaybackIcon> {
        self.playback.icon(message_id)
    }

    /// Drain worker channels; call once per frame
    pub fn poll_events(&mut self, now: Instant) {
        while let Some(event) = self.recognizer.try_recv() {
            self.handle_recognition(event);
        }

        while let Some(answer) = self.answers.try_recv() {
            self.handle_answer(answer);
        }

        self.playback.poll_events(now);
    }

    /// Advance the avatar; returns when the next frame is due
    pub fn tick(&mut self, now: Instant) -> Option<Duration> {
        self.playback.tick(now)
    }

    /// Whether a background job may still deliver something
    ///
    /// Only flags cleared by [`AppState::poll_events`] count, so a result
    /// that lands after the last poll keeps the UI repainting.
    pub fn is_busy(&self) -> bool {
        self.pending_answers > 0 || self.awaiting_voice || self.playback.active().is_some()
    }

    pub fn shutdown(&mut self) {
        info!("Shutting down");
        self.playback.stop_all(Instant::now());
        self.answers.shutdown();
        self.recognizer.shutdown();
    }

    fn ask(&mut self, question: String) {
        self.log.append(Message::user(question.clone()));
        let request_id = self.answers.submit(question);
        self.pending_answers += 1;
        self.debug_info
            .add_log(format!("Question {} submitted", short_id(request_id)));
    }

    fn handle_recognition(&mut self, event: RecognitionEvent) {
        self.awaiting_voice = false;
        match event {
            RecognitionEvent::Recognized(text) if !text.trim().is_empty() => {
                debug!("Voice question: {}", text);
                self.ask(text.trim().to_string());
            }
            RecognitionEvent::Recognized(_) | RecognitionEvent::Failed(RecognitionError::Unrecognized) => {
                self.log.append(Message::system(UNRECOGNIZED_NOTICE));
            }
            RecognitionEvent::Failed(RecognitionError::TimedOut) => {
                self.log.append(Message::system(TIMEOUT_NOTICE));
            }
            RecognitionEvent::Failed(RecognitionError::Device(reason)) => {
                self.debug_info.add_log(format!("Microphone error: {}", reason));
                self.log
                    .append(Message::system(format!("{}: {}", MIC_UNAVAILABLE_NOTICE, reason)));
            }
        }
    }

    fn handle_answer(&mut self, answer: Answer) {
        self.pending_answers = self.pending_answers.saturating_sub(1);
        self.debug_info.answers_received += 1;
        if answer.failed {
            self.debug_info.failed_answers += 1;
        }
        self.debug_info.last_answer = Some(answer.elapsed);
        self.debug_info.add_log(format!(
            "Answer {} in {}ms{}",
            short_id(answer.request_id),
            answer.elapsed.as_millis(),
            if answer.failed { " (failed)" } else { "" }
        ));

        let spoken = normalize_text_for_speech(&answer.text);
        let message = Message::assistant(answer.text, spoken.clone());
        if message.is_speakable() {
            self.playback.register(message.id, spoken);
        }
        self.log.append(message);
    }
}

fn short_id(id: Uuid) -> String {
    id.to_string().chars().take(8).collect()
}
