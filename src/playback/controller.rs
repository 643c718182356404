//! Playback controller: the registry of playback sessions
//!
//! Runs on the UI thread. It applies session transitions, carries out their
//! effects against the speech actor and the avatar animator, and reacts to
//! worker events polled once per frame.

use super::actor::{SpeechEvent, SpeechFinish, SpeechHandle};
use super::animator::AvatarAnimator;
use super::session::{PlaybackEffect, PlaybackIcon, PlaybackInput, PlaybackSession, PlaybackStatus};
use chrono::{DateTime, Local};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

/// Transitions kept for the debug panel
const MAX_HISTORY: usize = 100;

/// One recorded status change
#[derive(Debug, Clone)]
pub struct TransitionRecord {
    pub session_id: Uuid,
    pub input: PlaybackInput,
    pub from: PlaybackStatus,
    pub to: PlaybackStatus,
    pub at: DateTime<Local>,
}

pub struct PlaybackController {
    sessions: HashMap<Uuid, PlaybackSession>,
    /// Session whose utterance the speech worker currently owns
    active: Option<Uuid>,
    speech: SpeechHandle,
    animator: AvatarAnimator,
    history: VecDeque<TransitionRecord>,
}

impl PlaybackController {
    pub fn new(speech: SpeechHandle, animator: AvatarAnimator) -> Self {
        Self {
            sessions: HashMap::new(),
            active: None,
            speech,
            animator,
            history: VecDeque::with_capacity(MAX_HISTORY),
        }
    }

    /// Create an idle session for a message; a no-op if one exists
    pub fn register(&mut self, message_id: Uuid, spoken_text: impl Into<String>) {
        self.sessions
            .entry(message_id)
            .or_insert_with(|| PlaybackSession::new(spoken_text));
    }

    /// Play/pause button handler
    ///
    /// Starting a session first preempts whichever other session is speaking.
    /// Returns the session's status afterwards, which is never `Interrupted`.
    pub fn toggle(&mut self, session_id: Uuid, now: Instant) -> Option<PlaybackStatus> {
        let Some(speaking) = self.sessions.get(&session_id).map(|s| s.is_speaking()) else {
            warn!("Toggle for unknown playback session {}", session_id);
            return None;
        };

        if !speaking {
            if let Some(other) = self.active.filter(|id| *id != session_id) {
                self.transition(other, PlaybackInput::Preempted, now);
            }
        }

        self.transition(session_id, PlaybackInput::Toggle, now);
        self.status(session_id)
    }

    /// Drain speech worker events
    pub fn poll_events(&mut self, now: Instant) {
        while let Some(event) = self.speech.try_recv() {
            match event {
                SpeechEvent::Started {
                    session_id,
                    utterance_id,
                } => {
                    debug!("Session {} started utterance {}", session_id, utterance_id);
                }
                SpeechEvent::Finished {
                    session_id,
                    utterance_id,
                    outcome,
                } => {
                    if let SpeechFinish::Failed(reason) = &outcome {
                        warn!("Playback for session {} ended early: {}", session_id, reason);
                    }

                    let current = self.sessions.get(&session_id).and_then(|s| s.utterance());
                    if current == Some(utterance_id) {
                        self.transition(session_id, PlaybackInput::Finished, now);
                    } else {
                        debug!("Ignoring stale utterance {}", utterance_id);
                    }
                }
            }
        }
    }

    /// Advance the avatar; returns when the next frame is due
    pub fn tick(&mut self, now: Instant) -> Option<Duration> {
        self.animator.tick(now)
    }

    /// Stop whatever is speaking
    pub fn stop_all(&mut self, now: Instant) {
        if let Some(active) = self.active {
            if self.status(active) == Some(PlaybackStatus::Speaking) {
                self.transition(active, PlaybackInput::Toggle, now);
            }
        }
    }

    fn transition(&mut self, session_id: Uuid, input: PlaybackInput, now: Instant) {
        let Some(session) = self.sessions.get_mut(&session_id) else {
            return;
        };
        let from = session.status();
        let effects = session.apply(input);
        let to = session.status();

        if from != to {
            self.record(session_id, input, from, to);
        }

        let mut speech_failed = false;
        for effect in effects {
            match effect {
                PlaybackEffect::StartSpeech => {
                    speech_failed = !self.start_speech(session_id);
                }
                PlaybackEffect::StopSpeech => self.speech.stop(),
                PlaybackEffect::StartAvatar => self.animator.start(now),
                PlaybackEffect::StopAvatar => self.animator.stop(),
            }
        }

        if to != PlaybackStatus::Speaking && self.active == Some(session_id) {
            self.active = None;
        }

        // Stop signals are delivered synchronously through the token
        if to == PlaybackStatus::Interrupted {
            self.transition(session_id, PlaybackInput::StopDelivered, now);
        } else if speech_failed {
            self.transition(session_id, PlaybackInput::Finished, now);
        }
    }

    fn start_speech(&mut self, session_id: Uuid) -> bool {
        let Some(text) = self
            .sessions
            .get(&session_id)
            .map(|s| s.spoken_text().to_string())
        else {
            return false;
        };

        match self.speech.speak(session_id, text) {
            Ok(utterance_id) => {
                if let Some(session) = self.sessions.get_mut(&session_id) {
                    session.set_utterance(utterance_id);
                }
                self.active = Some(session_id);
                true
            }
            Err(e) => {
                warn!("Could not start playback for session {}: {}", session_id, e);
                false
            }
        }
    }

    fn record(&mut self, session_id: Uuid, input: PlaybackInput, from: PlaybackStatus, to: PlaybackStatus) {
        debug!("Session {}: {:?} -> {:?} on {:?}", session_id, from, to, input);
        if self.history.len() >= MAX_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(TransitionRecord {
            session_id,
            input,
            from,
            to,
            at: Local::now(),
        });
    }

    pub fn status(&self, session_id: Uuid) -> Option<PlaybackStatus> {
        self.sessions.get(&session_id).map(|s| s.status())
    }

    pub fn icon(&self, session_id: Uuid) -> Option<PlaybackIcon> {
        self.sessions.get(&session_id).map(|s| s.icon())
    }

    pub fn contains(&self, session_id: Uuid) -> bool {
        self.sessions.contains_key(&session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Session currently speaking, if any
    pub fn active(&self) -> Option<Uuid> {
        self.active
    }

    pub fn speaking_count(&self) -> usize {
        self.sessions.values().filter(|s| s.is_speaking()).count()
    }

    pub fn animator(&self) -> &AvatarAnimator {
        &self.animator
    }

    pub fn history(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.history.iter()
    }
}
