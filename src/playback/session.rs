//! Playback session state machine
//!
//! One session exists per speakable assistant message. The transition
//! function is pure: it updates the status and returns the side effects the
//! controller must carry out, so the lifecycle can be tested without a window
//! or a speech engine.

use uuid::Uuid;

/// Playback status of a single assistant message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// Not speaking
    Idle,
    /// The speech engine is voicing this message
    Speaking,
    /// A stop was requested and has not been delivered yet
    Interrupted,
}

/// Icon shown on the per-message toggle button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackIcon {
    Play,
    Pause,
}

/// Inputs accepted by the transition function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackInput {
    /// The user pressed the play/pause button
    Toggle,
    /// Another session started speaking
    Preempted,
    /// The stop signal reached the speech engine
    StopDelivered,
    /// The engine returned from the current utterance
    Finished,
}

/// Side effects requested by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEffect {
    StartSpeech,
    StopSpeech,
    StartAvatar,
    StopAvatar,
}

/// Playback lifecycle of one assistant message
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    spoken_text: String,
    status: PlaybackStatus,
    /// Utterance currently owned by this session, if any
    utterance: Option<Uuid>,
}

impl PlaybackSession {
    pub fn new(spoken_text: impl Into<String>) -> Self {
        Self {
            spoken_text: spoken_text.into(),
            status: PlaybackStatus::Idle,
            utterance: None,
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn spoken_text(&self) -> &str {
        &self.spoken_text
    }

    pub fn utterance(&self) -> Option<Uuid> {
        self.utterance
    }

    pub fn set_utterance(&mut self, utterance: Uuid) {
        self.utterance = Some(utterance);
    }

    pub fn is_speaking(&self) -> bool {
        self.status == PlaybackStatus::Speaking
    }

    pub fn icon(&self) -> PlaybackIcon {
        match self.status {
            PlaybackStatus::Speaking => PlaybackIcon::Pause,
            PlaybackStatus::Idle | PlaybackStatus::Interrupted => PlaybackIcon::Play,
        }
    }

    /// Apply an input and return the effects the caller must perform
    pub fn apply(&mut self, input: PlaybackInput) -> Vec<PlaybackEffect> {
        use PlaybackEffect::*;
        use PlaybackInput::*;
        use PlaybackStatus::*;

        let (next, effects) = match (self.status, input) {
            (Idle | Interrupted, Toggle) => (Speaking, vec![StartSpeech, StartAvatar]),
            (Speaking, Toggle) => (Interrupted, vec![StopSpeech, StopAvatar]),
            (Speaking, Preempted) => (Interrupted, vec![StopSpeech, StopAvatar]),
            (Speaking, Finished) => (Idle, vec![StopAvatar]),
            (Interrupted, StopDelivered | Finished) => (Idle, Vec::new()),
            (status, _) => (status, Vec::new()),
        };

        if next == Idle {
            self.utterance = None;
        }
        self.status = next;
        effects
    }
}
