//! Spoken playback of assistant messages
//!
//! - [`PlaybackSession`]: per-message Idle/Speaking/Interrupted state machine
//! - [`SpeechActor`]: single worker thread that owns the synthesizer
//! - [`AvatarAnimator`]: frame cycler driven from the UI loop
//! - [`PlaybackController`]: ties the three together on the UI thread

pub mod actor;
pub mod animator;
pub mod controller;
pub mod session;

pub use actor::{
    SpeechActor, SpeechCommand, SpeechEvent, SpeechFinish, SpeechHandle, UnavailableSynthesizer,
};
pub use animator::{AvatarAnimator, DEFAULT_FRAME_INTERVAL};
pub use controller::{PlaybackController, TransitionRecord};
pub use session::{PlaybackEffect, PlaybackIcon, PlaybackInput, PlaybackSession, PlaybackStatus};
