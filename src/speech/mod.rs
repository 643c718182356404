//! Speech processing for STT and TTS
//!
//! - Speech-to-text with Whisper, phrase capture gated by Silero VAD
//! - Text-to-speech with sherpa-rs VITS voices played through rodio

pub mod listener;
pub mod stt;
pub mod text;
pub mod tts;

pub use listener::{RecognitionEvent, RecognizerHandle};
#[cfg(feature = "audio-io")]
pub use stt::MicrophoneRecognizer;
pub use stt::{ListenConfig, RecognitionError, SpeechRecognizer, WhisperConfig, WhisperEngine};
pub use text::{normalize_text_for_speech, split_sentences};
pub use tts::{
    SpeechOutcome, SpeechSynthesizer, TTSConfig, TTSEngine, VitsSpeaker, VITS_SAMPLE_RATE,
};
