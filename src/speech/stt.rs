//! Speech-to-text: a single bounded listen on the microphone
//!
//! Audio is captured until the end of one spoken phrase, then transcribed
//! with Whisper. Voice activity detection decides when the phrase starts and
//! ends; if no speech starts before the timeout the listen gives up.

use crate::{CatMiniError, Result};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Why a listen produced no question
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    #[error("speech was not understood")]
    Unrecognized,

    #[error("no speech before the listen timeout")]
    TimedOut,

    #[error("microphone unavailable: {0}")]
    Device(String),
}

impl From<CatMiniError> for RecognitionError {
    fn from(e: CatMiniError) -> Self {
        RecognitionError::Device(e.to_string())
    }
}

/// A microphone-backed recognizer
///
/// `listen` blocks the calling thread until a phrase was recognized, the
/// timeout elapsed without speech, or the device failed.
pub trait SpeechRecognizer {
    fn listen(&mut self, timeout: Duration) -> std::result::Result<String, RecognitionError>;
}

/// Configuration for the Whisper speech-to-text engine
#[derive(Clone, Debug)]
pub struct WhisperConfig {
    /// Path to the Whisper model file
    pub model_path: PathBuf,

    /// Language to transcribe (None for auto-detection)
    pub language: Option<String>,

    /// Number of threads to use for transcription
    pub n_threads: i32,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/ggml-base.bin"),
            language: Some("es".to_string()),
            n_threads: 4,
        }
    }
}

/// Phrase segmentation parameters
#[derive(Clone, Debug)]
pub struct ListenConfig {
    /// Speech probability threshold for the VAD
    pub vad_threshold: f32,

    /// Trailing silence that ends a phrase
    pub silence_duration: Duration,

    /// Hard limit on the length of one phrase
    pub max_phrase_duration: Duration,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            vad_threshold: 0.5,
            silence_duration: Duration::from_millis(800),
            max_phrase_duration: Duration::from_secs(15),
        }
    }
}

/// Where a listen currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhraseState {
    WaitingForSpeech,
    InPhrase,
    Complete,
    TimedOut,
}

/// Tracks phrase boundaries from per-frame VAD decisions
#[derive(Debug, Clone)]
pub struct PhraseTracker {
    config: ListenConfig,
    timeout: Duration,
    waited: Duration,
    phrase: Duration,
    silence: Duration,
    state: PhraseState,
}

impl PhraseTracker {
    pub fn new(config: ListenConfig, timeout: Duration) -> Self {
        Self {
            config,
            timeout,
            waited: Duration::ZERO,
            phrase: Duration::ZERO,
            silence: Duration::ZERO,
            state: PhraseState::WaitingForSpeech,
        }
    }

    pub fn state(&self) -> PhraseState {
        self.state
    }

    /// Record one frame and return the resulting state
    pub fn push(&mut self, is_speech: bool, frame: Duration) -> PhraseState {
        match self.state {
            PhraseState::WaitingForSpeech => {
                if is_speech {
                    debug!("Speech started after {:?}", self.waited);
                    self.state = PhraseState::InPhrase;
                    self.phrase = frame;
                } else {
                    self.waited += frame;
                    if self.waited >= self.timeout {
                        self.state = PhraseState::TimedOut;
                    }
                }
            }
            PhraseState::InPhrase => {
                self.phrase += frame;
                if is_speech {
                    self.silence = Duration::ZERO;
                } else {
                    self.silence += frame;
                }

                if self.silence >= self.config.silence_duration
                    || self.phrase >= self.config.max_phrase_duration
                {
                    debug!("Phrase complete after {:?}", self.phrase);
                    self.state = PhraseState::Complete;
                }
            }
            PhraseState::Complete | PhraseState::TimedOut => {}
        }
        self.state
    }
}

/// Whisper output that stands for noise rather than words, e.g. `[BLANK_AUDIO]`
pub fn is_non_speech_marker(text: &str) -> bool {
    let text = text.trim();
    (text.starts_with('[') && text.ends_with(']')) || (text.starts_with('(') && text.ends_with(')'))
}

/// Whisper speech-to-text engine
pub struct WhisperEngine {
    config: WhisperConfig,
    context: WhisperContext,
}

impl WhisperEngine {
    pub fn new(config: WhisperConfig) -> Result<Self> {
        info!("Loading Whisper model from: {:?}", config.model_path);

        if !config.model_path.exists() {
            return Err(CatMiniError::ModelLoadError(format!(
                "Model file not found: {:?}",
                config.model_path
            )));
        }

        let model_path = config
            .model_path
            .to_str()
            .ok_or_else(|| CatMiniError::ModelLoadError("Invalid model path".to_string()))?;

        let context =
            WhisperContext::new_with_params(model_path, WhisperContextParameters::default())
                .map_err(|e| {
                    CatMiniError::ModelLoadError(format!("Failed to load Whisper model: {:?}", e))
                })?;

        info!("Whisper model loaded successfully");

        Ok(Self { config, context })
    }

    /// Transcribe 16kHz mono samples
    pub fn transcribe(&self, samples: &[f32]) -> Result<String> {
        if samples.is_empty() {
            return Err(CatMiniError::TranscriptionError(
                "Empty audio segment".to_string(),
            ));
        }

        debug!(
            "Transcribing {} samples ({:.2}s)",
            samples.len(),
            samples.len() as f32 / 16000.0
        );

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_n_threads(self.config.n_threads);
        params.set_translate(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        if let Some(ref lang) = self.config.language {
            params.set_language(Some(lang));
        }

        let mut state = self.context.create_state().map_err(|e| {
            CatMiniError::TranscriptionError(format!("Failed to create state: {:?}", e))
        })?;

        state.full(params, samples).map_err(|e| {
            CatMiniError::TranscriptionError(format!("Transcription failed: {:?}", e))
        })?;

        let num_segments = state.full_n_segments().map_err(|e| {
            CatMiniError::TranscriptionError(format!("Failed to get segments: {:?}", e))
        })?;

        let mut text = String::new();
        for i in 0..num_segments {
            let segment = state.full_get_segment_text(i).map_err(|e| {
                CatMiniError::TranscriptionError(format!("Failed to get segment text: {:?}", e))
            })?;
            text.push_str(&segment);
        }

        let text = text.trim().to_string();
        debug!("Transcription result: '{}'", text);
        Ok(text)
    }
}

#[cfg(feature = "audio-io")]
pub use microphone::MicrophoneRecognizer;

#[cfg(feature = "audio-io")]
mod microphone {
    use super::*;
    use crate::audio::{AudioInput, AudioResampler, VoiceActivityDetector, VAD_CHUNK_SIZE, VAD_SAMPLE_RATE};
    use crossbeam_channel::bounded;
    use std::collections::VecDeque;
    use tracing::warn;

    /// Frames kept from before the detected start of speech (~300ms)
    const PREROLL_FRAMES: usize = 10;

    /// Longest gap between captured chunks before the device counts as stalled
    const STALL_LIMIT: Duration = Duration::from_secs(2);

    /// Default microphone + VAD + Whisper recognizer
    pub struct MicrophoneRecognizer {
        whisper: WhisperEngine,
        config: ListenConfig,
    }

    impl MicrophoneRecognizer {
        pub fn new(whisper: WhisperConfig, config: ListenConfig) -> Result<Self> {
            Ok(Self {
                whisper: WhisperEngine::new(whisper)?,
                config,
            })
        }

        /// Capture one phrase of 16kHz audio
        fn capture_phrase(&self, timeout: Duration) -> std::result::Result<Vec<f32>, RecognitionError> {
            let (audio_tx, audio_rx) = bounded::<Vec<f32>>(64);
            let mut input = AudioInput::open_default()?;
            let mut resampler = if input.sample_rate() != VAD_SAMPLE_RATE {
                Some(AudioResampler::new(input.sample_rate(), VAD_SAMPLE_RATE)?)
            } else {
                None
            };
            let mut vad = VoiceActivityDetector::new(self.config.vad_threshold)?;
            let mut tracker = PhraseTracker::new(self.config.clone(), timeout);
            let frame_duration = VoiceActivityDetector::frame_duration();

            let mut pending: Vec<f32> = Vec::new();
            let mut preroll: VecDeque<Vec<f32>> = VecDeque::with_capacity(PREROLL_FRAMES + 1);
            let mut phrase: Vec<f32> = Vec::new();

            input.start(audio_tx)?;

            loop {
                let chunk = audio_rx.recv_timeout(STALL_LIMIT).map_err(|_| {
                    RecognitionError::Device("microphone stopped delivering audio".to_string())
                })?;
                let chunk = match resampler.as_mut() {
                    Some(resampler) => resampler.push(&chunk)?,
                    None => chunk,
                };
                pending.extend(chunk);

                while pending.len() >= VAD_CHUNK_SIZE {
                    let frame: Vec<f32> = pending.drain(..VAD_CHUNK_SIZE).collect();
                    let is_speech = vad.is_speech(&frame);

                    match tracker.push(is_speech, frame_duration) {
                        PhraseState::WaitingForSpeech => {
                            preroll.push_back(frame);
                            if preroll.len() > PREROLL_FRAMES {
                                preroll.pop_front();
                            }
                        }
                        PhraseState::InPhrase => {
                            if phrase.is_empty() {
                                phrase.extend(preroll.drain(..).flatten());
                            }
                            phrase.extend(frame);
                        }
                        PhraseState::Complete => {
                            phrase.extend(frame);
                            input.stop();
                            return Ok(phrase);
                        }
                        PhraseState::TimedOut => {
                            input.stop();
                            return Err(RecognitionError::TimedOut);
                        }
                    }
                }
            }
        }
    }

    impl SpeechRecognizer for MicrophoneRecognizer {
        fn listen(&mut self, timeout: Duration) -> std::result::Result<String, RecognitionError> {
            let phrase = self.capture_phrase(timeout)?;

            let text = self.whisper.transcribe(&phrase).map_err(|e| {
                warn!("Transcription failed: {}", e);
                RecognitionError::Unrecognized
            })?;

            if text.is_empty() || is_non_speech_marker(&text) {
                return Err(RecognitionError::Unrecognized);
            }
            Ok(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(32);

    fn tracker(timeout: Duration) -> PhraseTracker {
        PhraseTracker::new(ListenConfig::default(), timeout)
    }

    #[test]
    fn test_whisper_config_default() {
        let config = WhisperConfig::default();
        assert_eq!(config.language, Some("es".to_string()));
        assert_eq!(config.n_threads, 4);
    }

    #[test]
    fn test_silence_times_out() {
        let mut tracker = tracker(Duration::from_secs(5));
        let frames = Duration::from_secs(5).as_millis() / FRAME.as_millis();
        for _ in 0..frames {
            assert_eq!(tracker.push(false, FRAME), PhraseState::WaitingForSpeech);
        }
        assert_eq!(tracker.push(false, FRAME), PhraseState::TimedOut);
        // Terminal
        assert_eq!(tracker.push(true, FRAME), PhraseState::TimedOut);
    }

    #[test]
    fn test_phrase_ends_after_trailing_silence() {
        let mut tracker = tracker(Duration::from_secs(5));
        assert_eq!(tracker.push(false, FRAME), PhraseState::WaitingForSpeech);
        assert_eq!(tracker.push(true, FRAME), PhraseState::InPhrase);
        for _ in 0..20 {
            assert_eq!(tracker.push(true, FRAME), PhraseState::InPhrase);
        }
        // 800ms of silence = 25 frames of 32ms
        for _ in 0..24 {
            assert_eq!(tracker.push(false, FRAME), PhraseState::InPhrase);
        }
        assert_eq!(tracker.push(false, FRAME), PhraseState::Complete);
    }

    #[test]
    fn test_speech_resets_silence() {
        let mut tracker = tracker(Duration::from_secs(5));
        tracker.push(true, FRAME);
        for _ in 0..20 {
            tracker.push(false, FRAME);
        }
        tracker.push(true, FRAME);
        for _ in 0..20 {
            assert_eq!(tracker.push(false, FRAME), PhraseState::InPhrase);
        }
    }

    #[test]
    fn test_timeout_only_applies_before_speech() {
        let mut tracker = tracker(Duration::from_millis(100));
        assert_eq!(tracker.push(true, FRAME), PhraseState::InPhrase);
        for _ in 0..10 {
            tracker.push(true, FRAME);
        }
        assert_eq!(tracker.state(), PhraseState::InPhrase);
    }

    #[test]
    fn test_long_phrase_is_capped() {
        let config = ListenConfig {
            max_phrase_duration: Duration::from_millis(320),
            ..Default::default()
        };
        let mut tracker = PhraseTracker::new(config, Duration::from_secs(5));
        for _ in 0..9 {
            assert_eq!(tracker.push(true, FRAME), PhraseState::InPhrase);
        }
        assert_eq!(tracker.push(true, FRAME), PhraseState::Complete);
    }

    #[test]
    fn test_non_speech_markers() {
        assert!(is_non_speech_marker("[BLANK_AUDIO]"));
        assert!(is_non_speech_marker(" (música) "));
        assert!(!is_non_speech_marker("¿Qué hora es?"));
    }
}
