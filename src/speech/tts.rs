//! Text-to-speech with sherpa-rs (VITS models) played through rodio
//!
//! [`TTSEngine`] turns text into samples. [`VitsSpeaker`] owns an engine and
//! an output stream and implements [`SpeechSynthesizer`], speaking one
//! sentence at a time so a cancellation is honored within a sentence's
//! playback rather than after the whole answer.

use super::text::split_sentences;
use crate::audio::resample_audio;
use crate::{CatMiniError, Result};
use rodio::{OutputStream, OutputStreamHandle, Sink};
use sherpa_rs::tts::{VitsTts, VitsTtsConfig};
use std::path::Path;
use std::thread;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Native sample rate of most Piper VITS voices
pub const VITS_SAMPLE_RATE: u32 = 22050;

/// Words per minute the engine speaks at with a speed factor of 1.0
pub const BASE_RATE_WPM: u32 = 200;

/// How often playback checks for cancellation
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Configuration for the TTS engine
#[derive(Clone, Debug)]
pub struct TTSConfig {
    /// Path to the ONNX model file
    pub model_path: String,

    /// Path to the tokens file
    pub tokens_path: String,

    /// Path to espeak-ng data, needed by Piper voices
    pub data_dir: Option<String>,

    /// Length scale (1.0 = normal, <1.0 = faster, >1.0 = slower)
    pub length_scale: f32,

    pub noise_scale: f32,
    pub noise_scale_w: f32,

    /// Speaker for multi-speaker models
    pub speaker_id: i32,

    /// Rate samples are played at; synthesized audio is resampled to it
    pub output_sample_rate: u32,
}

impl Default for TTSConfig {
    fn default() -> Self {
        Self {
            model_path: String::new(),
            tokens_path: String::new(),
            data_dir: None,
            length_scale: 1.0,
            noise_scale: 0.667,
            noise_scale_w: 0.8,
            speaker_id: 0,
            output_sample_rate: VITS_SAMPLE_RATE,
        }
    }
}

impl TTSConfig {
    pub fn new(model_path: impl Into<String>, tokens_path: impl Into<String>) -> Self {
        Self {
            model_path: model_path.into(),
            tokens_path: tokens_path.into(),
            ..Default::default()
        }
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<String>) -> Self {
        self.data_dir = Some(data_dir.into());
        self
    }

    pub fn with_speaker(mut self, speaker_id: i32) -> Self {
        self.speaker_id = speaker_id;
        self
    }

    /// Speed factor; higher is faster
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.length_scale = 1.0 / speed.max(0.1);
        self
    }

    /// Speaking rate in words per minute
    pub fn with_rate_wpm(self, rate_wpm: u32) -> Self {
        self.with_speed(rate_wpm as f32 / BASE_RATE_WPM as f32)
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.output_sample_rate = sample_rate;
        self
    }
}

/// How an utterance ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechOutcome {
    /// All audio was played
    Completed,
    /// Cancelled before the end
    Interrupted,
}

/// Something that can speak text aloud, blocking until done or cancelled
///
/// `text` is already prepared with
/// [`normalize_text_for_speech`](super::text::normalize_text_for_speech).
/// Implementations must return promptly once `cancel` fires and must leave
/// no audio playing when they return.
pub trait SpeechSynthesizer {
    fn speak(&mut self, text: &str, cancel: &CancellationToken) -> Result<SpeechOutcome>;
}

/// TTS engine wrapping sherpa-rs VitsTts
pub struct TTSEngine {
    tts: VitsTts,
    config: TTSConfig,
}

impl TTSEngine {
    pub fn new(config: TTSConfig) -> Result<Self> {
        if config.model_path.is_empty() {
            return Err(CatMiniError::ConfigError("TTS model path is required".into()));
        }
        if config.tokens_path.is_empty() {
            return Err(CatMiniError::ConfigError("TTS tokens path is required".into()));
        }
        if !Path::new(&config.model_path).exists() {
            return Err(CatMiniError::ModelLoadError(format!(
                "TTS model not found: {}",
                config.model_path
            )));
        }
        if !Path::new(&config.tokens_path).exists() {
            return Err(CatMiniError::ModelLoadError(format!(
                "TTS tokens file not found: {}",
                config.tokens_path
            )));
        }

        info!("Loading VITS TTS model from: {}", config.model_path);

        let vits_config = VitsTtsConfig {
            model: config.model_path.clone(),
            tokens: config.tokens_path.clone(),
            data_dir: config.data_dir.clone().unwrap_or_default(),
            length_scale: config.length_scale,
            noise_scale: config.noise_scale,
            noise_scale_w: config.noise_scale_w,
            ..Default::default()
        };

        let tts = VitsTts::new(vits_config);

        info!("TTS engine initialized");

        Ok(Self { tts, config })
    }

    /// Synthesize already-normalized text to mono samples at the output rate
    pub fn synthesize(&mut self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let audio = self
            .tts
            .create(text, self.config.speaker_id, 1.0)
            .map_err(|e| CatMiniError::TTSError(format!("Synthesis failed: {}", e)))?;

        let model_rate = audio.sample_rate as u32;
        let samples = if model_rate != self.config.output_sample_rate {
            resample_audio(&audio.samples, model_rate, self.config.output_sample_rate)?
        } else {
            audio.samples
        };

        debug!(
            "Synthesized {} samples ({:.2}s)",
            samples.len(),
            samples.len() as f32 / self.config.output_sample_rate as f32
        );

        Ok(samples)
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.output_sample_rate
    }
}

/// Speaks through the default output device
///
/// Holds a rodio `OutputStream`, which is not `Send`; build it on the thread
/// that will use it.
pub struct VitsSpeaker {
    engine: TTSEngine,
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
}

impl VitsSpeaker {
    pub fn new(config: TTSConfig) -> Result<Self> {
        let engine = TTSEngine::new(config)?;
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| CatMiniError::AudioDeviceError(format!("No output device: {}", e)))?;

        info!("Audio playback initialized on default output device");

        Ok(Self {
            engine,
            _stream: stream,
            stream_handle,
        })
    }

    /// Block until the sink drains or `cancel` fires
    fn wait_for_drain(sink: &Sink, cancel: &CancellationToken) -> SpeechOutcome {
        while !sink.empty() {
            if cancel.is_cancelled() {
                sink.stop();
                return SpeechOutcome::Interrupted;
            }
            thread::sleep(CANCEL_POLL_INTERVAL);
        }
        SpeechOutcome::Completed
    }
}

impl SpeechSynthesizer for VitsSpeaker {
    fn speak(&mut self, text: &str, cancel: &CancellationToken) -> Result<SpeechOutcome> {
        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| CatMiniError::AudioDeviceError(format!("Failed to open sink: {}", e)))?;
        let sample_rate = self.engine.sample_rate();

        for sentence in split_sentences(text) {
            if cancel.is_cancelled() {
                sink.stop();
                return Ok(SpeechOutcome::Interrupted);
            }

            let samples = match self.engine.synthesize(&sentence) {
                Ok(samples) => samples,
                Err(e) => {
                    sink.stop();
                    return Err(e);
                }
            };
            if samples.is_empty() {
                continue;
            }

            sink.append(rodio::buffer::SamplesBuffer::new(1, sample_rate, samples));
        }

        Ok(Self::wait_for_drain(&sink, cancel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tts_config_default() {
        let config = TTSConfig::default();
        assert_eq!(config.output_sample_rate, VITS_SAMPLE_RATE);
        assert_eq!(config.speaker_id, 0);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_tts_config_builder() {
        let config = TTSConfig::new("model.onnx", "tokens.txt")
            .with_data_dir("espeak-ng-data")
            .with_speaker(3)
            .with_sample_rate(48000)
            .with_speed(1.5);

        assert_eq!(config.model_path, "model.onnx");
        assert_eq!(config.tokens_path, "tokens.txt");
        assert_eq!(config.data_dir.as_deref(), Some("espeak-ng-data"));
        assert_eq!(config.speaker_id, 3);
        assert_eq!(config.output_sample_rate, 48000);
        assert!((config.length_scale - 0.667).abs() < 0.01);
    }

    #[test]
    fn test_rate_wpm_maps_to_length_scale() {
        let config = TTSConfig::default().with_rate_wpm(175);
        // 175 wpm is slower than the base rate
        assert!(config.length_scale > 1.0);
        assert!((config.length_scale - 200.0 / 175.0).abs() < 0.001);

        let config = TTSConfig::default().with_rate_wpm(BASE_RATE_WPM);
        assert!((config.length_scale - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_engine_requires_paths() {
        assert!(matches!(
            TTSEngine::new(TTSConfig::default()),
            Err(CatMiniError::ConfigError(_))
        ));
        assert!(matches!(
            TTSEngine::new(TTSConfig::new("missing.onnx", "missing.txt")),
            Err(CatMiniError::ModelLoadError(_))
        ));
    }
}
