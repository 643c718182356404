//! Application configuration
//!
//! The Gemini API key comes from the environment (a `.env` file is honored).
//! Everything else has a default and can be overridden in an optional TOML
//! file at `$CATMINI_CONFIG` or `<config dir>/catmini/config.toml`.

use crate::llm::config::duration_secs;
use crate::llm::GeminiConfig;
use crate::speech::{ListenConfig, TTSConfig, WhisperConfig};
use crate::{CatMiniError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const CONFIG_PATH_VAR: &str = "CATMINI_CONFIG";

/// Top-level configuration
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub speech: SpeechSettings,
    pub recognition: RecognitionSettings,
    pub avatar: AvatarSettings,
    /// Directory holding the window icon, button icons and avatar
    pub assets_dir: Option<PathBuf>,
}

/// Spoken answers
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    pub enabled: bool,
    /// VITS model (.onnx)
    pub model_path: PathBuf,
    pub tokens_path: PathBuf,
    /// espeak-ng data directory for Piper voices
    pub data_dir: Option<PathBuf>,
    /// Speaking rate in words per minute
    pub rate_wpm: u32,
    pub speaker_id: i32,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model_path: PathBuf::from("models/vits-piper-es_ES-davefx-medium/es_ES-davefx-medium.onnx"),
            tokens_path: PathBuf::from("models/vits-piper-es_ES-davefx-medium/tokens.txt"),
            data_dir: Some(PathBuf::from("models/vits-piper-es_ES-davefx-medium/espeak-ng-data")),
            rate_wpm: 175,
            speaker_id: 0,
        }
    }
}

impl SpeechSettings {
    pub fn tts_config(&self) -> TTSConfig {
        let mut config = TTSConfig::new(
            self.model_path.to_string_lossy(),
            self.tokens_path.to_string_lossy(),
        )
        .with_speaker(self.speaker_id)
        .with_rate_wpm(self.rate_wpm);
        if let Some(data_dir) = &self.data_dir {
            config = config.with_data_dir(data_dir.to_string_lossy());
        }
        config
    }
}

/// Voice questions
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RecognitionSettings {
    pub enabled: bool,
    /// Whisper ggml model
    pub model_path: PathBuf,
    pub language: Option<String>,
    pub n_threads: i32,
    /// How long to wait for speech to begin
    #[serde(with = "duration_secs")]
    pub listen_timeout: Duration,
    pub vad_threshold: f32,
    /// Trailing silence that ends a phrase, in milliseconds
    pub silence_ms: u64,
    #[serde(with = "duration_secs")]
    pub max_phrase: Duration,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        let whisper = WhisperConfig::default();
        let listen = ListenConfig::default();
        Self {
            enabled: true,
            model_path: whisper.model_path,
            language: whisper.language,
            n_threads: whisper.n_threads,
            listen_timeout: Duration::from_secs(5),
            vad_threshold: listen.vad_threshold,
            silence_ms: listen.silence_duration.as_millis() as u64,
            max_phrase: listen.max_phrase_duration,
        }
    }
}

impl RecognitionSettings {
    pub fn whisper_config(&self) -> WhisperConfig {
        WhisperConfig {
            model_path: self.model_path.clone(),
            language: self.language.clone(),
            n_threads: self.n_threads,
        }
    }

    pub fn listen_config(&self) -> ListenConfig {
        ListenConfig {
            vad_threshold: self.vad_threshold,
            silence_duration: Duration::from_millis(self.silence_ms),
            max_phrase_duration: self.max_phrase,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AvatarSettings {
    pub frame_interval_ms: u64,
}

impl Default for AvatarSettings {
    fn default() -> Self {
        Self {
            frame_interval_ms: 100,
        }
    }
}

impl AvatarSettings {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(10))
    }
}

impl AppConfig {
    /// Load `.env`, the optional config file and the API key
    pub fn load() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded environment from {}", path.display()),
            Err(e) => debug!("No .env file loaded: {}", e),
        }

        let explicit = std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from);
        let mut config = match (&explicit, default_config_path()) {
            (Some(path), _) => Self::from_file(path)?,
            (None, Some(path)) if path.exists() => Self::from_file(&path)?,
            _ => {
                debug!("No config file, using defaults");
                Self::default()
            }
        };

        config.gemini.api_key = resolve_api_key(std::env::var(API_KEY_VAR).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CatMiniError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| CatMiniError::ConfigError(format!("{}: {}", path.display(), e)))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CatMiniError::ConfigError(e.to_string()))
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.gemini.api_key = api_key.into();
        self
    }

    /// Text-only mode: no speech models required
    pub fn without_audio(mut self) -> Self {
        self.speech.enabled = false;
        self.recognition.enabled = false;
        self
    }

    /// Check everything needed before the window opens
    pub fn validate(&self) -> Result<()> {
        if self.gemini.api_key.trim().is_empty() {
            return Err(CatMiniError::ConfigError(format!("{} is not set", API_KEY_VAR)));
        }
        if self.gemini.model.trim().is_empty() {
            return Err(CatMiniError::ConfigError("Gemini model name is empty".into()));
        }

        if self.speech.enabled {
            require_file(&self.speech.model_path, "TTS model")?;
            require_file(&self.speech.tokens_path, "TTS tokens file")?;
            if !(50..=400).contains(&self.speech.rate_wpm) {
                return Err(CatMiniError::ConfigError(format!(
                    "Speech rate must be between 50 and 400 wpm, got {}",
                    self.speech.rate_wpm
                )));
            }
        }

        if self.recognition.enabled {
            require_file(&self.recognition.model_path, "Whisper model")?;
        }

        if let Some(dir) = &self.assets_dir {
            if !dir.is_dir() {
                return Err(CatMiniError::AssetLoadError(format!(
                    "Assets directory not found: {}",
                    dir.display()
                )));
            }
        }

        Ok(())
    }
}

/// `<config dir>/catmini/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("catmini").join("config.toml"))
}

/// Turn the raw environment value into a usable key
pub fn resolve_api_key(value: Option<String>) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(CatMiniError::ConfigError(format!(
            "{} is not set. Add it to the environment or a .env file.",
            API_KEY_VAR
        ))),
    }
}

fn require_file(path: &Path, what: &str) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(CatMiniError::ModelLoadError(format!(
            "{} not found: {}",
            what,
            path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.speech.enabled);
        assert!(config.recognition.enabled);
        assert_eq!(config.speech.rate_wpm, 175);
        assert_eq!(config.recognition.language.as_deref(), Some("es"));
        assert_eq!(config.recognition.listen_timeout, Duration::from_secs(5));
        assert_eq!(config.avatar.frame_interval(), Duration::from_millis(100));
        assert_eq!(config.gemini.model, "gemini-1.5-flash");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            assets_dir = "/opt/catmini/assets"

            [gemini]
            model = "gemini-1.5-pro"
            timeout = 30

            [speech]
            rate_wpm = 150

            [recognition]
            listen_timeout = 8
            silence_ms = 1200
            "#,
        )
        .unwrap();

        assert_eq!(config.gemini.model, "gemini-1.5-pro");
        assert_eq!(config.gemini.timeout, Duration::from_secs(30));
        assert_eq!(config.gemini.max_concurrent, 2);
        assert_eq!(config.speech.rate_wpm, 150);
        assert!(config.speech.enabled);
        assert_eq!(config.recognition.listen_timeout, Duration::from_secs(8));
        assert_eq!(
            config.recognition.listen_config().silence_duration,
            Duration::from_millis(1200)
        );
        assert_eq!(config.assets_dir, Some(PathBuf::from("/opt/catmini/assets")));
    }

    #[test]
    fn test_api_key_is_not_read_from_file() {
        let config = AppConfig::from_toml_str("[gemini]\napi_key = \"from-file\"\n");
        // Unknown fields are ignored; the key stays empty
        assert!(config.map(|c| c.gemini.api_key.is_empty()).unwrap_or(true));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            AppConfig::from_toml_str("[speech]\nrate_wpm = \"fast\""),
            Err(CatMiniError::ConfigError(_))
        ));
    }

    #[test]
    fn test_resolve_api_key() {
        assert_eq!(resolve_api_key(Some(" abc ".into())).unwrap(), "abc");
        assert!(resolve_api_key(Some("   ".into())).is_err());
        assert!(resolve_api_key(None).is_err());
    }

    #[test]
    fn test_validate_requires_key() {
        let config = AppConfig::default().without_audio();
        assert!(matches!(config.validate(), Err(CatMiniError::ConfigError(_))));
        assert!(config.with_api_key("key").validate().is_ok());
    }

    #[test]
    fn test_validate_checks_enabled_models() {
        let mut config = AppConfig::default().with_api_key("key").without_audio();
        config.speech.enabled = true;
        config.speech.model_path = PathBuf::from("/nonexistent/voice.onnx");
        assert!(matches!(config.validate(), Err(CatMiniError::ModelLoadError(_))));

        let mut config = AppConfig::default().with_api_key("key").without_audio();
        config.recognition.enabled = true;
        config.recognition.model_path = PathBuf::from("/nonexistent/ggml.bin");
        assert!(matches!(config.validate(), Err(CatMiniError::ModelLoadError(_))));
    }

    #[test]
    fn test_validate_checks_assets_dir() {
        let mut config = AppConfig::default().with_api_key("key").without_audio();
        config.assets_dir = Some(PathBuf::from("/nonexistent/assets"));
        assert!(matches!(config.validate(), Err(CatMiniError::AssetLoadError(_))));
    }

    #[test]
    fn test_tts_config_from_settings() {
        let settings = SpeechSettings::default();
        let tts = settings.tts_config();
        assert!(tts.model_path.ends_with(".onnx"));
        assert!(tts.data_dir.is_some());
        assert!(tts.length_scale > 1.0);
    }
}
