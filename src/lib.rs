pub mod audio;
pub mod integration;
pub mod llm;
pub mod messages;
pub mod playback;
pub mod speech;
pub mod ui;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum CatMiniError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Asset load error: {0}")]
    AssetLoadError(String),

    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    #[error("Audio processing error: {0}")]
    AudioProcessingError(String),

    #[error("Model load error: {0}")]
    ModelLoadError(String),

    #[error("Transcription error: {0}")]
    TranscriptionError(String),

    #[error("Generation error: {0}")]
    GenerationError(String),

    #[error("TTS error: {0}")]
    TTSError(String),

    #[error("IO error: {0}")]
    IOError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),
}

impl From<std::io::Error> for CatMiniError {
    fn from(e: std::io::Error) -> Self {
        CatMiniError::IOError(e.to_string())
    }
}

impl CatMiniError {
    /// Check if this error is recoverable
    ///
    /// Non-recoverable errors abort the launch; everything else is surfaced
    /// in the conversation and the session continues.
    pub fn is_recoverable(&self) -> bool {
        match self {
            CatMiniError::ConfigError(_) => false,
            CatMiniError::AssetLoadError(_) => false,
            // Hardware/device errors may require user intervention
            CatMiniError::AudioDeviceError(_) => false,
            CatMiniError::AudioProcessingError(_) => true,
            // Model errors require restarting
            CatMiniError::ModelLoadError(_) => false,
            CatMiniError::TranscriptionError(_) => true,
            CatMiniError::GenerationError(_) => true,
            CatMiniError::TTSError(_) => true,
            CatMiniError::IOError(_) => false,
            CatMiniError::ChannelError(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            CatMiniError::ConfigError(_) => {
                "Configuration error. Please check your settings and GEMINI_API_KEY.".to_string()
            }
            CatMiniError::AssetLoadError(_) => {
                "Failed to load application images. Please reinstall CatMini.".to_string()
            }
            CatMiniError::AudioDeviceError(_) => {
                "Audio device error. Please check your microphone/speakers.".to_string()
            }
            CatMiniError::AudioProcessingError(_) => {
                "Audio processing failed. Please try again.".to_string()
            }
            CatMiniError::ModelLoadError(_) => {
                "Failed to load a speech model. Please verify model files are present.".to_string()
            }
            CatMiniError::TranscriptionError(_) => {
                "Speech recognition failed. Please try again.".to_string()
            }
            CatMiniError::GenerationError(_) => {
                "Could not get an answer from Gemini. Please try again.".to_string()
            }
            CatMiniError::TTSError(_) => {
                "Text-to-speech failed. The answer is still shown as text.".to_string()
            }
            CatMiniError::IOError(_) => "File system error occurred.".to_string(),
            CatMiniError::ChannelError(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CatMiniError>;
