//! Startup wiring: configuration and background services

pub mod config;
pub mod services;

pub use config::{AppConfig, AvatarSettings, RecognitionSettings, SpeechSettings};
pub use services::Services;
