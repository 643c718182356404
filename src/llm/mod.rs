//! Answer generation through the Gemini API

pub mod answers;
pub mod config;
pub mod gemini;

pub use answers::{generation_failure_message, Answer, AnswerService, GENERATION_ERROR_PREFIX};
pub use config::GeminiConfig;
pub use gemini::{GeminiClient, TextGenerator};
