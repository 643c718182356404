//! Background services the UI talks to
//!
//! Starts the speech actor, the recognition worker and the answer service
//! from an [`AppConfig`]. Tests build [`Services`] from fakes with
//! [`Services::from_parts`].

use super::config::AppConfig;
use crate::llm::{AnswerService, GeminiClient, TextGenerator};
use crate::playback::{SpeechActor, SpeechHandle};
use crate::speech::{RecognizerHandle, SpeechRecognizer, SpeechSynthesizer, VitsSpeaker};
use crate::{CatMiniError, Result};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::info;

pub struct Services {
    pub speech: SpeechHandle,
    pub recognizer: RecognizerHandle,
    pub answers: AnswerService,
}

impl Services {
    /// Start every worker
    ///
    /// Speech and recognition engines load on their own threads; if one
    /// fails to load, its worker reports the failure on first use instead of
    /// aborting startup.
    pub fn start(config: &AppConfig, runtime: Handle) -> Result<Self> {
        let generator: Arc<dyn TextGenerator> = Arc::new(GeminiClient::new(config.gemini.clone())?);
        let answers = AnswerService::new(generator, runtime, config.gemini.max_concurrent);

        let speech = if config.speech.enabled {
            let tts = config.speech.tts_config();
            SpeechActor::spawn(move || {
                Ok(Box::new(VitsSpeaker::new(tts)?) as Box<dyn SpeechSynthesizer>)
            })?
        } else {
            info!("Speech output disabled");
            SpeechActor::spawn(|| Err(CatMiniError::TTSError("speech output is disabled".into())))?
        };

        let recognizer = RecognizerHandle::spawn(
            recognizer_factory(config),
            config.recognition.listen_timeout,
        )?;

        info!("Services started");

        Ok(Self {
            speech,
            recognizer,
            answers,
        })
    }

    pub fn from_parts(speech: SpeechHandle, recognizer: RecognizerHandle, answers: AnswerService) -> Self {
        Self {
            speech,
            recognizer,
            answers,
        }
    }
}

type RecognizerFactory = Box<dyn FnOnce() -> Result<Box<dyn SpeechRecognizer>> + Send>;

#[cfg(feature = "audio-io")]
fn recognizer_factory(config: &AppConfig) -> RecognizerFactory {
    use crate::speech::MicrophoneRecognizer;

    if !config.recognition.enabled {
        return Box::new(|| Err(CatMiniError::AudioDeviceError("voice input is disabled".into())));
    }

    let whisper = config.recognition.whisper_config();
    let listen = config.recognition.listen_config();
    Box::new(move || {
        Ok(Box::new(MicrophoneRecognizer::new(whisper, listen)?) as Box<dyn SpeechRecognizer>)
    })
}

#[cfg(not(feature = "audio-io"))]
fn recognizer_factory(_config: &AppConfig) -> RecognizerFactory {
    Box::new(|| {
        Err(CatMiniError::AudioDeviceError(
            "built without audio input support".into(),
        ))
    })
}
