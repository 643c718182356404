use crate::{CatMiniError, Result};
use tracing::info;
use voice_activity_detector::VoiceActivityDetector as VadDetector;

/// Sample rate the Silero model runs at
pub const VAD_SAMPLE_RATE: u32 = 16000;

/// Samples per VAD frame (32ms at 16kHz)
pub const VAD_CHUNK_SIZE: usize = 512;

/// Voice Activity Detection using Silero VAD
pub struct VoiceActivityDetector {
    detector: VadDetector,
    threshold: f32,
}

impl VoiceActivityDetector {
    /// Create a detector for 16kHz mono audio
    ///
    /// `threshold` is the speech probability (0.0-1.0) above which a frame
    /// counts as speech.
    pub fn new(threshold: f32) -> Result<Self> {
        let detector = VadDetector::builder()
            .sample_rate(VAD_SAMPLE_RATE as i32)
            .chunk_size(VAD_CHUNK_SIZE)
            .build()
            .map_err(|e| {
                CatMiniError::AudioProcessingError(format!("Failed to create VAD: {:?}", e))
            })?;

        info!("Initialized VAD, threshold: {}", threshold);

        Ok(Self {
            detector,
            threshold: threshold.clamp(0.0, 1.0),
        })
    }

    /// Whether a frame of [`VAD_CHUNK_SIZE`] samples contains speech
    pub fn is_speech(&mut self, frame: &[f32]) -> bool {
        self.detector.predict(frame.iter().copied()) >= self.threshold
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Duration covered by one VAD frame
    pub fn frame_duration() -> std::time::Duration {
        std::time::Duration::from_millis(
            (VAD_CHUNK_SIZE as u64 * 1000) / VAD_SAMPLE_RATE as u64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_duration() {
        assert_eq!(
            VoiceActivityDetector::frame_duration(),
            std::time::Duration::from_millis(32)
        );
    }

    #[test]
    fn test_silence_is_not_speech() {
        if let Ok(mut vad) = VoiceActivityDetector::new(0.5) {
            assert!(!vad.is_speech(&[0.0f32; VAD_CHUNK_SIZE]));
        }
    }

    #[test]
    fn test_threshold_is_clamped() {
        if let Ok(vad) = VoiceActivityDetector::new(1.7) {
            assert_eq!(vad.threshold(), 1.0);
        }
    }
}
