//! Audio capture and signal processing for speech recognition

#[cfg(feature = "audio-io")]
pub mod input;
pub mod resampler;
pub mod vad;

#[cfg(feature = "audio-io")]
pub use input::AudioInput;
pub use resampler::{resample_audio, AudioResampler};
pub use vad::{VoiceActivityDetector, VAD_CHUNK_SIZE, VAD_SAMPLE_RATE};

/// Average interleaved frames into a mono signal
pub fn downmix_to_mono(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_stereo() {
        let stereo = [1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(downmix_to_mono(&stereo, 2), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_downmix_mono_is_identity() {
        let mono = [0.1, 0.2];
        assert_eq!(downmix_to_mono(&mono, 1), mono.to_vec());
    }
}
