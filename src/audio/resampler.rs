use crate::{CatMiniError, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

/// Frames handed to the sinc resampler per call
const BLOCK_FRAMES: usize = 1024;

/// Streaming mono resampler
///
/// Samples can be pushed in chunks of any size; output is produced whenever a
/// full block is available and the remainder is kept until the next push or
/// [`AudioResampler::flush`].
pub struct AudioResampler {
    resampler: SincFixedIn<f32>,
    pending: Vec<f32>,
    input_rate: u32,
    output_rate: u32,
}

impl AudioResampler {
    pub fn new(input_rate: u32, output_rate: u32) -> Result<Self> {
        if input_rate == 0 || output_rate == 0 {
            return Err(CatMiniError::ConfigError(
                "Sample rates must be greater than 0".into(),
            ));
        }

        let params = SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        };

        let resampler = SincFixedIn::<f32>::new(
            output_rate as f64 / input_rate as f64,
            2.0,
            params,
            BLOCK_FRAMES,
            1,
        )
        .map_err(|e| {
            CatMiniError::AudioProcessingError(format!("Failed to create resampler: {}", e))
        })?;

        debug!("Created resampler: {} Hz -> {} Hz", input_rate, output_rate);

        Ok(Self {
            resampler,
            pending: Vec::with_capacity(BLOCK_FRAMES * 2),
            input_rate,
            output_rate,
        })
    }

    /// Feed samples and return whatever output full blocks produce
    pub fn push(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        self.pending.extend_from_slice(input);

        let mut output = Vec::new();
        loop {
            let needed = self.resampler.input_frames_next();
            if self.pending.len() < needed {
                break;
            }
            let block: Vec<f32> = self.pending.drain(..needed).collect();
            output.extend(self.process_block(block)?);
        }

        Ok(output)
    }

    /// Resample the buffered remainder, zero-padding the final block
    pub fn flush(&mut self) -> Result<Vec<f32>> {
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }

        let frames = self.pending.len();
        let mut block = std::mem::take(&mut self.pending);
        block.resize(self.resampler.input_frames_next(), 0.0);

        let mut output = self.process_block(block)?;
        let keep = (frames as f64 * self.ratio()).ceil() as usize;
        output.truncate(keep);
        Ok(output)
    }

    fn process_block(&mut self, block: Vec<f32>) -> Result<Vec<f32>> {
        let input = vec![block];
        let mut planar = self
            .resampler
            .process(&input, None)
            .map_err(|e| CatMiniError::AudioProcessingError(format!("Resampling failed: {}", e)))?;
        Ok(planar.swap_remove(0))
    }

    pub fn ratio(&self) -> f64 {
        self.output_rate as f64 / self.input_rate as f64
    }

    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }
}

/// Resample a whole mono buffer in one step
pub fn resample_audio(input: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>> {
    if input_rate == output_rate {
        return Ok(input.to_vec());
    }

    let mut resampler = AudioResampler::new(input_rate, output_rate)?;
    let mut output = resampler.push(input)?;
    output.extend(resampler.flush()?);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_rates() {
        assert!(AudioResampler::new(0, 16000).is_err());
        assert!(AudioResampler::new(48000, 0).is_err());
    }

    #[test]
    fn test_same_rate_is_passthrough() {
        let input = vec![0.1, 0.2, 0.3];
        assert_eq!(resample_audio(&input, 16000, 16000).unwrap(), input);
    }

    #[test]
    fn test_downsampling_length() {
        let input: Vec<f32> = (0..48000).map(|i| (i as f32 * 0.01).sin()).collect();
        let output = resample_audio(&input, 48000, 16000).unwrap();
        // Roughly one third, allowing for filter delay
        assert!(output.len() > 15000 && output.len() <= 16100, "got {}", output.len());
    }

    #[test]
    fn test_push_buffers_partial_blocks() {
        let mut resampler = AudioResampler::new(48000, 16000).unwrap();
        let output = resampler.push(&[0.0; 100]).unwrap();
        assert!(output.is_empty());
        let flushed = resampler.flush().unwrap();
        assert!(flushed.len() <= 34);
        assert!(resampler.flush().unwrap().is_empty());
    }
}
