use super::downmix_to_mono;
use crate::{CatMiniError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use crossbeam_channel::Sender;
use tracing::{debug, error, info};

/// Microphone capture on the default input device
///
/// Captured frames are down-mixed to mono and pushed to a channel. The
/// underlying stream is not `Send`, so an `AudioInput` lives on the thread
/// that opened it.
pub struct AudioInput {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
}

impl AudioInput {
    /// Open the default input device
    pub fn open_default() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| CatMiniError::AudioDeviceError("No input device available".into()))?;

        info!(
            "Using input device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let config = device
            .default_input_config()
            .map_err(|e| {
                CatMiniError::AudioDeviceError(format!("Failed to get input config: {}", e))
            })?
            .into();

        Ok(Self {
            device,
            config,
            stream: None,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    /// Start capturing; mono chunks are sent to `audio_tx`
    pub fn start(&mut self, audio_tx: Sender<Vec<f32>>) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let channels = self.config.channels as usize;

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Err(e) = audio_tx.try_send(downmix_to_mono(data, channels)) {
                        debug!("Dropping captured audio: {}", e);
                    }
                },
                |err| error!("Audio input stream error: {}", err),
                None,
            )
            .map_err(|e| {
                CatMiniError::AudioDeviceError(format!("Failed to build input stream: {}", e))
            })?;

        stream.play().map_err(|e| {
            CatMiniError::AudioDeviceError(format!("Failed to start input stream: {}", e))
        })?;

        self.stream = Some(stream);
        debug!("Microphone capture started");
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            debug!("Microphone capture stopped");
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.stream.is_some()
    }
}

impl Drop for AudioInput {
    fn drop(&mut self) {
        self.stop();
    }
}
