//! # Audio Capture Module
//!
//! This module handles real-time audio capture using CPAL (Cross-Platform
//! Audio Library). It selects an input device, configures a mono 16-bit
//! stream, and forwards fixed-size sample blocks to the session loop over
//! a channel.
//!
//! ## Features
//! - Automatic audio device selection
//! - Closest-sample-rate configuration search
//! - Fixed-size block framing of the callback stream
//! - `BlockSource` adapter turning the callback stream into synchronous reads

use anyhow::{Result, anyhow};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};

use crate::session::BlockSource;

/// Starts audio capture from the default input device.
///
/// The capture callback accumulates incoming samples and forwards exact
/// `block_size` chunks through `sender`. Frames are dropped (`try_send`)
/// rather than blocking the audio callback when the consumer falls
/// behind.
///
/// # Arguments
/// * `sender` - Channel sender for streaming sample blocks to the session
/// * `target_rate` - Preferred sample rate in Hz (e.g. 44100)
/// * `block_size` - Samples per forwarded block
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Stream handle and the actual sample rate
/// * `Err(e)` - Error if no suitable device or format is available
pub fn start_audio_capture(
    sender: Sender<Vec<i16>>,
    target_rate: u32,
    block_size: usize,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    eprintln!("[AUDIO] Using input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, target_rate)
        .ok_or_else(|| anyhow!("No suitable i16 mono input format found"))?;

    let rate = target_rate.clamp(
        supported_config.min_sample_rate().0,
        supported_config.max_sample_rate().0,
    );
    let config = supported_config.with_sample_rate(cpal::SampleRate(rate));

    let sample_rate_val = config.sample_rate().0;
    let config: cpal::StreamConfig = config.into();

    eprintln!("[AUDIO] Selected sample rate: {} Hz", sample_rate_val);

    let err_fn = |err| eprintln!("[AUDIO] An error occurred on the audio stream: {}", err);

    // This buffer accumulates audio data from the callback.
    let mut audio_buffer = Vec::with_capacity(block_size * 2);

    let stream = device.build_input_stream(
        &config,
        move |data: &[i16], _: &cpal::InputCallbackInfo| {
            audio_buffer.extend_from_slice(data);

            // While we have enough data for a full block, forward it.
            while audio_buffer.len() >= block_size {
                let block = audio_buffer[..block_size].to_vec();
                let _ = sender.try_send(block);
                audio_buffer.drain(..block_size);
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate_val))
}

/// Finds the best supported audio configuration for the target sample rate.
///
/// Filters for mono signed 16-bit formats and picks the range whose bounds
/// sit closest to the target rate.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.channels() == 1 && c.sample_format() == cpal::SampleFormat::I16)
        .min_by_key(|c| {
            let min_diff = (c.min_sample_rate().0 as i32 - target_rate as i32).abs();
            let max_diff = (c.max_sample_rate().0 as i32 - target_rate as i32).abs();
            min_diff.min(max_diff)
        })
}

/// Adapter exposing a block channel as a synchronous [`BlockSource`].
///
/// The session loop blocks on `read_block` until the capture callback
/// delivers the next block; a disconnected channel reads as end of
/// stream, not as an error.
pub struct ChannelSource {
    receiver: Receiver<Vec<i16>>,
}

impl ChannelSource {
    pub fn new(receiver: Receiver<Vec<i16>>) -> Self {
        Self { receiver }
    }
}

impl BlockSource for ChannelSource {
    fn read_block(&mut self, buf: &mut [i16]) -> Result<Option<usize>> {
        match self.receiver.recv() {
            Ok(block) => {
                let n = block.len().min(buf.len());
                buf[..n].copy_from_slice(&block[..n]);
                Ok(Some(n))
            }
            // Capture side hung up: the stream is over.
            Err(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_source_delivers_blocks_in_order() {
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(vec![1i16; 4]).unwrap();
        tx.send(vec![2i16; 4]).unwrap();

        let mut source = ChannelSource::new(rx);
        let mut buf = [0i16; 4];
        assert_eq!(source.read_block(&mut buf).unwrap(), Some(4));
        assert_eq!(buf, [1, 1, 1, 1]);
        assert_eq!(source.read_block(&mut buf).unwrap(), Some(4));
        assert_eq!(buf, [2, 2, 2, 2]);
    }

    #[test]
    fn channel_source_reports_short_reads() {
        let (tx, rx) = crossbeam_channel::unbounded();
        tx.send(vec![7i16; 2]).unwrap();

        let mut source = ChannelSource::new(rx);
        let mut buf = [0i16; 4];
        assert_eq!(source.read_block(&mut buf).unwrap(), Some(2));
    }

    #[test]
    fn disconnected_channel_reads_as_end_of_stream() {
        let (tx, rx) = crossbeam_channel::unbounded::<Vec<i16>>();
        drop(tx);

        let mut source = ChannelSource::new(rx);
        let mut buf = [0i16; 4];
        assert_eq!(source.read_block(&mut buf).unwrap(), None);
    }
}
