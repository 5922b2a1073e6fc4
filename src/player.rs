// src/player.rs

use std::sync::{
    atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SizedSample, Stream, StreamConfig};
use rubato::{
    calculate_cutoff, Resampler, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};

use crate::decoder::DecodedAudio;

struct PlayerShared {
    samples: Vec<f32>,
    playing: AtomicBool,
    frame: AtomicUsize,
    volume: AtomicU32,
}

/// In-memory mono preview playback.
///
/// The whole track is already decoded for analysis, so playback reads
/// straight out of the sample buffer instead of streaming through a decode
/// thread. Play/pause, seek, and volume are atomics shared with the output
/// callback.
pub struct PreviewPlayer {
    _stream: Stream,
    shared: Arc<PlayerShared>,
    output_sample_rate: u32,
}

impl PreviewPlayer {
    /// Opens the default output device and starts paused at position 0.
    pub fn new(audio: &DecodedAudio) -> Result<Self, anyhow::Error> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("no audio output device available")?;
        let supported = device.default_output_config()?;
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.config();
        let output_channels = config.channels as usize;
        let output_sample_rate = config.sample_rate.0;

        log::info!(
            "output device: {} ch @ {} Hz",
            output_channels,
            output_sample_rate
        );

        let samples = if audio.sample_rate == output_sample_rate {
            audio.channel_data.clone()
        } else {
            resample_mono(&audio.channel_data, audio.sample_rate, output_sample_rate)?
        };

        let shared = Arc::new(PlayerShared {
            samples,
            playing: AtomicBool::new(false),
            frame: AtomicUsize::new(0),
            volume: AtomicU32::new(1.0f32.to_bits()),
        });

        let err_fn = |err| log::error!("output stream error: {err}");
        let stream = match sample_format {
            SampleFormat::F32 => {
                build_stream::<f32>(&device, &config, shared.clone(), output_channels, err_fn)?
            }
            SampleFormat::I16 => {
                build_stream::<i16>(&device, &config, shared.clone(), output_channels, err_fn)?
            }
            SampleFormat::U16 => {
                build_stream::<u16>(&device, &config, shared.clone(), output_channels, err_fn)?
            }
            other => anyhow::bail!("unsupported sample format: {other:?}"),
        };
        stream.play()?;

        Ok(Self {
            _stream: stream,
            shared,
            output_sample_rate,
        })
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.shared.samples.len() as f64 / self.output_sample_rate as f64)
    }

    pub fn position(&self) -> Duration {
        let frame = self.shared.frame.load(Ordering::Relaxed) as f64;
        Duration::from_secs_f64(frame / self.output_sample_rate as f64)
    }

    pub fn play(&self) {
        self.shared.playing.store(true, Ordering::Relaxed);
    }

    pub fn pause(&self) {
        self.shared.playing.store(false, Ordering::Relaxed);
    }

    pub fn toggle(&self) {
        self.shared.playing.fetch_xor(true, Ordering::Relaxed);
    }

    pub fn is_playing(&self) -> bool {
        self.shared.playing.load(Ordering::Relaxed)
    }

    pub fn seek(&self, pos: Duration) {
        let frame = (pos.as_secs_f64() * self.output_sample_rate as f64).round() as usize;
        self.shared
            .frame
            .store(frame.min(self.shared.samples.len()), Ordering::Relaxed);
    }

    pub fn set_volume(&self, level: f32) {
        let clamped = level.clamp(0.0, 1.0);
        self.shared.volume.store(clamped.to_bits(), Ordering::Relaxed);
    }

    pub fn volume(&self) -> f32 {
        f32::from_bits(self.shared.volume.load(Ordering::Relaxed))
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    shared: Arc<PlayerShared>,
    output_channels: usize,
    err_fn: fn(cpal::StreamError),
) -> Result<Stream, anyhow::Error>
where
    T: cpal::Sample + cpal::FromSample<f32> + SizedSample,
{
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let vol = f32::from_bits(shared.volume.load(Ordering::Relaxed));
                for frame_out in data.chunks_mut(output_channels) {
                    let mut s = 0.0f32;
                    if shared.playing.load(Ordering::Relaxed) {
                        let frame = shared.frame.load(Ordering::Relaxed);
                        if frame < shared.samples.len() {
                            s = shared.samples[frame] * vol;
                            shared.frame.store(frame + 1, Ordering::Relaxed);
                        } else {
                            // Ran off the end; the transport layer resets
                            // the position.
                            shared.playing.store(false, Ordering::Relaxed);
                        }
                    }
                    for out in frame_out.iter_mut() {
                        *out = T::from_sample(s);
                    }
                }
            },
            err_fn,
            None,
        )
        .map_err(Into::into)
}

/// One-shot sample-rate conversion of the whole mono buffer to the output
/// device rate.
fn resample_mono(input: &[f32], src_rate: u32, dst_rate: u32) -> Result<Vec<f32>, anyhow::Error> {
    let ratio = dst_rate as f64 / src_rate as f64;
    let sinc_len = 256usize;
    let window = WindowFunction::BlackmanHarris2;
    let params = SincInterpolationParameters {
        sinc_len,
        f_cutoff: calculate_cutoff(sinc_len, window),
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window,
    };
    let chunk_size = 1024;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk_size, 1)?;

    let mut out = Vec::with_capacity((input.len() as f64 * ratio) as usize + chunk_size);
    let mut pos = 0usize;
    loop {
        let need = resampler.input_frames_next();
        if input.len() - pos < need {
            break;
        }
        let block = vec![input[pos..pos + need].to_vec()];
        let produced = resampler.process(&block, None)?;
        out.extend_from_slice(&produced[0]);
        pos += need;
    }
    if pos < input.len() {
        let tail = vec![input[pos..].to_vec()];
        let produced = resampler.process_partial(Some(&tail), None)?;
        out.extend_from_slice(&produced[0]);
    }
    let flushed = resampler.process_partial::<Vec<f32>>(None, None)?;
    if !flushed.is_empty() {
        out.extend_from_slice(&flushed[0]);
    }
    Ok(out)
}
