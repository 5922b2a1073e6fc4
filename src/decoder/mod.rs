// src/decoder/mod.rs

use std::fs::File;
use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::default::{get_codecs, get_probe};

use crate::error::DecodeError;

/// One fully decoded track, reduced to the first (left) channel.
///
/// Created once per upload/playback session and discarded after the derived
/// products (envelope, BPM) are computed. Never mutated in place.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub sample_rate: u32,
    /// First-channel samples in [-1.0, 1.0].
    pub channel_data: Vec<f32>,
    pub duration_seconds: f64,
}

impl DecodedAudio {
    pub fn is_silent(&self) -> bool {
        self.channel_data.iter().all(|s| *s == 0.0)
    }
}

/// Decode an in-memory byte buffer (the upload path).
pub fn decode_bytes(bytes: Vec<u8>) -> Result<DecodedAudio, DecodeError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
    decode_source(mss)
}

/// Decode a file from disk (the playback-preview path).
pub fn decode_file(path: &str) -> Result<DecodedAudio, DecodeError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    decode_source(mss)
}

fn decode_source(mss: MediaSourceStream) -> Result<DecodedAudio, DecodeError> {
    // The probe and decoder handles live only for this call; dropping them on
    // every exit path releases the decoding context.
    let probed = get_probe()
        .format(
            &Default::default(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(DecodeError::Probe)?;
    let mut format = probed.format;

    let track = format.default_track().ok_or(DecodeError::NoAudioTrack)?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(DecodeError::Codec)?;

    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut channel_data = Vec::<f32>::new();

    let mut sample_rate = codec_params.sample_rate.unwrap_or(44100);
    let mut rate_locked = false;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            // End of stream, or a mid-stream fault we cannot recover from.
            Err(_) => break,
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            // Skip over damaged packets rather than abandoning the track.
            Err(SymphoniaError::IoError(_)) => continue,
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(_) => break,
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count();
        if channels == 0 {
            continue;
        }

        // Lock the rate on the first packet that carries frames.
        if !rate_locked {
            if decoded.frames() == 0 {
                continue;
            }
            sample_rate = spec.rate;
            rate_locked = true;
            log::debug!("locked format: {} Hz / {} ch", sample_rate, channels);
        }

        if sample_buf
            .as_ref()
            .map_or(true, |b| b.capacity() < decoded.capacity())
        {
            sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
        }
        let buf = match sample_buf.as_mut() {
            Some(b) => b,
            None => continue,
        };
        buf.copy_interleaved_ref(decoded);

        // Keep channel 0 only; the envelope and tempo paths never look at
        // the other channels.
        for frame in buf.samples().chunks(channels) {
            channel_data.push(frame[0]);
        }
    }

    if channel_data.is_empty() {
        return Err(DecodeError::EmptyStream);
    }

    let duration_seconds = channel_data.len() as f64 / sample_rate as f64;
    log::debug!(
        "decoded {} samples ({:.2}s)",
        channel_data.len(),
        duration_seconds
    );

    Ok(DecodedAudio {
        sample_rate,
        channel_data,
        duration_seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(samples: &[f32], sample_rate: u32, channels: u16) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn decodes_mono_wav() {
        let samples: Vec<f32> = (0..4410)
            .map(|i| (i as f32 / 4410.0 * std::f32::consts::TAU).sin() * 0.5)
            .collect();
        let bytes = wav_bytes(&samples, 44100, 1);

        let decoded = decode_bytes(bytes).unwrap();
        assert_eq!(decoded.sample_rate, 44100);
        assert_eq!(decoded.channel_data.len(), 4410);
        assert!((decoded.duration_seconds - 0.1).abs() < 1e-6);
        assert!(!decoded.is_silent());
    }

    #[test]
    fn keeps_first_channel_of_stereo() {
        // Left channel ramps, right channel is silent.
        let mut interleaved = Vec::new();
        for i in 0..1000 {
            interleaved.push(i as f32 / 1000.0);
            interleaved.push(0.0);
        }
        let bytes = wav_bytes(&interleaved, 22050, 2);

        let decoded = decode_bytes(bytes).unwrap();
        assert_eq!(decoded.channel_data.len(), 1000);
        assert!(decoded.channel_data[900] > 0.8);
    }

    #[test]
    fn rejects_garbage_bytes() {
        let err = decode_bytes(vec![0x42; 128]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Probe(_) | DecodeError::NoAudioTrack
        ));
    }

    #[test]
    fn empty_wav_is_an_empty_stream() {
        let bytes = wav_bytes(&[], 44100, 1);
        assert!(matches!(
            decode_bytes(bytes),
            Err(DecodeError::EmptyStream) | Err(DecodeError::Probe(_))
        ));
    }
}
