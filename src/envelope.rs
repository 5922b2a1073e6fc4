// src/envelope.rs

/// Tunables for the amplitude-envelope reduction.
#[derive(Clone, Debug)]
pub struct EnvelopeOptions {
    /// Number of bars the UI draws; the envelope always has exactly this
    /// many points.
    pub buckets: usize,
    /// Level used for every point when no audio is loaded or the input is
    /// silent, so the UI still renders a visible flat bar.
    pub placeholder_level: f32,
}

impl Default for EnvelopeOptions {
    fn default() -> Self {
        Self {
            buckets: 200,
            placeholder_level: 0.1,
        }
    }
}

/// Fixed-length loudness summary of one track, normalized to [0, 1].
///
/// Derived once per decoded track and treated as immutable: redraws reuse it
/// without recomputation, and it is only rebuilt when the source audio
/// changes.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub points: Vec<f32>,
}

impl Envelope {
    /// The flat placeholder shown before a track is loaded (or after a
    /// decode failure). A valid, non-error outcome.
    pub fn placeholder(opts: &EnvelopeOptions) -> Self {
        Self {
            points: vec![opts.placeholder_level; opts.buckets],
        }
    }

    /// Reduce first-channel samples to `opts.buckets` mean-absolute-amplitude
    /// points, normalized so the loudest point is 1.0.
    ///
    /// Truly silent input falls back to the placeholder rather than dividing
    /// by a zero maximum. Inputs shorter than the bucket count clamp the
    /// block size to one sample and pad the tail with the last computed
    /// value, keeping the output length fixed.
    pub fn from_samples(samples: &[f32], opts: &EnvelopeOptions) -> Self {
        if samples.is_empty() || opts.buckets == 0 {
            return Self::placeholder(opts);
        }

        let block_size = (samples.len() / opts.buckets).max(1);
        let effective = if block_size == 1 {
            samples.len().min(opts.buckets)
        } else {
            opts.buckets
        };

        let mut points = Vec::with_capacity(opts.buckets);
        for i in 0..effective {
            let start = i * block_size;
            let block = &samples[start..start + block_size];
            let sum: f32 = block.iter().map(|s| s.abs()).sum();
            points.push(sum / block_size as f32);
        }

        let max = points.iter().cloned().fold(0.0f32, f32::max);
        if max <= 0.0 {
            return Self::placeholder(opts);
        }
        for p in &mut points {
            *p /= max;
        }

        // Short input: keep the envelope length invariant by repeating the
        // last value.
        if let Some(&last) = points.last() {
            while points.len() < opts.buckets {
                points.push(last);
            }
        }

        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> EnvelopeOptions {
        EnvelopeOptions::default()
    }

    #[test]
    fn envelope_has_fixed_length() {
        let samples: Vec<f32> = (0..44100).map(|i| (i as f32 * 0.01).sin()).collect();
        let env = Envelope::from_samples(&samples, &opts());
        assert_eq!(env.len(), 200);
    }

    #[test]
    fn non_silent_input_normalizes_to_one() {
        let samples: Vec<f32> = (0..20000).map(|i| (i as f32 * 0.13).sin() * 0.3).collect();
        let env = Envelope::from_samples(&samples, &opts());
        let max = env.points.iter().cloned().fold(0.0f32, f32::max);
        assert!((max - 1.0).abs() < 1e-6);
        assert!(env.points.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn silence_yields_placeholder() {
        let samples = vec![0.0f32; 48000];
        let env = Envelope::from_samples(&samples, &opts());
        assert_eq!(env, Envelope::placeholder(&opts()));
        assert!(env.points.iter().all(|&p| p == 0.1));
    }

    #[test]
    fn empty_input_yields_placeholder() {
        let env = Envelope::from_samples(&[], &opts());
        assert_eq!(env, Envelope::placeholder(&opts()));
    }

    #[test]
    fn short_input_pads_with_last_value() {
        // 5 samples against 200 buckets: one point per sample, tail padded.
        let samples = [0.1f32, 0.2, 0.4, 0.8, 0.4];
        let env = Envelope::from_samples(&samples, &opts());
        assert_eq!(env.len(), 200);
        assert!((env.points[3] - 1.0).abs() < 1e-6);
        assert!((env.points[4] - 0.5).abs() < 1e-6);
        // Padding repeats the final computed point.
        assert!(env.points[5..].iter().all(|&p| (p - 0.5).abs() < 1e-6));
    }

    #[test]
    fn envelope_is_deterministic() {
        let samples: Vec<f32> = (0..30000).map(|i| ((i * 7) % 100) as f32 / 100.0).collect();
        let a = Envelope::from_samples(&samples, &opts());
        let b = Envelope::from_samples(&samples, &opts());
        assert_eq!(a, b);
    }

    #[test]
    fn remainder_samples_are_dropped() {
        // 1050 samples / 200 buckets -> block of 5, last 50 samples ignored.
        let mut samples = vec![0.5f32; 1000];
        samples.extend(vec![1.0f32; 50]);
        let env = Envelope::from_samples(&samples, &opts());
        // Every block saw only 0.5-amplitude samples, so after normalization
        // the envelope is flat at 1.0.
        assert!(env.points.iter().all(|&p| (p - 1.0).abs() < 1e-6));
    }
}
