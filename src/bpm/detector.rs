// src/bpm/detector.rs

use crate::bpm::utils::{peak_abs, rms, trimmed_mean};

/// Tempo estimate for one track.
#[derive(Debug, Clone, PartialEq)]
pub struct TempoResult {
    /// Integer BPM after octave correction.
    pub bpm: u32,
    /// Uncorrected estimate, kept for diagnostics.
    pub raw_bpm: f32,
    /// Number of onset peaks the estimate was built from.
    pub peak_count: usize,
}

#[derive(Clone, Debug)]
pub struct TempoOptions {
    /// Samples per analysis block when scanning for onsets.
    pub analysis_block: usize,
    /// Fixed detection floor so quiet recordings do not produce spurious
    /// peaks.
    pub threshold_floor: f32,
    /// Signal-adaptive component: threshold = max(floor, rms * scale).
    pub threshold_rms_scale: f32,
    /// Minimum time between two accepted onsets, preventing double-counting
    /// a single transient.
    pub refractory_secs: f32,
    /// Fraction of the sorted inter-peak intervals discarded from each end
    /// before averaging.
    pub trim_fraction: f32,
    /// Musically plausible range; raw estimates above `max_plausible` are
    /// octave-corrected down into it.
    pub min_plausible: u32,
    pub max_plausible: u32,
}

impl Default for TempoOptions {
    fn default() -> Self {
        Self {
            analysis_block: 2048,
            threshold_floor: 0.15,
            threshold_rms_scale: 1.5,
            refractory_secs: 0.2,
            trim_fraction: 0.2,
            min_plausible: 70,
            max_plausible: 150,
        }
    }
}

/// Onset-interval tempo estimator.
///
/// Picks amplitude peaks over fixed blocks, takes the trimmed mean of the
/// inter-peak intervals, and folds implausibly fast results down by small
/// integer factors. A best-effort heuristic, not a precision DSP component:
/// when fewer than two onsets are found the estimate is inconclusive and the
/// caller keeps a null BPM.
pub struct TempoDetector {
    opts: TempoOptions,
}

impl TempoDetector {
    pub fn new() -> Self {
        Self {
            opts: TempoOptions::default(),
        }
    }

    pub fn with_options(opts: TempoOptions) -> Self {
        Self { opts }
    }

    /// Estimate the tempo of first-channel samples. `None` means
    /// inconclusive, never an error.
    pub fn detect(&self, samples: &[f32], sample_rate: u32) -> Option<TempoResult> {
        let opts = &self.opts;
        if samples.is_empty() || sample_rate == 0 || opts.analysis_block == 0 {
            return None;
        }

        let threshold = opts.threshold_floor.max(rms(samples) * opts.threshold_rms_scale);
        let refractory = (opts.refractory_secs * sample_rate as f32) as usize;

        // Peak times in seconds, registered at the start of the block that
        // crossed the threshold.
        let mut peaks: Vec<f32> = Vec::new();
        let mut last_peak_start: Option<usize> = None;

        for (block_idx, block) in samples.chunks(opts.analysis_block).enumerate() {
            let start = block_idx * opts.analysis_block;
            if peak_abs(block) <= threshold {
                continue;
            }
            let clear = last_peak_start.map_or(true, |p| start - p >= refractory);
            if clear {
                peaks.push(start as f32 / sample_rate as f32);
                last_peak_start = Some(start);
            }
        }

        if peaks.len() < 2 {
            log::debug!("tempo inconclusive: {} peak(s) found", peaks.len());
            return None;
        }

        let mut intervals: Vec<f32> = peaks.windows(2).map(|w| w[1] - w[0]).collect();
        intervals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let avg = trimmed_mean(&intervals, opts.trim_fraction)?;
        if avg <= f32::EPSILON {
            return None;
        }

        let raw_bpm = 60.0 / avg;
        let raw = raw_bpm.round() as u32;
        let bpm = correct_octave(raw, opts);

        Some(TempoResult {
            bpm,
            raw_bpm,
            peak_count: peaks.len(),
        })
    }
}

impl Default for TempoDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Fold an implausibly fast raw estimate down to the perceptual beat.
///
/// Peak-picking on percussive sub-beat transients tends to land on tempo
/// multiples; dividing by 2, 3, or 4 usually recovers the felt tempo.
pub fn correct_octave(raw: u32, opts: &TempoOptions) -> u32 {
    if raw <= opts.max_plausible {
        return raw;
    }
    for div in [2u32, 3, 4] {
        let candidate = (raw as f32 / div as f32).round() as u32;
        if candidate >= opts.min_plausible && candidate <= opts.max_plausible {
            return candidate;
        }
    }
    (raw as f32 / 2.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Perfectly periodic impulses, `period` seconds apart. The rate is
    /// chosen so clicks land exactly on analysis-block boundaries.
    fn click_track(sample_rate: u32, period: f32, seconds: f32) -> Vec<f32> {
        let len = (sample_rate as f32 * seconds) as usize;
        let mut samples = vec![0.0f32; len];
        let step = (sample_rate as f32 * period) as usize;
        let mut i = 0;
        while i < len {
            for j in i..(i + 32).min(len) {
                samples[j] = 1.0;
            }
            i += step;
        }
        samples
    }

    #[test]
    fn click_track_at_120_bpm() {
        // 32768 Hz: 0.5s = 16384 samples = exactly 8 analysis blocks.
        let samples = click_track(32768, 0.5, 30.0);
        let result = TempoDetector::new().detect(&samples, 32768).unwrap();
        assert!(
            (118..=122).contains(&result.bpm),
            "got {} bpm",
            result.bpm
        );
        assert!(result.peak_count >= 50);
    }

    #[test]
    fn sub_beat_clicks_fold_down_to_120() {
        // Clicks every 0.25s -> raw 240 BPM -> halved into range.
        let samples = click_track(32768, 0.25, 30.0);
        let result = TempoDetector::new().detect(&samples, 32768).unwrap();
        assert!((238.0..=242.0).contains(&result.raw_bpm));
        assert!((118..=122).contains(&result.bpm), "got {} bpm", result.bpm);
    }

    #[test]
    fn octave_correction_boundary() {
        let opts = TempoOptions::default();
        // 150 is still plausible; 151 triggers the correction search.
        assert_eq!(correct_octave(150, &opts), 150);
        assert_eq!(correct_octave(151, &opts), 76);
        assert_eq!(correct_octave(240, &opts), 120);
        assert_eq!(correct_octave(300, &opts), 150);
        assert_eq!(correct_octave(360, &opts), 120);
    }

    #[test]
    fn silence_is_inconclusive() {
        let samples = vec![0.0f32; 32768 * 5];
        assert!(TempoDetector::new().detect(&samples, 32768).is_none());
    }

    #[test]
    fn single_peak_is_inconclusive() {
        let mut samples = vec![0.0f32; 32768 * 5];
        for s in &mut samples[0..64] {
            *s = 1.0;
        }
        assert!(TempoDetector::new().detect(&samples, 32768).is_none());
    }

    #[test]
    fn empty_input_is_inconclusive() {
        assert!(TempoDetector::new().detect(&[], 44100).is_none());
    }

    #[test]
    fn forced_high_threshold_finds_no_peaks() {
        let samples = click_track(32768, 0.5, 10.0);
        let detector = TempoDetector::with_options(TempoOptions {
            threshold_floor: 2.0,
            ..TempoOptions::default()
        });
        assert!(detector.detect(&samples, 32768).is_none());
    }

    #[test]
    fn refractory_period_suppresses_double_hits() {
        // Two clicks 0.1s apart, repeated every 0.5s: the trailing click of
        // each pair falls inside the 200ms refractory window and must not
        // halve the estimate.
        let sample_rate = 32768u32;
        let len = sample_rate as usize * 30;
        let mut samples = vec![0.0f32; len];
        let step = sample_rate as usize / 2;
        let echo = sample_rate as usize / 10;
        let mut i = 0;
        while i < len {
            for j in i..(i + 32).min(len) {
                samples[j] = 1.0;
            }
            let e = i + echo;
            for j in e..(e + 32).min(len) {
                samples[j] = 1.0;
            }
            i += step;
        }
        let result = TempoDetector::new().detect(&samples, sample_rate).unwrap();
        assert!((115..=125).contains(&result.bpm), "got {} bpm", result.bpm);
    }
}
