// src/bpm/adapter.rs

use anyhow::{Context, Result};

use crate::bpm::TempoDetector;
use crate::decoder;

/// One-shot tempo estimate for a file on disk.
///
/// `Ok(None)` means the estimator was inconclusive; the caller keeps a null
/// BPM that the user may fill in manually.
pub fn analyze_bpm_for_file(path: &str) -> Result<Option<u32>> {
    let audio = decoder::decode_file(path).with_context(|| format!("decoding {path}"))?;
    let detector = TempoDetector::new();
    Ok(detector
        .detect(&audio.channel_data, audio.sample_rate)
        .map(|r| r.bpm))
}
