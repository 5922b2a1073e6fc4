// src/bpm/utils.rs

/// Root-mean-square amplitude over the whole buffer.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut acc = 0.0f64;
    for &s in samples {
        acc += (s as f64) * (s as f64);
    }
    ((acc / samples.len() as f64) as f32).sqrt()
}

/// Largest absolute sample in a block.
pub fn peak_abs(block: &[f32]) -> f32 {
    block.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

/// Mean of a sorted slice after dropping `trim_fraction` of the entries from
/// each end. Returns `None` when nothing survives the trim.
pub fn trimmed_mean(sorted: &[f32], trim_fraction: f32) -> Option<f32> {
    if sorted.is_empty() {
        return None;
    }
    let trim = (sorted.len() as f32 * trim_fraction).floor() as usize;
    let kept = &sorted[trim..sorted.len() - trim];
    if kept.is_empty() {
        return None;
    }
    Some(kept.iter().sum::<f32>() / kept.len() as f32)
}
