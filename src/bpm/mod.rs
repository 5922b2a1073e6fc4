// src/bpm/mod.rs

pub mod detector;
pub mod utils;
pub mod adapter;

pub use adapter::analyze_bpm_for_file;
pub use detector::{TempoDetector, TempoOptions, TempoResult};
