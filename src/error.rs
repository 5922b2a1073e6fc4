// src/error.rs

use thiserror::Error;

/// Failures while turning a byte stream into PCM samples.
///
/// Every variant is recoverable at the intake layer: the caller falls back to
/// the placeholder envelope and a null BPM instead of surfacing a fault.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to open audio source: {0}")]
    Io(#[from] std::io::Error),

    #[error("unrecognized or corrupt audio container: {0}")]
    Probe(#[source] symphonia::core::errors::Error),

    #[error("no decodable audio track in source")]
    NoAudioTrack,

    #[error("codec error: {0}")]
    Codec(#[source] symphonia::core::errors::Error),

    /// The container was valid but produced zero samples.
    #[error("decoded stream contained no samples")]
    EmptyStream,
}
