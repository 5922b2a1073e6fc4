// src/lib.rs

pub mod error;
pub mod decoder;
pub mod envelope;
pub mod bpm;
pub mod render;
pub mod transport;
pub mod intake;
mod player;

pub use bpm::{analyze_bpm_for_file, TempoDetector, TempoOptions, TempoResult};
pub use decoder::DecodedAudio;
pub use envelope::{Envelope, EnvelopeOptions};
pub use error::DecodeError;
pub use intake::{AnalysisSession, IntakeResult, Notice, TrackAnalysis};
pub use player::PreviewPlayer;
pub use transport::{PlaybackCursor, Transport, TransportState};
