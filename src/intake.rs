// src/intake.rs
//
// Upload-time analysis: decode once, derive the envelope and tempo, and
// hand `{durationSeconds, bpm}` to the catalog collaborator. Every failure
// path degrades to a usable fallback; nothing here ever blocks an upload.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::bpm::TempoDetector;
use crate::decoder::{self, DecodedAudio};
use crate::envelope::{Envelope, EnvelopeOptions};
use crate::error::DecodeError;

/// Track metadata attached to the uploaded record. The envelope itself is
/// not persisted; it is recomputed client-side whenever the track renders.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackAnalysis {
    pub duration_seconds: f64,
    pub bpm: Option<u32>,
}

/// Non-blocking notices surfaced inline in the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notice {
    DecodeFailed,
    EmptyAudio,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::DecodeFailed => "unable to load waveform",
            Notice::EmptyAudio => "audio appears to be silent",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct IntakeResult {
    pub analysis: TrackAnalysis,
    pub envelope: Envelope,
    pub notice: Option<Notice>,
}

impl IntakeResult {
    /// The state before any track is loaded: flat placeholder, no metadata,
    /// no notice. A valid outcome, not an error.
    pub fn no_source() -> Self {
        Self {
            analysis: TrackAnalysis {
                duration_seconds: 0.0,
                bpm: None,
            },
            envelope: Envelope::placeholder(&EnvelopeOptions::default()),
            notice: None,
        }
    }

    fn fallback(notice: Notice) -> Self {
        Self {
            notice: Some(notice),
            ..Self::no_source()
        }
    }
}

/// Derive envelope + tempo from already-decoded audio.
pub fn analyze_decoded(audio: &DecodedAudio) -> IntakeResult {
    let env_opts = EnvelopeOptions::default();
    let envelope = Envelope::from_samples(&audio.channel_data, &env_opts);
    let bpm = TempoDetector::new()
        .detect(&audio.channel_data, audio.sample_rate)
        .map(|r| r.bpm);
    let notice = if audio.is_silent() {
        Some(Notice::EmptyAudio)
    } else {
        None
    };

    IntakeResult {
        analysis: TrackAnalysis {
            duration_seconds: audio.duration_seconds,
            bpm,
        },
        envelope,
        notice,
    }
}

/// Synchronous core of the intake path. Decode failure is recovered locally:
/// placeholder envelope, null BPM, inline notice.
pub fn analyze_buffer_blocking(bytes: Vec<u8>) -> IntakeResult {
    match decoder::decode_bytes(bytes) {
        Ok(audio) => analyze_decoded(&audio),
        Err(DecodeError::EmptyStream) => IntakeResult::fallback(Notice::EmptyAudio),
        Err(e) => {
            log::warn!("audio analysis failed: {e}");
            IntakeResult::fallback(Notice::DecodeFailed)
        }
    }
}

/// Asynchronous intake of an uploaded byte buffer. Decoding is the suspend
/// point; callers must not assume synchronous availability of sample data.
pub async fn analyze_bytes(bytes: Vec<u8>) -> IntakeResult {
    match tokio::task::spawn_blocking(move || analyze_buffer_blocking(bytes)).await {
        Ok(result) => result,
        Err(e) => {
            log::warn!("analysis task failed: {e}");
            IntakeResult::fallback(Notice::DecodeFailed)
        }
    }
}

/// Asynchronous intake of a file on disk.
pub async fn analyze_file(path: String) -> IntakeResult {
    let loaded = tokio::task::spawn_blocking(move || match decoder::decode_file(&path) {
        Ok(audio) => analyze_decoded(&audio),
        Err(DecodeError::EmptyStream) => IntakeResult::fallback(Notice::EmptyAudio),
        Err(e) => {
            log::warn!("audio analysis failed for file: {e}");
            IntakeResult::fallback(Notice::DecodeFailed)
        }
    })
    .await;

    match loaded {
        Ok(result) => result,
        Err(e) => {
            log::warn!("analysis task failed: {e}");
            IntakeResult::fallback(Notice::DecodeFailed)
        }
    }
}

pub type RequestId = u64;

/// Stale-result discarding for overlapping analyses.
///
/// Each decode is tagged with a monotonically increasing id when it starts;
/// a completion is applied only if its tag still matches the latest issued
/// request. Supplying a new file while a previous decode is in flight
/// thereby cancels the old one once it resolves.
#[derive(Debug, Default)]
pub struct AnalysisSession {
    latest: AtomicU64,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag a new analysis. Any request issued earlier becomes stale.
    pub fn begin(&self) -> RequestId {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, id: RequestId) -> bool {
        self.latest.load(Ordering::SeqCst) == id
    }

    /// Accept a completion only if it is still the latest request;
    /// otherwise discard it.
    pub fn accept(&self, id: RequestId, result: IntakeResult) -> Option<IntakeResult> {
        if self.is_current(id) {
            Some(result)
        } else {
            log::debug!("discarding stale analysis result (request {id})");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_degrade_to_placeholder() {
        let result = analyze_buffer_blocking(vec![0xAB; 256]);
        assert_eq!(result.notice, Some(Notice::DecodeFailed));
        assert_eq!(result.analysis.bpm, None);
        assert_eq!(result.analysis.duration_seconds, 0.0);
        assert_eq!(
            result.envelope,
            Envelope::placeholder(&EnvelopeOptions::default())
        );
    }

    #[test]
    fn no_source_is_a_valid_outcome() {
        let result = IntakeResult::no_source();
        assert_eq!(result.notice, None);
        assert_eq!(result.envelope.len(), 200);
        assert!(result.envelope.points.iter().all(|&p| p == 0.1));
    }

    #[test]
    fn analysis_record_serializes_camel_case() {
        let analysis = TrackAnalysis {
            duration_seconds: 180.5,
            bpm: Some(120),
        };
        let json = serde_json::to_string(&analysis).unwrap();
        assert_eq!(json, r#"{"durationSeconds":180.5,"bpm":120}"#);
    }

    #[test]
    fn stale_completions_are_discarded() {
        let session = AnalysisSession::new();
        let first = session.begin();
        let second = session.begin();
        assert!(!session.is_current(first));
        assert!(session.is_current(second));

        let result = IntakeResult::no_source();
        assert!(session.accept(first, result.clone()).is_none());
        assert!(session.accept(second, result).is_some());
    }

    #[tokio::test]
    async fn async_intake_of_bad_bytes_never_fails() {
        let result = analyze_bytes(vec![0u8; 64]).await;
        assert_eq!(result.notice, Some(Notice::DecodeFailed));
        assert_eq!(result.analysis.bpm, None);
    }

    #[tokio::test]
    async fn async_intake_of_missing_file_degrades() {
        let result = analyze_file("/nonexistent/track.wav".to_string()).await;
        assert_eq!(result.notice, Some(Notice::DecodeFailed));
    }
}
