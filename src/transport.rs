// src/transport.rs

/// Playback position as seen by the renderer. Supplied externally by the
/// playback collaborator; a transient overshoot past `duration` at
/// end-of-track is tolerated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackCursor {
    pub current_time: f64,
    pub duration: f64,
}

impl PlaybackCursor {
    pub fn new(current_time: f64, duration: f64) -> Self {
        Self {
            current_time,
            duration,
        }
    }

    /// Fraction of the track already played, clamped to [0, 1]. A zero
    /// duration maps to 0 rather than dividing by zero.
    pub fn progress_ratio(&self) -> f64 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        (self.current_time / self.duration).clamp(0.0, 1.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportState {
    Paused,
    Playing,
}

/// Outcome of a scrub click, for the host to forward to the playback
/// collaborator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClickOutcome {
    pub seek_to: f64,
    /// True when the click also resumed playback (click-to-play-from-position).
    pub resumed: bool,
}

/// The two-state playback machine the scrubber perceives.
///
/// Actual audio output is owned by an external playback engine; this only
/// decides what to draw and what seek time to request.
#[derive(Clone, Debug)]
pub struct Transport {
    state: TransportState,
    cursor: PlaybackCursor,
}

impl Transport {
    pub fn new(duration: f64) -> Self {
        Self {
            state: TransportState::Paused,
            cursor: PlaybackCursor::new(0.0, duration),
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    pub fn cursor(&self) -> PlaybackCursor {
        self.cursor
    }

    pub fn play(&mut self) {
        self.state = TransportState::Playing;
    }

    pub fn pause(&mut self) {
        self.state = TransportState::Paused;
    }

    pub fn toggle(&mut self) {
        self.state = match self.state {
            TransportState::Paused => TransportState::Playing,
            TransportState::Playing => TransportState::Paused,
        };
    }

    pub fn seek(&mut self, time: f64) {
        self.cursor.current_time = time.clamp(0.0, self.cursor.duration);
    }

    /// Advance the perceived position. Returns true when the track just
    /// ended: the transport auto-pauses and the position resets to 0.
    pub fn set_position(&mut self, time: f64) -> bool {
        if self.state == TransportState::Playing
            && self.cursor.duration > 0.0
            && time >= self.cursor.duration
        {
            self.state = TransportState::Paused;
            self.cursor.current_time = 0.0;
            return true;
        }
        self.cursor.current_time = time.max(0.0);
        false
    }

    /// Apply a scrub click that has already been mapped to a seek time.
    /// While paused the click resumes playback as well; while playing it
    /// only seeks.
    pub fn click(&mut self, seek_to: f64) -> ClickOutcome {
        let resumed = self.state == TransportState::Paused;
        if resumed {
            self.state = TransportState::Playing;
        }
        self.seek(seek_to);
        ClickOutcome {
            seek_to: self.cursor.current_time,
            resumed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_zero_for_zero_duration() {
        let cursor = PlaybackCursor::new(5.0, 0.0);
        assert_eq!(cursor.progress_ratio(), 0.0);
    }

    #[test]
    fn progress_clamps_overshoot() {
        let cursor = PlaybackCursor::new(181.0, 180.0);
        assert_eq!(cursor.progress_ratio(), 1.0);
    }

    #[test]
    fn toggle_flips_state() {
        let mut t = Transport::new(180.0);
        assert_eq!(t.state(), TransportState::Paused);
        t.toggle();
        assert_eq!(t.state(), TransportState::Playing);
        t.toggle();
        assert_eq!(t.state(), TransportState::Paused);
    }

    #[test]
    fn end_of_track_pauses_and_resets() {
        let mut t = Transport::new(180.0);
        t.play();
        assert!(!t.set_position(90.0));
        let ended = t.set_position(180.0);
        assert!(ended);
        assert_eq!(t.state(), TransportState::Paused);
        assert_eq!(t.cursor().current_time, 0.0);
    }

    #[test]
    fn click_while_paused_resumes_and_seeks() {
        let mut t = Transport::new(180.0);
        let outcome = t.click(90.0);
        assert!(outcome.resumed);
        assert_eq!(outcome.seek_to, 90.0);
        assert!(t.is_playing());
    }

    #[test]
    fn click_while_playing_only_seeks() {
        let mut t = Transport::new(180.0);
        t.play();
        let outcome = t.click(30.0);
        assert!(!outcome.resumed);
        assert!(t.is_playing());
        assert_eq!(t.cursor().current_time, 30.0);
    }

    #[test]
    fn seek_clamps_to_track_bounds() {
        let mut t = Transport::new(60.0);
        t.seek(-5.0);
        assert_eq!(t.cursor().current_time, 0.0);
        t.seek(600.0);
        assert_eq!(t.cursor().current_time, 60.0);
    }
}
