//! Per-connection detection session state.

use std::time::Duration;

use chrono::{DateTime, Utc};
use swing_models::{Frame, SessionId, SessionState, SessionSummary};

use super::analyzer::AnalysisTask;
use super::buffer::FrameBuffer;

/// Mutable state of one live swing detection stream.
///
/// Only the connection's ingestion loop mutates a session. The buffer is
/// cleared once per confirmed swing and otherwise keeps growing, so an
/// analysis never loses frames it might need.
#[derive(Debug)]
pub struct SwingSession {
    id: SessionId,
    connected_at: DateTime<Utc>,
    buffer: FrameBuffer,
    /// Frame-clock time before which frames are acknowledged but not analyzed
    cooldown_until: Option<f64>,
    swings_detected: u32,
    /// In-flight or finished-but-uncollected analysis
    analysis: Option<AnalysisTask>,
    frames_received: u64,
    analyses_run: u64,
}

impl SwingSession {
    pub fn new(id: SessionId, connected_at: DateTime<Utc>) -> Self {
        Self {
            id,
            connected_at,
            buffer: FrameBuffer::new(),
            cooldown_until: None,
            swings_detected: 0,
            analysis: None,
            frames_received: 0,
            analyses_run: 0,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Sorted insert into the frame buffer.
    pub fn add_image(&mut self, frame: Frame) {
        self.buffer.insert(frame);
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn first_timestamp(&self) -> Option<f64> {
        self.buffer.first_timestamp()
    }

    pub fn last_timestamp(&self) -> Option<f64> {
        self.buffer.last_timestamp()
    }

    /// Seconds of context currently buffered.
    pub fn context_window(&self) -> f64 {
        self.buffer.span()
    }

    pub fn cooldown_until(&self) -> Option<f64> {
        self.cooldown_until
    }

    pub fn swings_detected(&self) -> u32 {
        self.swings_detected
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    /// True while a background analysis is running.
    pub fn is_analyzing(&self) -> bool {
        self.analysis.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// True when an analysis has finished but its result is not collected yet.
    pub fn analysis_ready(&self) -> bool {
        self.analysis.as_ref().is_some_and(AnalysisTask::is_finished)
    }

    /// Wall-clock time since the current analysis started.
    pub fn analysis_elapsed(&self) -> Option<Duration> {
        self.analysis.as_ref().map(AnalysisTask::elapsed)
    }

    pub fn state(&self) -> SessionState {
        if self.cooldown_until.is_some() {
            SessionState::Cooldown
        } else if self.analysis.is_some() {
            SessionState::Analyzing
        } else {
            SessionState::Idle
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            connected_at: self.connected_at,
            state: self.state(),
            buffer_size: self.buffer.len(),
            context_window: self.buffer.span(),
            frames_received: self.frames_received,
            analyses_run: self.analyses_run,
            total_swings: self.swings_detected,
            cooldown_until: self.cooldown_until,
        }
    }

    pub(crate) fn record_frame_received(&mut self) {
        self.frames_received += 1;
    }

    /// Seconds of cooldown left at `timestamp`, if still inside the window.
    ///
    /// Cooldown expiry is only noticed here: the first frame at or past the
    /// deadline clears it.
    pub(crate) fn cooldown_remaining(&mut self, timestamp: f64) -> Option<f64> {
        match self.cooldown_until {
            Some(until) if timestamp < until => Some(until - timestamp),
            Some(_) => {
                self.cooldown_until = None;
                None
            }
            None => None,
        }
    }

    pub(crate) fn start_analysis(&mut self, task: AnalysisTask) {
        debug_assert!(self.analysis.is_none(), "analysis already in flight");
        self.analysis = Some(task);
        self.analyses_run += 1;
    }

    /// Detach the analysis task if it has finished.
    pub(crate) fn take_finished_analysis(&mut self) -> Option<AnalysisTask> {
        if self.analysis_ready() {
            self.analysis.take()
        } else {
            None
        }
    }

    /// Count a confirmed swing, empty the buffer and start the cooldown.
    ///
    /// Returns the new swing total.
    pub(crate) fn record_detection(&mut self, detection_timestamp: f64, cooldown_seconds: f64) -> u32 {
        self.swings_detected += 1;
        self.buffer.clear();
        self.cooldown_until = Some(detection_timestamp + cooldown_seconds);
        self.swings_detected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SwingSession {
        SwingSession::new(SessionId::from("swing-test-1"), Utc::now())
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = session();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.is_analyzing());
        assert_eq!(session.first_timestamp(), None);
        assert_eq!(session.last_timestamp(), None);
        assert_eq!(session.swings_detected(), 0);
    }

    #[test]
    fn test_detection_clears_buffer_and_arms_cooldown() {
        let mut session = session();
        session.add_image(Frame::new(0.0, "a"));
        session.add_image(Frame::new(1.3, "b"));

        let total = session.record_detection(1.3, 2.0);

        assert_eq!(total, 1);
        assert_eq!(session.buffer_len(), 0);
        assert_eq!(session.first_timestamp(), None);
        assert_eq!(session.last_timestamp(), None);
        assert!((session.cooldown_until().unwrap() - 3.3).abs() < 1e-9);
        assert_eq!(session.state(), SessionState::Cooldown);
    }

    #[test]
    fn test_cooldown_expires_lazily() {
        let mut session = session();
        session.record_detection(1.0, 2.0);

        assert_eq!(session.cooldown_remaining(2.0), Some(1.0));
        assert_eq!(session.state(), SessionState::Cooldown);

        assert_eq!(session.cooldown_remaining(3.0), None);
        assert_eq!(session.cooldown_until(), None);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_summary() {
        let mut session = session();
        session.record_frame_received();
        session.add_image(Frame::new(0.25, "a"));
        let summary = session.summary();
        assert_eq!(summary.buffer_size, 1);
        assert_eq!(summary.frames_received, 1);
        assert_eq!(summary.total_swings, 0);
        assert!(summary.cooldown_until.is_none());
    }
}
