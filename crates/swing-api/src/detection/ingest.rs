//! Per-frame state machine: cooldown, buffering, dispatch and result collection.

use std::sync::Arc;

use swing_models::{Frame, FrameMessage, ServerMessage};
use swing_vision::VisionClient;
use tracing::{debug, info};

use super::analyzer::BackgroundAnalyzer;
use super::gate::SubmissionGate;
use super::session::SwingSession;
use crate::config::DetectionConfig;
use crate::metrics;

/// Turns each incoming frame message into exactly one status reply.
///
/// Never blocks on the vision provider: analyses run as background tasks
/// and their results are picked up by a later frame.
#[derive(Clone)]
pub struct FrameIngestor {
    gate: SubmissionGate,
    analyzer: BackgroundAnalyzer,
    cooldown_seconds: f64,
    confidence_threshold: f64,
}

impl FrameIngestor {
    pub fn new(config: &DetectionConfig, vision: Arc<dyn VisionClient>) -> Self {
        Self {
            gate: SubmissionGate::new(config.submission_threshold_seconds),
            analyzer: BackgroundAnalyzer::new(vision, config.analysis_prompt.as_str()),
            cooldown_seconds: config.post_detection_cooldown_seconds,
            confidence_threshold: config.confidence_threshold,
        }
    }

    pub fn vision(&self) -> &Arc<dyn VisionClient> {
        self.analyzer.vision()
    }

    /// Handle one raw text message.
    ///
    /// Malformed messages get an error reply and leave the session untouched.
    pub async fn handle_text(&self, session: &mut SwingSession, text: &str) -> ServerMessage {
        match FrameMessage::parse(text) {
            Ok(frame) => self.ingest(session, frame).await,
            Err(e) => {
                debug!(session_id = %session.id(), "Rejected frame message: {}", e);
                ServerMessage::error(e.to_string())
            }
        }
    }

    /// Advance the session by one frame.
    pub async fn ingest(&self, session: &mut SwingSession, frame: Frame) -> ServerMessage {
        let timestamp = frame.timestamp;
        session.record_frame_received();

        // Frames inside the quiet period are acknowledged and dropped
        if let Some(remaining) = session.cooldown_remaining(timestamp) {
            return ServerMessage::cooldown(remaining, session.swings_detected());
        }

        session.add_image(frame);

        if session.is_analyzing() {
            let elapsed = session
                .analysis_elapsed()
                .map(|d| d.as_secs_f64())
                .unwrap_or_default();
            return ServerMessage::analyzing(elapsed, session.context_window(), session.buffer_len());
        }

        if let Some(task) = session.take_finished_analysis() {
            let context_window = task.context_window();
            let context_size = task.context_size();
            let result = task.collect().await;

            if result.is_confirmed(self.confidence_threshold) {
                let detection_timestamp = session.last_timestamp().unwrap_or(timestamp);
                let total_swings = session.record_detection(detection_timestamp, self.cooldown_seconds);
                metrics::record_swing_detected(self.vision().provider());
                info!(
                    session_id = %session.id(),
                    timestamp = detection_timestamp,
                    confidence = result.confidence,
                    total_swings,
                    "Swing detected"
                );
                return ServerMessage::evaluated(
                    result.confidence,
                    detection_timestamp,
                    context_window,
                    context_size,
                    total_swings,
                );
            }

            debug!(
                session_id = %session.id(),
                confidence = result.confidence,
                error = result.error.as_deref().unwrap_or(""),
                "No swing in analyzed window"
            );
            return ServerMessage::awaiting_more_data(session.context_window(), session.buffer_len());
        }

        if self.gate.should_submit(session.buffer()) {
            let snapshot = session.buffer().snapshot();
            let task = self.analyzer.dispatch(session.id(), snapshot);
            session.start_analysis(task);
            debug!(
                session_id = %session.id(),
                frames = session.buffer_len(),
                window = session.context_window(),
                "Analysis dispatched"
            );
            return ServerMessage::analyzing(0.0, session.context_window(), session.buffer_len());
        }

        ServerMessage::awaiting_more_data(session.context_window(), session.buffer_len())
    }
}
