//! Background analyzer: runs the vision call off the ingestion loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use swing_models::{Frame, SessionId, SwingAnalysis};
use swing_vision::{EncodedImage, VisionClient};
use tokio::task::JoinHandle;
use tracing::{debug, info_span, warn, Instrument};

use crate::metrics;

/// Dispatches analyses of buffer snapshots as detached tokio tasks.
#[derive(Clone)]
pub struct BackgroundAnalyzer {
    vision: Arc<dyn VisionClient>,
    prompt: Arc<str>,
}

impl BackgroundAnalyzer {
    pub fn new(vision: Arc<dyn VisionClient>, prompt: impl Into<Arc<str>>) -> Self {
        Self {
            vision,
            prompt: prompt.into(),
        }
    }

    pub fn vision(&self) -> &Arc<dyn VisionClient> {
        &self.vision
    }

    /// Start analyzing `snapshot` in the background.
    ///
    /// The returned task owns its snapshot. Dropping it detaches the work
    /// rather than cancelling it.
    pub fn dispatch(&self, session_id: &SessionId, snapshot: Vec<Frame>) -> AnalysisTask {
        let context_size = snapshot.len();
        let context_window = match (snapshot.first(), snapshot.last()) {
            (Some(first), Some(last)) => last.timestamp - first.timestamp,
            _ => 0.0,
        };

        let vision = Arc::clone(&self.vision);
        let prompt = Arc::clone(&self.prompt);
        let span = info_span!("swing_analysis", session_id = %session_id, frames = context_size);

        metrics::record_analysis_dispatched(vision.provider());

        let handle = tokio::spawn(
            async move {
                let started = Instant::now();
                let result = analyze_snapshot(vision.as_ref(), &snapshot, &prompt).await;
                let elapsed = started.elapsed();

                metrics::record_analysis_completed(vision.provider(), result.outcome(), elapsed.as_secs_f64());
                debug!(
                    outcome = result.outcome(),
                    confidence = result.confidence,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Analysis finished"
                );
                result
            }
            .instrument(span),
        );

        AnalysisTask {
            handle,
            started_at: Instant::now(),
            context_size,
            context_window,
        }
    }
}

/// Decode every frame in order and ask the model about the whole sequence.
///
/// Never fails: decode errors, provider errors and malformed answers all
/// come back as a negative result carrying `error`.
pub async fn analyze_snapshot(vision: &dyn VisionClient, frames: &[Frame], prompt: &str) -> SwingAnalysis {
    if frames.is_empty() {
        return SwingAnalysis::failed("No frames to analyze");
    }

    let mut images = Vec::with_capacity(frames.len());
    for frame in frames {
        match EncodedImage::from_base64(&frame.image) {
            Ok(image) => images.push(image),
            Err(e) => {
                warn!(timestamp = frame.timestamp, "Frame decode failed: {}", e);
                return SwingAnalysis::failed(format!(
                    "Failed to decode frame at t={:.3}: {}",
                    frame.timestamp, e
                ));
            }
        }
    }

    match vision.analyze_images(&images, prompt).await {
        Ok(result) => result.normalized(),
        Err(e) => {
            warn!(provider = vision.provider(), "Vision analysis failed: {}", e);
            SwingAnalysis::failed(e.to_string())
        }
    }
}

/// Handle to one in-flight (or finished, not yet collected) analysis.
#[derive(Debug)]
pub struct AnalysisTask {
    handle: JoinHandle<SwingAnalysis>,
    started_at: Instant,
    context_size: usize,
    context_window: f64,
}

impl AnalysisTask {
    /// Non-blocking completion check.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wall-clock time since dispatch.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Number of frames in the analyzed snapshot.
    pub fn context_size(&self) -> usize {
        self.context_size
    }

    /// Span in seconds of the analyzed snapshot.
    pub fn context_window(&self) -> f64 {
        self.context_window
    }

    /// Take the task's result.
    ///
    /// Only call once [`AnalysisTask::is_finished`] is true, so the await
    /// resolves immediately. A panicked task yields a negative result.
    pub async fn collect(self) -> SwingAnalysis {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => {
                warn!("Analysis task failed to complete: {}", e);
                SwingAnalysis::failed(format!("Analysis task failed: {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::testing::{jpeg_base64, ScriptedVision};

    #[tokio::test]
    async fn test_decode_failure_is_negative() {
        let vision = ScriptedVision::always(SwingAnalysis::new(true, 0.99));
        let frames = vec![Frame::new(0.0, jpeg_base64()), Frame::new(0.5, "%%%corrupt%%%")];

        let result = analyze_snapshot(&vision, &frames, "prompt").await;

        assert!(!result.swing_detected);
        assert!(result.error.unwrap().contains("t=0.500"));
        assert_eq!(vision.calls(), 0);
    }

    #[tokio::test]
    async fn test_provider_error_is_negative() {
        let vision = ScriptedVision::failing("quota exhausted");
        let frames = vec![Frame::new(0.0, jpeg_base64()), Frame::new(1.0, jpeg_base64())];

        let result = analyze_snapshot(&vision, &frames, "prompt").await;

        assert!(!result.swing_detected);
        assert_eq!(result.confidence, 0.0);
        assert!(result.error.unwrap().contains("quota exhausted"));
    }

    #[tokio::test]
    async fn test_passes_all_frames_in_order() {
        let vision = ScriptedVision::always(SwingAnalysis::new(true, 0.8));
        let frames = vec![
            Frame::new(0.0, jpeg_base64()),
            Frame::new(0.4, jpeg_base64()),
            Frame::new(0.8, jpeg_base64()),
        ];

        let result = analyze_snapshot(&vision, &frames, "detect").await;

        assert!(result.swing_detected);
        assert_eq!(vision.last_batch_size(), Some(3));
        assert_eq!(vision.last_prompt().as_deref(), Some("detect"));
    }

    #[tokio::test]
    async fn test_dispatch_and_collect() {
        let vision = Arc::new(ScriptedVision::always(SwingAnalysis::new(false, 0.3)));
        let analyzer = BackgroundAnalyzer::new(vision, "prompt");
        let frames = vec![Frame::new(1.0, jpeg_base64()), Frame::new(2.5, jpeg_base64())];

        let task = analyzer.dispatch(&SessionId::from("test"), frames);
        assert_eq!(task.context_size(), 2);
        assert_eq!(task.context_window(), 1.5);

        while !task.is_finished() {
            tokio::task::yield_now().await;
        }
        let result = task.collect().await;
        assert!(!result.swing_detected);
        assert_eq!(result.confidence, 0.3);
    }
}
