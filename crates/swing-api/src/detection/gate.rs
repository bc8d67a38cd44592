//! Submission gate: is there enough temporal context to call the model?

use super::buffer::FrameBuffer;

/// Time-span heuristic deciding when a buffer is worth analyzing.
///
/// Frame arrival rate is not constant, so the gate measures seconds of
/// context rather than frame counts.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionGate {
    threshold_seconds: f64,
}

impl SubmissionGate {
    pub fn new(threshold_seconds: f64) -> Self {
        Self { threshold_seconds }
    }

    pub fn threshold_seconds(&self) -> f64 {
        self.threshold_seconds
    }

    /// True iff at least two frames span `threshold_seconds` or more.
    pub fn should_submit(&self, buffer: &FrameBuffer) -> bool {
        if buffer.len() < 2 {
            return false;
        }
        buffer.span() >= self.threshold_seconds
    }
}
