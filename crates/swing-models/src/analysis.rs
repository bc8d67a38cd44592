//! Vision model analysis results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Outcome of one swing analysis over a buffered frame sequence.
///
/// This is both the shape the vision model is asked to return and the
/// result handed back to the ingestion loop. Failed analyses are
/// represented as a negative result carrying `error`, never as an `Err`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SwingAnalysis {
    /// Whether a complete golf swing is visible in the sequence
    #[serde(default)]
    pub swing_detected: bool,

    /// Model confidence in the range 0.0 to 1.0
    #[serde(default)]
    pub confidence: f64,

    /// Short model explanation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Diagnostic message when the analysis failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SwingAnalysis {
    /// A successful analysis result.
    pub fn new(swing_detected: bool, confidence: f64) -> Self {
        Self {
            swing_detected,
            confidence: clamp_confidence(confidence),
            reason: None,
            error: None,
        }
    }

    /// Attach the model's explanation.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// A negative result standing in for a failed analysis.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            swing_detected: false,
            confidence: 0.0,
            reason: None,
            error: Some(error.into()),
        }
    }

    /// Whether the analysis failed.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Whether this result counts as a confirmed swing at the given threshold.
    pub fn is_confirmed(&self, confidence_threshold: f64) -> bool {
        self.swing_detected && self.error.is_none() && self.confidence >= confidence_threshold
    }

    /// Clamp the confidence into range, treating NaN as zero.
    pub fn normalized(mut self) -> Self {
        self.confidence = clamp_confidence(self.confidence);
        self
    }

    /// Outcome label used for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        if self.is_error() {
            "error"
        } else if self.swing_detected {
            "swing"
        } else {
            "no_swing"
        }
    }
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_is_negative() {
        let result = SwingAnalysis::failed("model timed out");
        assert!(!result.swing_detected);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.error.as_deref(), Some("model timed out"));
        assert!(!result.is_confirmed(0.0));
        assert_eq!(result.outcome(), "error");
    }

    #[test]
    fn test_confirmation_threshold() {
        let result = SwingAnalysis::new(true, 0.9);
        assert!(result.is_confirmed(0.5));
        assert!(result.is_confirmed(0.9));
        assert!(!result.is_confirmed(0.95));
        assert!(!SwingAnalysis::new(false, 0.99).is_confirmed(0.5));
    }

    #[test]
    fn test_deserialize_model_output() {
        let json = r#"{"swing_detected": true, "confidence": 1.7, "reason": "full backswing and follow-through"}"#;
        let result: SwingAnalysis = serde_json::from_str(json).unwrap();
        let result = result.normalized();
        assert!(result.swing_detected);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.reason.as_deref(), Some("full backswing and follow-through"));
        assert!(result.error.is_none());
    }
}
