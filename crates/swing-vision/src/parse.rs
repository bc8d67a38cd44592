//! Parsing of model text into an analysis result.

use serde::Deserialize;
use swing_models::SwingAnalysis;

use crate::error::{VisionError, VisionResult};

/// Fields the model is instructed to return.
#[derive(Debug, Deserialize)]
struct ModelVerdict {
    swing_detected: bool,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    reason: Option<String>,
}

/// Parse the model's JSON answer, tolerating markdown code fences.
pub fn parse_analysis(text: &str) -> VisionResult<SwingAnalysis> {
    let json = strip_code_fence(text);

    let verdict: ModelVerdict = serde_json::from_str(json).map_err(|e| {
        VisionError::invalid_response(format!("failed to parse analysis JSON: {}", e))
    })?;

    let analysis = SwingAnalysis::new(verdict.swing_detected, verdict.confidence.unwrap_or(0.0));
    Ok(match verdict.reason {
        Some(reason) => analysis.with_reason(reason),
        None => analysis,
    })
}

fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json() {
        let result = parse_analysis(r#"{"swing_detected": true, "confidence": 0.82, "reason": "impact visible"}"#).unwrap();
        assert!(result.swing_detected);
        assert_eq!(result.confidence, 0.82);
        assert_eq!(result.reason.as_deref(), Some("impact visible"));
    }

    #[test]
    fn test_fenced_json() {
        let text = "```json\n{\"swing_detected\": false, \"confidence\": 0.1}\n```";
        let result = parse_analysis(text).unwrap();
        assert!(!result.swing_detected);
        assert!(result.reason.is_none());
    }

    #[test]
    fn test_missing_verdict_is_invalid() {
        assert!(matches!(
            parse_analysis(r#"{"confidence": 0.9}"#),
            Err(VisionError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_analysis("I think there is a swing"),
            Err(VisionError::InvalidResponse(msg)) if msg.contains("failed to parse analysis JSON")
        ));
    }
}
