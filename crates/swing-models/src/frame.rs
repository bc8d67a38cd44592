//! Captured frames and the client frame message.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error text returned to clients that omit a required frame field.
pub const MISSING_FIELDS_ERROR: &str = "Missing timestamp or image_base64";

/// A single captured frame held in a session buffer.
///
/// The image stays in its wire encoding (base64 text) until a background
/// analysis decodes it. Cloning is cheap, so buffer snapshots share the
/// underlying image text.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Capture time in seconds, on the client's clock.
    pub timestamp: f64,
    /// Base64-encoded image bytes, optionally with a `data:` URL prefix.
    pub image: Arc<str>,
}

impl Frame {
    pub fn new(timestamp: f64, image: impl Into<Arc<str>>) -> Self {
        Self {
            timestamp,
            image: image.into(),
        }
    }
}

/// Frame message sent by the client, one per captured frame.
///
/// Both fields are optional at the serde level so that a missing field is
/// reported with [`MISSING_FIELDS_ERROR`] instead of a generic parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FrameMessage {
    /// Capture time in seconds
    #[serde(default)]
    pub timestamp: Option<f64>,

    /// Base64-encoded image
    #[serde(default)]
    pub image_base64: Option<String>,
}

/// Malformed or incomplete client messages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolError {
    #[error("Missing timestamp or image_base64")]
    MissingFields,

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(f64),

    #[error("Invalid message: {0}")]
    InvalidJson(String),

    #[error("Unsupported message type: expected JSON text")]
    UnsupportedMessage,
}

impl FrameMessage {
    /// Parse a raw text message into a frame.
    pub fn parse(text: &str) -> Result<Frame, ProtocolError> {
        let message: FrameMessage = serde_json::from_str(text)
            .map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;
        message.into_frame()
    }

    /// Validate the message and convert it into a buffered frame.
    pub fn into_frame(self) -> Result<Frame, ProtocolError> {
        let (timestamp, image) = match (self.timestamp, self.image_base64) {
            (Some(ts), Some(image)) if !image.is_empty() => (ts, image),
            _ => return Err(ProtocolError::MissingFields),
        };

        // NaN or infinite timestamps would break buffer ordering
        if !timestamp.is_finite() {
            return Err(ProtocolError::InvalidTimestamp(timestamp));
        }

        Ok(Frame::new(timestamp, image))
    }
}
