//! WebSocket status messages.
//!
//! The server answers every client frame message with exactly one of these,
//! tagged by `status`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::session::SessionId;

/// Status values carried by server messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WsStatus {
    Connected,
    Cooldown,
    Analyzing,
    Evaluated,
    AwaitingMoreData,
    Error,
}

impl WsStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WsStatus::Connected => "connected",
            WsStatus::Cooldown => "cooldown",
            WsStatus::Analyzing => "analyzing",
            WsStatus::Evaluated => "evaluated",
            WsStatus::AwaitingMoreData => "awaiting_more_data",
            WsStatus::Error => "error",
        }
    }
}

/// Server to client message envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once after the connection is accepted
    Connected {
        session_id: SessionId,
        /// Seconds of context required before an analysis is submitted
        submission_threshold: f64,
        /// Seconds of quiet period after a detection
        cooldown_duration: f64,
    },

    /// Frame acknowledged during the post-detection quiet period
    Cooldown {
        cooldown_remaining: f64,
        total_swings: u32,
    },

    /// An analysis is running
    Analyzing {
        message: String,
        elapsed_time: f64,
        context_window: f64,
        buffer_size: usize,
    },

    /// A swing was confirmed
    Evaluated {
        swing_detected: bool,
        confidence: f64,
        /// Frame-clock time of the detection
        timestamp: f64,
        /// Span of the analyzed frames in seconds
        context_window: f64,
        /// Number of analyzed frames
        context_size: usize,
        total_swings: u32,
    },

    /// Not enough context yet
    AwaitingMoreData {
        context_window: f64,
        context_size: usize,
    },

    /// Protocol or server error; the connection stays open
    Error { error: String },
}

const ANALYZING_MESSAGE: &str = "Analyzing swing...";

impl ServerMessage {
    pub fn connected(session_id: SessionId, submission_threshold: f64, cooldown_duration: f64) -> Self {
        ServerMessage::Connected {
            session_id,
            submission_threshold,
            cooldown_duration,
        }
    }

    pub fn cooldown(cooldown_remaining: f64, total_swings: u32) -> Self {
        ServerMessage::Cooldown {
            cooldown_remaining: cooldown_remaining.max(0.0),
            total_swings,
        }
    }

    pub fn analyzing(elapsed_time: f64, context_window: f64, buffer_size: usize) -> Self {
        ServerMessage::Analyzing {
            message: ANALYZING_MESSAGE.to_string(),
            elapsed_time,
            context_window,
            buffer_size,
        }
    }

    pub fn evaluated(
        confidence: f64,
        timestamp: f64,
        context_window: f64,
        context_size: usize,
        total_swings: u32,
    ) -> Self {
        ServerMessage::Evaluated {
            swing_detected: true,
            confidence,
            timestamp,
            context_window,
            context_size,
            total_swings,
        }
    }

    pub fn awaiting_more_data(context_window: f64, context_size: usize) -> Self {
        ServerMessage::AwaitingMoreData {
            context_window,
            context_size,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        ServerMessage::Error { error: error.into() }
    }

    /// Get the message status.
    pub fn status(&self) -> WsStatus {
        match self {
            ServerMessage::Connected { .. } => WsStatus::Connected,
            ServerMessage::Cooldown { .. } => WsStatus::Cooldown,
            ServerMessage::Analyzing { .. } => WsStatus::Analyzing,
            ServerMessage::Evaluated { .. } => WsStatus::Evaluated,
            ServerMessage::AwaitingMoreData { .. } => WsStatus::AwaitingMoreData,
            ServerMessage::Error { .. } => WsStatus::Error,
        }
    }
}
