//! Session identifiers and state summaries.

use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identifier of one live detection session.
///
/// Built from the connection accept time and a per-process sequence
/// number, so ids never repeat within a process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(accepted_at: DateTime<Utc>, sequence: u64) -> Self {
        Self(format!("swing-{}-{}", accepted_at.timestamp_millis(), sequence))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Detection state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Accumulating frames, no analysis running
    Idle,
    /// A background analysis is in flight or awaiting collection
    Analyzing,
    /// Post-detection quiet period
    Cooldown,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Analyzing => "analyzing",
            SessionState::Cooldown => "cooldown",
        }
    }
}

/// Point-in-time view of a session for the stats endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub connected_at: DateTime<Utc>,
    pub state: SessionState,
    pub buffer_size: usize,
    pub context_window: f64,
    pub frames_received: u64,
    pub analyses_run: u64,
    pub total_swings: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_until: Option<f64>,
}
