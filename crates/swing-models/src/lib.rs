//! Shared data models for the SwingCoach backend.
//!
//! This crate provides Serde-serializable types for:
//! - Timestamped frames and the client frame message
//! - Vision model analysis results
//! - Session state summaries
//! - WebSocket status message schemas

pub mod analysis;
pub mod frame;
pub mod session;
pub mod ws;

// Re-export common types
pub use analysis::SwingAnalysis;
pub use frame::{Frame, FrameMessage, ProtocolError, MISSING_FIELDS_ERROR};
pub use session::{SessionId, SessionState, SessionSummary};
pub use ws::{ServerMessage, WsStatus};
