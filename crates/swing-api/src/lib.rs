//! Realtime golf swing detection server.
//!
//! This crate provides:
//! - A WebSocket endpoint that buffers client frames per session
//! - Background vision analysis with post-detection cooldown
//! - Session inspection, health and Prometheus endpoints

pub mod config;
pub mod detection;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod ws;

pub use config::{ApiConfig, DetectionConfig};
pub use detection::{FrameIngestor, SessionManager, SwingSession};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
