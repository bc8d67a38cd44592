//! Realtime swing detection pipeline.

pub mod analyzer;
pub mod buffer;
pub mod gate;
pub mod ingest;
pub mod manager;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use analyzer::{analyze_snapshot, AnalysisTask, BackgroundAnalyzer};
pub use buffer::FrameBuffer;
pub use gate::SubmissionGate;
pub use ingest::FrameIngestor;
pub use manager::{SessionManager, SharedSession};
pub use session::SwingSession;
