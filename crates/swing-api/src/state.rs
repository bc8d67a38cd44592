//! Application state.

use std::sync::Arc;

use swing_vision::{build_client, VisionClient, VisionClientConfig, VisionError};

use crate::config::{ApiConfig, DetectionConfig};
use crate::detection::{FrameIngestor, SessionManager};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub detection: Arc<DetectionConfig>,
    pub sessions: Arc<SessionManager>,
    pub ingestor: Arc<FrameIngestor>,
    pub vision: Arc<dyn VisionClient>,
}

impl AppState {
    pub fn new(config: ApiConfig, detection: DetectionConfig, vision: Arc<dyn VisionClient>) -> Self {
        let ingestor = FrameIngestor::new(&detection, Arc::clone(&vision));
        Self {
            config,
            detection: Arc::new(detection),
            sessions: Arc::new(SessionManager::new()),
            ingestor: Arc::new(ingestor),
            vision,
        }
    }

    /// Build state with the vision provider and detection tunables from the environment.
    pub fn from_env(config: ApiConfig) -> Result<Self, VisionError> {
        let vision = build_client(&VisionClientConfig::from_env()?)?;
        Ok(Self::new(config, DetectionConfig::from_env(), vision))
    }
}
