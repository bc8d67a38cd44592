//! API configuration.

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second
    pub rate_limit_rps: u32,
    /// Max request body size
    pub max_body_size: usize,
    /// Max WebSocket message size (one encoded frame)
    pub ws_max_message_size: usize,
    /// Whether the Prometheus endpoint is served
    pub metrics_enabled: bool,
    /// Environment (development/production)
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            max_body_size: 10 * 1024 * 1024,       // 10MB
            ws_max_message_size: 16 * 1024 * 1024, // 16MB
            metrics_enabled: true,
            environment: "development".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: env_parse("RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            ws_max_message_size: env_parse("WS_MAX_MESSAGE_SIZE").unwrap_or(defaults.ws_max_message_size),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

/// Default instruction sent to the vision model with every frame sequence.
pub const DEFAULT_ANALYSIS_PROMPT: &str = r#"You are a golf swing detector. The images are consecutive frames from a live camera, ordered by capture time.

Decide whether these frames contain one COMPLETE golf swing: address, backswing, downswing, impact and follow-through. Practice waggles, partial swings, walking or standing still are NOT swings.

Return ONLY a single JSON object with this schema:
{
  "swing_detected": true,
  "confidence": 0.0,
  "reason": "One short sentence"
}

confidence is a number between 0.0 and 1.0."#;

/// Tunables for the realtime swing detection state machine.
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// Seconds of buffered context required before submitting to the model
    pub submission_threshold_seconds: f64,
    /// Seconds after a detection during which frames are not analyzed
    pub post_detection_cooldown_seconds: f64,
    /// Minimum model confidence for a detection to count
    pub confidence_threshold: f64,
    /// Instruction sent with every analysis
    pub analysis_prompt: String,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            submission_threshold_seconds: 1.5,
            post_detection_cooldown_seconds: 2.0,
            confidence_threshold: 0.5,
            analysis_prompt: DEFAULT_ANALYSIS_PROMPT.to_string(),
        }
    }
}

impl DetectionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            submission_threshold_seconds: env_parse("SWING_SUBMISSION_THRESHOLD_SECONDS")
                .filter(|v: &f64| v.is_finite() && *v >= 0.0)
                .unwrap_or(defaults.submission_threshold_seconds),
            post_detection_cooldown_seconds: env_parse("SWING_COOLDOWN_SECONDS")
                .filter(|v: &f64| v.is_finite() && *v >= 0.0)
                .unwrap_or(defaults.post_detection_cooldown_seconds),
            confidence_threshold: env_parse("SWING_CONFIDENCE_THRESHOLD")
                .filter(|v: &f64| (0.0..=1.0).contains(v))
                .unwrap_or(defaults.confidence_threshold),
            analysis_prompt: std::env::var("SWING_ANALYSIS_PROMPT")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(defaults.analysis_prompt),
        }
    }

    /// Builder-style override of the submission threshold.
    pub fn with_submission_threshold(mut self, seconds: f64) -> Self {
        self.submission_threshold_seconds = seconds;
        self
    }

    /// Builder-style override of the cooldown.
    pub fn with_cooldown(mut self, seconds: f64) -> Self {
        self.post_detection_cooldown_seconds = seconds;
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_defaults() {
        let config = DetectionConfig::default();
        assert_eq!(config.submission_threshold_seconds, 1.5);
        assert_eq!(config.post_detection_cooldown_seconds, 2.0);
        assert_eq!(config.confidence_threshold, 0.5);
        assert!(config.analysis_prompt.contains("swing_detected"));
    }

    #[test]
    fn test_builder_overrides() {
        let config = DetectionConfig::default()
            .with_submission_threshold(1.25)
            .with_cooldown(3.0);
        assert_eq!(config.submission_threshold_seconds, 1.25);
        assert_eq!(config.post_detection_cooldown_seconds, 3.0);
    }

    #[test]
    fn test_api_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 8000);
        assert!(!config.is_production());
    }
}
