//! Vision client trait and configuration.

use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use swing_models::SwingAnalysis;
use tracing::warn;

use crate::error::{VisionError, VisionResult};
use crate::gemini::GeminiVisionClient;
use crate::image::EncodedImage;
use crate::openai::OpenAiVisionClient;

/// A cloud vision model that judges whether a frame sequence shows a swing.
#[async_trait]
pub trait VisionClient: Send + Sync {
    /// Provider name for logs and readiness output.
    fn provider(&self) -> &'static str;

    /// Submit the ordered images with the prompt and parse the verdict.
    async fn analyze_images(&self, images: &[EncodedImage], prompt: &str) -> VisionResult<SwingAnalysis>;

    /// Check whether the provider is reachable with the configured credentials.
    async fn health_check(&self) -> VisionResult<bool> {
        Ok(true)
    }
}

/// Supported vision providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisionProvider {
    #[default]
    Gemini,
    OpenAi,
}

impl VisionProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisionProvider::Gemini => "gemini",
            VisionProvider::OpenAi => "openai",
        }
    }
}

impl FromStr for VisionProvider {
    type Err = VisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(VisionProvider::Gemini),
            "openai" | "gpt" => Ok(VisionProvider::OpenAi),
            other => Err(VisionError::config(format!("unknown vision provider: {}", other))),
        }
    }
}

/// Configuration for the vision clients.
#[derive(Debug, Clone)]
pub struct VisionClientConfig {
    /// Which provider to build
    pub provider: VisionProvider,
    /// Gemini API key
    pub gemini_api_key: Option<String>,
    /// Gemini API base URL
    pub gemini_base_url: String,
    /// Gemini models, tried in order
    pub gemini_models: Vec<String>,
    /// OpenAI API key
    pub openai_api_key: Option<String>,
    /// OpenAI API base URL
    pub openai_base_url: String,
    /// OpenAI model
    pub openai_model: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retries per model for retryable failures
    pub max_retries: u32,
}

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

fn default_gemini_models() -> Vec<String> {
    vec!["gemini-2.5-flash".to_string(), "gemini-2.5-flash-lite".to_string()]
}

impl Default for VisionClientConfig {
    fn default() -> Self {
        Self {
            provider: VisionProvider::Gemini,
            gemini_api_key: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            gemini_models: default_gemini_models(),
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 1,
        }
    }
}

impl VisionClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> VisionResult<Self> {
        let defaults = Self::default();
        let provider = match std::env::var("VISION_PROVIDER") {
            Ok(s) => s.parse()?,
            Err(_) => defaults.provider,
        };

        Ok(Self {
            provider,
            gemini_api_key: non_empty_env("GEMINI_API_KEY"),
            gemini_base_url: non_empty_env("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            gemini_models: non_empty_env("GEMINI_MODELS")
                .map(|s| {
                    s.split(',')
                        .map(|m| m.trim().to_string())
                        .filter(|m| !m.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.gemini_models),
            openai_api_key: non_empty_env("OPENAI_API_KEY"),
            openai_base_url: non_empty_env("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            openai_model: non_empty_env("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            timeout: Duration::from_secs(
                std::env::var("VISION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            max_retries: std::env::var("VISION_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
        })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Build the client for the configured provider.
pub fn build_client(config: &VisionClientConfig) -> VisionResult<Arc<dyn VisionClient>> {
    match config.provider {
        VisionProvider::Gemini => Ok(Arc::new(GeminiVisionClient::new(config.clone())?)),
        VisionProvider::OpenAi => Ok(Arc::new(OpenAiVisionClient::new(config.clone())?)),
    }
}

/// Build the shared HTTP client used by both providers.
pub(crate) fn http_client(config: &VisionClientConfig) -> VisionResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(VisionError::Network)
}

const BASE_BACKOFF_MS: u64 = 500;
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Delay before retry number `attempt + 1`, doubling up to [`MAX_BACKOFF`].
fn backoff_delay(attempt: u32) -> Duration {
    let factor = 2u64.saturating_pow(attempt.min(16));
    Duration::from_millis(BASE_BACKOFF_MS.saturating_mul(factor)).min(MAX_BACKOFF)
}

/// Execute with retry logic and exponential backoff.
pub(crate) async fn with_retry<F, Fut, T>(max_retries: u32, operation: F) -> VisionResult<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = VisionResult<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt < max_retries => {
                let delay = backoff_delay(attempt);
                warn!(
                    "Vision request failed (attempt {}), retrying in {:?}: {}",
                    attempt + 1,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
