//! Gemini vision client.
//!
//! Sends the frame sequence as inline image parts to `generateContent`,
//! falling back through the configured models until one answers.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use swing_models::SwingAnalysis;
use tracing::{debug, info, warn};

use crate::client::{http_client, with_retry, VisionClient, VisionClientConfig};
use crate::error::{VisionError, VisionResult};
use crate::image::EncodedImage;
use crate::parse::parse_analysis;

/// Gemini API client.
pub struct GeminiVisionClient {
    api_key: String,
    client: Client,
    config: VisionClientConfig,
}

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    temperature: f32,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiVisionClient {
    /// Create a new Gemini client.
    pub fn new(config: VisionClientConfig) -> VisionResult<Self> {
        let api_key = config
            .gemini_api_key
            .clone()
            .ok_or_else(|| VisionError::config("GEMINI_API_KEY not set"))?;

        if config.gemini_models.is_empty() {
            return Err(VisionError::config("GEMINI_MODELS is empty"));
        }

        Ok(Self {
            api_key,
            client: http_client(&config)?,
            config,
        })
    }

    fn base_url(&self) -> &str {
        self.config.gemini_base_url.trim_end_matches('/')
    }

    fn build_request(images: &[EncodedImage], prompt: &str) -> GeminiRequest {
        let mut parts = Vec::with_capacity(images.len() + 1);
        parts.push(Part::Text {
            text: prompt.to_string(),
        });
        parts.extend(images.iter().map(|image| Part::InlineData {
            inline_data: InlineData {
                mime_type: image.mime_type.clone(),
                data: image.to_base64(),
            },
        }));

        GeminiRequest {
            contents: vec![Content { role: "user", parts }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                temperature: 0.0,
            },
        }
    }

    /// Call Gemini API.
    async fn call_gemini_api(&self, model: &str, request: &GeminiRequest) -> VisionResult<SwingAnalysis> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url(), model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VisionError::from_status(status, &error_text));
        }

        let gemini_response: GeminiResponse = response.json().await?;

        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.iter().find_map(|p| p.text.as_deref()))
            .ok_or_else(|| VisionError::invalid_response("No content in Gemini response"))?;

        debug!(model, "Gemini answered: {}", text);
        parse_analysis(text)
    }
}

#[async_trait]
impl VisionClient for GeminiVisionClient {
    fn provider(&self) -> &'static str {
        "gemini"
    }

    async fn analyze_images(&self, images: &[EncodedImage], prompt: &str) -> VisionResult<SwingAnalysis> {
        let request = Self::build_request(images, prompt);
        let mut last_error = None;

        for model in &self.config.gemini_models {
            debug!("Attempting Gemini API with model: {}", model);
            match with_retry(self.config.max_retries, || self.call_gemini_api(model, &request)).await {
                Ok(analysis) => {
                    info!(
                        model = %model,
                        frames = images.len(),
                        swing_detected = analysis.swing_detected,
                        confidence = analysis.confidence,
                        "Gemini analysis complete"
                    );
                    return Ok(analysis);
                }
                Err(e) => {
                    warn!("Failed with model {}: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| VisionError::invalid_response("All Gemini models failed")))
    }

    async fn health_check(&self) -> VisionResult<bool> {
        let model = &self.config.gemini_models[0];
        let url = format!("{}/v1beta/models/{}", self.base_url(), model);

        match self.client.get(&url).header("x-goog-api-key", &self.api_key).send().await {
            Ok(response) if response.status().is_success() => Ok(true),
            Ok(response) => {
                warn!("Gemini health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Gemini health check error: {}", e);
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let images = vec![EncodedImage::new("image/jpeg", vec![0xFF, 0xD8, 0xFF])];
        let request = GeminiVisionClient::build_request(&images, "Is there a swing?");
        let value = serde_json::to_value(&request).unwrap();

        let parts = &value["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "Is there a swing?");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[1]["inlineData"]["data"], "/9j/");
        assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn test_requires_models() {
        let config = VisionClientConfig {
            gemini_api_key: Some("key".to_string()),
            gemini_models: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(GeminiVisionClient::new(config), Err(VisionError::Config(_))));
    }
}
