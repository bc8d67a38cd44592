//! OpenAI vision client (chat completions with image inputs).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use swing_models::SwingAnalysis;
use tracing::{debug, info, warn};

use crate::client::{http_client, with_retry, VisionClient, VisionClientConfig};
use crate::error::{VisionError, VisionResult};
use crate::image::EncodedImage;
use crate::parse::parse_analysis;

/// Upper bound on answer length; the verdict is a small JSON object.
const MAX_COMPLETION_TOKENS: u32 = 300;

/// OpenAI API client.
pub struct OpenAiVisionClient {
    api_key: String,
    client: Client,
    config: VisionClientConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
    detail: &'static str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiVisionClient {
    /// Create a new OpenAI client.
    pub fn new(config: VisionClientConfig) -> VisionResult<Self> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or_else(|| VisionError::config("OPENAI_API_KEY not set"))?;

        Ok(Self {
            api_key,
            client: http_client(&config)?,
            config,
        })
    }

    fn base_url(&self) -> &str {
        self.config.openai_base_url.trim_end_matches('/')
    }

    fn build_request(&self, images: &[EncodedImage], prompt: &str) -> ChatRequest {
        let mut content = Vec::with_capacity(images.len() + 1);
        content.push(ContentPart::Text {
            text: prompt.to_string(),
        });
        content.extend(images.iter().map(|image| ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: image.to_data_url(),
                detail: "low",
            },
        }));

        ChatRequest {
            model: self.config.openai_model.clone(),
            messages: vec![ChatMessage { role: "user", content }],
            response_format: ResponseFormat { kind: "json_object" },
            max_tokens: MAX_COMPLETION_TOKENS,
            temperature: 0.0,
        }
    }

    async fn call_openai_api(&self, request: &ChatRequest) -> VisionResult<SwingAnalysis> {
        let url = format!("{}/v1/chat/completions", self.base_url());

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VisionError::from_status(status, &error_text));
        }

        let chat: ChatResponse = response.json().await?;
        let text = chat
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .ok_or_else(|| VisionError::invalid_response("No content in OpenAI response"))?;

        debug!(model = %request.model, "OpenAI answered: {}", text);
        parse_analysis(text)
    }
}

#[async_trait]
impl VisionClient for OpenAiVisionClient {
    fn provider(&self) -> &'static str {
        "openai"
    }

    async fn analyze_images(&self, images: &[EncodedImage], prompt: &str) -> VisionResult<SwingAnalysis> {
        let request = self.build_request(images, prompt);
        let analysis = with_retry(self.config.max_retries, || self.call_openai_api(&request)).await?;

        info!(
            model = %request.model,
            frames = images.len(),
            swing_detected = analysis.swing_detected,
            confidence = analysis.confidence,
            "OpenAI analysis complete"
        );
        Ok(analysis)
    }

    async fn health_check(&self) -> VisionResult<bool> {
        let url = format!("{}/v1/models", self.base_url());

        match self.client.get(&url).bearer_auth(&self.api_key).send().await {
            Ok(response) if response.status().is_success() => Ok(true),
            Ok(response) => {
                warn!("OpenAI health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("OpenAI health check error: {}", e);
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
        let config = VisionClientConfig {
            openai_api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        let client = OpenAiVisionClient::new(config).unwrap();
        let images = vec![EncodedImage::new("image/png", vec![0x89, b'P', b'N', b'G'])];
        let value = serde_json::to_value(client.build_request(&images, "prompt")).unwrap();

        let content = &value["messages"][0]["content"];
        assert_eq!(content[0]["type"], "text");
        assert_eq!(content[1]["type"], "image_url");
        assert!(content[1]["image_url"]["url"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,"));
        assert_eq!(value["response_format"]["type"], "json_object");
        assert_eq!(value["model"], "gpt-4o-mini");
    }
}
