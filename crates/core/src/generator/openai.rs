//! OpenAI image generation client.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{classify_response, GenerationError, ImageProvider, ProviderKind};

/// OpenAI client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_size")]
    pub size: String,
    /// Base URL (default: https://api.openai.com/v1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_openai_model() -> String {
    "gpt-image-1".to_string()
}

fn default_size() -> String {
    "1024x1024".to_string()
}

fn default_timeout() -> u64 {
    120
}

/// OpenAI `images/generations` client.
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    model: String,
    size: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, GenerationError> {
        if config.api_key.is_empty() {
            return Err(GenerationError::NotConfigured(
                "OpenAI API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::NotConfigured(e.to_string()))?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.model,
            size: config.size,
            api_key: config.api_key,
        })
    }

    /// Download an image the API handed back by URL.
    async fn download(&self, url: &str) -> Result<Vec<u8>, GenerationError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Transient(format!(
                "image download returned HTTP {}",
                status.as_u16()
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[derive(Debug, Serialize)]
struct ImagesRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
    url: Option<String>,
}

/// Where the generated image lives in a response.
#[derive(Debug, PartialEq, Eq)]
enum ImagePayload {
    Inline(Vec<u8>),
    Url(String),
}

fn extract_payload(body: &str) -> Result<ImagePayload, GenerationError> {
    let response: ImagesResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::Malformed(format!("invalid OpenAI response: {}", e)))?;

    let datum = response
        .data
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::Malformed("no image in OpenAI response".to_string()))?;

    if let Some(b64) = datum.b64_json {
        let bytes = BASE64
            .decode(b64.as_bytes())
            .map_err(|e| GenerationError::Malformed(format!("invalid base64 image: {}", e)))?;
        return Ok(ImagePayload::Inline(bytes));
    }

    datum
        .url
        .map(ImagePayload::Url)
        .ok_or_else(|| GenerationError::Malformed("image entry has neither data nor url".to_string()))
}

#[async_trait]
impl ImageProvider for OpenAiClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn generate(&self, prompt: &str) -> Result<Vec<u8>, GenerationError> {
        let url = format!("{}/images/generations", self.base_url);
        let request = ImagesRequest {
            model: &self.model,
            prompt,
            n: 1,
            size: &self.size,
        };

        debug!(model = %self.model, "OpenAI images/generations");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(classify_response(status.as_u16(), &body));
        }

        match extract_payload(&body)? {
            ImagePayload::Inline(bytes) => Ok(bytes),
            ImagePayload::Url(image_url) => self.download(&image_url).await,
        }
    }
}
