//! Scene illustration backends.
//!
//! The illustration service is best-effort: the assembler swallows every
//! [`IllustrationError`] per scene. Only missing credentials, reported by
//! [`Illustrator::check_credentials`], abort a request.

use async_trait::async_trait;
use reqwest::Client;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::hash::Hasher;
use std::time::Duration;
use thiserror::Error;

use crate::config::{ConfigError, IllustrationConfig};
use crate::schema::story::ArtStyle;

#[derive(Debug, Error)]
pub enum IllustrationError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("response contained no image")]
    EmptyResponse,
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// The prompt actually sent to a backend: scene prompt plus style modifier.
pub fn styled_prompt(prompt: &str, style: ArtStyle) -> String {
    format!("{}, {}", prompt, style.modifier())
}

/// An image generation service.
#[async_trait]
pub trait Illustrator: Send + Sync {
    /// Generate an image for `prompt` and return its URL.
    async fn illustrate(&self, prompt: &str, style: ArtStyle) -> Result<String, IllustrationError>;

    /// Fails when the backend cannot be used at all.
    fn check_credentials(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// OpenAI-compatible `images/generations` client.
#[derive(Clone)]
pub struct OpenAiIllustrator {
    client: Client,
    base_url: String,
    model: String,
    size: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    n: u32,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    url: Option<String>,
    b64_json: Option<String>,
}

impl OpenAiIllustrator {
    pub fn new(config: &IllustrationConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            size: config.size.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn image_url(datum: ImageDatum) -> Option<String> {
        datum
            .url
            .or_else(|| datum.b64_json.map(|b64| format!("data:image/png;base64,{b64}")))
    }
}

#[async_trait]
impl Illustrator for OpenAiIllustrator {
    async fn illustrate(&self, prompt: &str, style: ArtStyle) -> Result<String, IllustrationError> {
        let api_key = self.api_key.as_deref().unwrap_or_default();
        let prompt = styled_prompt(prompt, style);
        let request = ImageGenerationRequest {
            model: &self.model,
            prompt: &prompt,
            size: &self.size,
            n: 1,
        };

        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(IllustrationError::Status { status, body });
        }

        let parsed: ImageGenerationResponse = response.json().await?;
        let url = parsed
            .data
            .into_iter()
            .next()
            .and_then(Self::image_url)
            .ok_or(IllustrationError::EmptyResponse)?;
        tracing::debug!(model = %self.model, "generated illustration");
        Ok(url)
    }

    fn check_credentials(&self) -> Result<(), ConfigError> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(()),
            _ => Err(ConfigError::MissingApiKey),
        }
    }
}

/// Credential-free backend returning stock placeholder images. The same
/// prompt and style always map to the same URL.
#[derive(Debug, Clone)]
pub struct PlaceholderIllustrator {
    base_url: String,
}

pub const DEFAULT_PLACEHOLDER_URL: &str = "https://picsum.photos/512/512";

impl Default for PlaceholderIllustrator {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER_URL)
    }
}

impl PlaceholderIllustrator {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }

    pub fn url_for(&self, prompt: &str, style: ArtStyle) -> String {
        let mut hasher = FxHasher::default();
        hasher.write(styled_prompt(prompt, style).as_bytes());
        format!("{}?random={}", self.base_url, hasher.finish() % 1000)
    }
}

#[async_trait]
impl Illustrator for PlaceholderIllustrator {
    async fn illustrate(&self, prompt: &str, style: ArtStyle) -> Result<String, IllustrationError> {
        Ok(self.url_for(prompt, style))
    }
}
