//! Together AI image generation provider (FLUX.1 via the OpenAI-compatible
//! `/images/generations` endpoint).

use crate::error::{parse_retry_after, sanitize_error_message, PixPromptError, Result};
use crate::image::provider::ImageProvider;
use crate::image::types::{GeneratedImage, GenerationMetadata, GenerationRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Base URL used when neither the builder nor `IMAGE_API_URL` provides one.
pub const DEFAULT_API_URL: &str = "https://api.together.xyz/v1";

/// Environment variable holding the bearer token.
pub const API_KEY_ENV: &str = "IMAGE_API_KEY";

/// Environment variable holding the API base URL.
pub const API_URL_ENV: &str = "IMAGE_API_URL";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// FLUX model variants served by Together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TogetherModel {
    /// FLUX.1 [schnell], free tier.
    #[default]
    SchnellFree,
    /// FLUX.1 [schnell], paid tier.
    Schnell,
    /// FLUX.1 [dev].
    Dev,
    /// Any other model identifier, sent verbatim.
    Custom(String),
}

impl TogetherModel {
    /// Returns the API model identifier string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::SchnellFree => "black-forest-labs/FLUX.1-schnell-Free",
            Self::Schnell => "black-forest-labs/FLUX.1-schnell",
            Self::Dev => "black-forest-labs/FLUX.1-dev",
            Self::Custom(id) => id,
        }
    }

    /// Maps an identifier back to a known variant, or wraps it as `Custom`.
    pub fn from_id(id: &str) -> Self {
        match id {
            "black-forest-labs/FLUX.1-schnell-Free" => Self::SchnellFree,
            "black-forest-labs/FLUX.1-schnell" => Self::Schnell,
            "black-forest-labs/FLUX.1-dev" => Self::Dev,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl std::fmt::Display for TogetherModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder for TogetherProvider.
#[derive(Debug, Clone)]
pub struct TogetherProviderBuilder {
    api_key: Option<String>,
    api_url: Option<String>,
    model: TogetherModel,
    timeout: Duration,
}

impl Default for TogetherProviderBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: None,
            model: TogetherModel::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl TogetherProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `IMAGE_API_KEY`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the API base URL. Falls back to `IMAGE_API_URL`, then
    /// [`DEFAULT_API_URL`].
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Sets the model.
    pub fn model(mut self, model: TogetherModel) -> Self {
        self.model = model;
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the provider, resolving the API key and URL.
    pub fn build(self) -> Result<TogetherProvider> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                PixPromptError::Auth(format!("{API_KEY_ENV} not set and no API key provided"))
            })?;

        let api_url = self
            .api_url
            .or_else(|| std::env::var(API_URL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let client = reqwest::Client::builder().timeout(self.timeout).build()?;

        Ok(TogetherProvider {
            client,
            api_key,
            generations_url: format!("{}/images/generations", api_url.trim_end_matches('/')),
            model: self.model,
        })
    }
}

/// Together AI image generation provider.
pub struct TogetherProvider {
    client: reqwest::Client,
    api_key: String,
    generations_url: String,
    model: TogetherModel,
}

impl TogetherProvider {
    /// Creates a new `TogetherProviderBuilder`.
    pub fn builder() -> TogetherProviderBuilder {
        TogetherProviderBuilder::new()
    }

    /// Returns the configured model.
    pub fn model(&self) -> &TogetherModel {
        &self.model
    }

    /// Returns the full generations endpoint URL.
    pub fn generations_url(&self) -> &str {
        &self.generations_url
    }

    async fn request_images(
        &self,
        request: &GenerationRequest,
        n: u32,
    ) -> Result<Vec<GeneratedImage>> {
        request.validate()?;
        let start = Instant::now();
        let body = TogetherImageRequest::from_generation_request(request, &self.model, n);

        tracing::debug!(
            model = %self.model,
            steps = request.steps,
            n,
            prompt_len = request.prompt.len(),
            "submitting image generation request"
        );

        let response = self
            .client
            .post(&self.generations_url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "image generation request failed");
                PixPromptError::Network(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            let err = parse_error(status.as_u16(), &text, &headers);
            tracing::error!(
                status = status.as_u16(),
                body = %sanitize_error_message(&text),
                "error generating image"
            );
            return Err(err);
        }

        let text = response.text().await.map_err(|e| {
            tracing::error!(error = %e, "failed to read image generation response");
            PixPromptError::Network(e)
        })?;
        let payloads = extract_payloads(&text, n).map_err(|e| {
            tracing::error!(error = ?e, "error generating image");
            e
        })?;

        let metadata = GenerationMetadata {
            model: Some(self.model.as_str().to_string()),
            steps: Some(request.steps),
            duration_ms: Some(start.elapsed().as_millis() as u64),
        };

        let images = payloads
            .iter()
            .map(|b64| GeneratedImage::from_base64(b64, metadata.clone()))
            .collect::<Result<Vec<_>>>()
            .map_err(|e| {
                tracing::error!(error = %e, "error decoding generated image");
                e
            })?;

        tracing::debug!(
            count = images.len(),
            duration_ms = metadata.duration_ms,
            "image generation complete"
        );

        Ok(images)
    }
}

#[async_trait]
impl ImageProvider for TogetherProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage> {
        self.request_images(request, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PixPromptError::InvalidResponse("no images returned".into()))
    }

    async fn generate_batch(&self, request: &GenerationRequest) -> Result<Vec<GeneratedImage>> {
        self.request_images(request, request.count.max(1)).await
    }

    fn name(&self) -> &str {
        "Together AI (FLUX.1)"
    }

    async fn health_check(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(PixPromptError::Auth("API key is empty".into()));
        }
        let url = &self.generations_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(PixPromptError::InvalidRequest(format!(
                "API URL must be http(s): {url}"
            )));
        }
        Ok(())
    }
}

fn parse_error(status: u16, text: &str, headers: &reqwest::header::HeaderMap) -> PixPromptError {
    let text = sanitize_error_message(text);
    match status {
        429 => PixPromptError::RateLimited {
            retry_after: parse_retry_after(headers).map(Duration::from_secs),
        },
        401 | 403 => PixPromptError::Auth(text),
        _ => PixPromptError::Api {
            status,
            message: if text.is_empty() {
                format!("Request failed with status code {status}")
            } else {
                text
            },
        },
    }
}

/// Pulls the first `n` non-empty `b64_json` payloads out of a response body.
///
/// Anything short of that (not JSON, no `data`, empty entries, fewer than
/// `n` entries) is an invalid response.
fn extract_payloads(body: &str, n: u32) -> Result<Vec<String>> {
    let parsed: TogetherImageResponse = serde_json::from_str(body)
        .map_err(|e| PixPromptError::InvalidResponse(format!("unparseable body: {e}")))?;

    let data = parsed
        .data
        .ok_or_else(|| PixPromptError::InvalidResponse("missing data array".into()))?;

    let payloads: Vec<String> = data
        .into_iter()
        .take(n as usize)
        .map(|entry| entry.b64_json.filter(|b64| !b64.is_empty()))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| PixPromptError::InvalidResponse("entry without b64_json".into()))?;

    if payloads.is_empty() {
        return Err(PixPromptError::InvalidResponse("empty data array".into()));
    }
    if payloads.len() < n as usize {
        return Err(PixPromptError::InvalidResponse(format!(
            "expected {n} images, got {}",
            payloads.len()
        )));
    }
    Ok(payloads)
}

#[derive(Debug, Serialize)]
struct TogetherImageRequest {
    prompt: String,
    model: String,
    width: u32,
    height: u32,
    steps: u32,
    n: u32,
    response_format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
}

impl TogetherImageRequest {
    fn from_generation_request(req: &GenerationRequest, model: &TogetherModel, n: u32) -> Self {
        Self {
            prompt: req.prompt.clone(),
            model: model.as_str().to_string(),
            width: req.width,
            height: req.height,
            steps: req.steps,
            n,
            response_format: "b64_json",
            seed: req.seed,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TogetherImageResponse {
    #[serde(default)]
    data: Option<Vec<TogetherImageData>>,
}

#[derive(Debug, Deserialize)]
struct TogetherImageData {
    #[serde(default)]
    b64_json: Option<String>,
}
