//! Runtime settings resolved from the environment.

use crate::error::{PixPromptError, Result};
use crate::image::providers::{
    TogetherModel, TogetherProvider, API_KEY_ENV, API_URL_ENV, DEFAULT_API_URL,
};
use std::net::SocketAddr;
use std::time::Duration;

/// Environment variable selecting the model.
pub const MODEL_ENV: &str = "IMAGE_MODEL";
/// Environment variable with the listen address for the pages.
pub const BIND_ENV: &str = "PIXPROMPT_BIND";
/// Environment variable with the API timeout in seconds.
pub const TIMEOUT_ENV: &str = "IMAGE_API_TIMEOUT_SECS";

/// Default listen address.
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
/// Default API timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Everything needed to talk to the image API and serve the pages.
#[derive(Clone)]
pub struct Settings {
    /// API base URL, without the `/images/generations` suffix.
    pub api_url: String,
    /// Bearer token.
    pub api_key: String,
    /// Model identifier.
    pub model: TogetherModel,
    /// Listen address for the web pages.
    pub bind: SocketAddr,
    /// Timeout for one API call.
    pub timeout: Duration,
}

impl Settings {
    /// Reads settings from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honored.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, treating blank values as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get(API_KEY_ENV)
            .ok_or_else(|| PixPromptError::Auth(format!("{API_KEY_ENV} is not set")))?;

        let api_url = get(API_URL_ENV).unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let model = get(MODEL_ENV)
            .map(|id| TogetherModel::from_id(id.trim()))
            .unwrap_or_default();

        let bind = get(BIND_ENV)
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| PixPromptError::InvalidRequest(format!("{BIND_ENV}: {e}")))?;

        let timeout_secs = match get(TIMEOUT_ENV) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| PixPromptError::InvalidRequest(format!("{TIMEOUT_ENV}: {e}")))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_url,
            api_key,
            model,
            bind,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Returns the API key in a form safe to log.
    pub fn masked_api_key(&self) -> String {
        mask_api_key(&self.api_key)
    }

    /// Builds the provider these settings describe.
    pub fn provider(&self) -> Result<TogetherProvider> {
        TogetherProvider::builder()
            .api_key(self.api_key.clone())
            .api_url(self.api_url.clone())
            .model(self.model.clone())
            .timeout(self.timeout)
            .build()
    }

    /// Logs where requests will go, without exposing the key.
    pub fn log_summary(&self) {
        tracing::info!("API URL: {}", self.api_url);
        tracing::info!("API Key: {}", self.masked_api_key());
        tracing::info!(
            model = %self.model,
            timeout_secs = self.timeout.as_secs(),
            "image API configured"
        );
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("api_url", &self.api_url)
            .field("api_key", &self.masked_api_key())
            .field("model", &self.model)
            .field("bind", &self.bind)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Keeps the first five characters of a key and elides the rest.
pub fn mask_api_key(key: &str) -> String {
    let prefix: String = key.chars().take(5).collect();
    format!("{prefix}...")
}
