//! OpenAI-compatible image generation (`POST {endpoint}/images/generations`).

use async_trait::async_trait;
use recipebot_core::config::ImageConfig;
use recipebot_core::error::{RecipeBotError, Result};
use recipebot_core::traits::ImageGenerator;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Image generator for any OpenAI-compatible endpoint.
pub struct OpenAiImageGenerator {
    /// Base URL (e.g. "https://api.openai.com/v1").
    base_url: String,
    model: String,
    size: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiImageGenerator {
    pub fn from_config(config: &ImageConfig, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RecipeBotError::Config(format!("HTTP client: {e}")))?;
        Ok(Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            size: config.size.clone(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    /// Build the auth header for the request.
    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            req
        } else {
            req.bearer_auth(&self.api_key)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

#[async_trait]
impl ImageGenerator for OpenAiImageGenerator {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/images/generations", self.base_url);
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "n": 1,
            "size": self.size,
        });

        let req = self.client.post(&url).json(&body);
        let resp = self
            .apply_auth(req)
            .send()
            .await
            .map_err(|e| RecipeBotError::Generation(format!("{} request failed: {e}", self.model)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(RecipeBotError::Generation(format!(
                "{} returned {status}: {}",
                self.model,
                text.chars().take(200).collect::<String>()
            )));
        }

        let parsed: ImagesResponse = resp
            .json()
            .await
            .map_err(|e| RecipeBotError::Generation(format!("invalid images response: {e}")))?;

        let image_url = parsed
            .data
            .into_iter()
            .find_map(|d| d.url)
            .ok_or_else(|| RecipeBotError::Generation("response contained no image URL".into()))?;

        tracing::debug!("🎨 Image generated by {}", self.model);
        Ok(image_url)
    }
}
