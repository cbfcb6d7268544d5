use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use async_trait::async_trait;
use bookshelf_core::{AppError, Config};
use serde::{Deserialize, Serialize};

use super::{GenerationParams, TextGenerator};

/// NLP Cloud generation API client
pub struct NlpCloudClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl Debug for NlpCloudClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("NlpCloudClient")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    text: &'a str,
    #[serde(flatten)]
    params: &'a GenerationParams,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    generated_text: String,
}

impl NlpCloudClient {
    pub fn new(
        api_base: &str,
        model: &str,
        gpu: bool,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let gpu_segment = if gpu { "gpu/" } else { "" };
        let endpoint = format!(
            "{}/v1/{}{}/generation",
            api_base.trim_end_matches('/'),
            gpu_segment,
            model
        );

        Ok(Self {
            http_client,
            endpoint,
            api_key: api_key.into(),
        })
    }

    /// Build a client from configuration. `None` when no API key is set.
    pub fn from_config(config: &Config) -> Result<Option<Self>, AppError> {
        let Some(api_key) = config.nlp_cloud_api_key() else {
            return Ok(None);
        };

        Self::new(
            config.nlp_cloud_api_base(),
            config.nlp_cloud_model(),
            config.nlp_cloud_gpu(),
            api_key,
            Duration::from_secs(config.nlp_cloud_timeout_secs()),
        )
        .map(Some)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextGenerator for NlpCloudClient {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, AppError> {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("Authorization", format!("Token {}", self.api_key))
            .json(&GenerationRequest {
                text: prompt,
                params,
            })
            .send()
            .await
            .map_err(|e| {
                AppError::TextGeneration(format!("Failed to reach text generation API: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(
                status = %status,
                error = %error_text,
                "Text generation request failed"
            );
            return Err(AppError::TextGeneration(format!(
                "Text generation API request failed: {} - {}",
                status, error_text
            )));
        }

        let parsed: GenerationResponse = response.json().await.map_err(|e| {
            AppError::TextGeneration(format!("Invalid text generation response: {}", e))
        })?;

        tracing::debug!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            output_len = parsed.generated_text.len(),
            "Text generation completed"
        );

        Ok(parsed.generated_text.trim().to_string())
    }
}
