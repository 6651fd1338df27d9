use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::LlmProvider;
use crate::core::errors::PipelineError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini REST provider.
///
/// Uses `generateContent` for completions and `batchEmbedContents` for
/// embeddings. Every request carries the client-level timeout; a timeout
/// surfaces as a provider error like any other transport failure.
#[derive(Clone)]
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    model: String,
    embed_model: String,
    client: Client,
}

impl GeminiProvider {
    pub fn new(
        api_key: String,
        model: String,
        embed_model: String,
        timeout: Duration,
    ) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(PipelineError::provider)?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model,
            embed_model,
            client,
        })
    }

    /// Point the provider at a different endpoint (tests, proxies).
    #[allow(dead_code)]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String, PipelineError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(PipelineError::provider)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(PipelineError::Provider(format!(
                "Gemini generate error ({}): {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(PipelineError::provider)?;

        let content = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.to_string());

        // A prompt blocked by safety filters yields a candidate-less payload.
        content.ok_or_else(|| {
            PipelineError::Provider("Gemini returned no text candidates".to_string())
        })
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        let url = format!(
            "{}/models/{}:batchEmbedContents?key={}",
            self.base_url, self.embed_model, self.api_key
        );

        let requests: Vec<Value> = inputs
            .iter()
            .map(|text| {
                json!({
                    "model": format!("models/{}", self.embed_model),
                    "content": { "parts": [{ "text": text }] },
                })
            })
            .collect();

        let res = self
            .client
            .post(&url)
            .json(&json!({ "requests": requests }))
            .send()
            .await
            .map_err(PipelineError::provider)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(PipelineError::Provider(format!(
                "Gemini embed error ({}): {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(PipelineError::provider)?;

        let mut embeddings = Vec::new();
        if let Some(items) = payload["embeddings"].as_array() {
            for item in items {
                if let Some(vals) = item["values"].as_array() {
                    let vec: Vec<f32> = vals
                        .iter()
                        .filter_map(|v| v.as_f64().map(|f| f as f32))
                        .collect();
                    embeddings.push(vec);
                }
            }
        }

        if embeddings.len() != inputs.len() {
            return Err(PipelineError::Provider(format!(
                "Gemini embed returned {} vectors for {} inputs",
                embeddings.len(),
                inputs.len()
            )));
        }

        Ok(embeddings)
    }
}
