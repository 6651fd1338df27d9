use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::core::errors::PipelineError;

pub const DEFAULT_MAX_RESULTS: usize = 3;

const DEFAULT_BASE_URL: &str = "https://serpapi.com";

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
}

/// Web search handle, invoked only when the Manager stage asks for live
/// data. Implementations surface a missing credential as
/// `PipelineError::SearchUnavailable` so the orchestrator can skip the step
/// without failing the turn.
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, PipelineError>;
}

/// SerpApi Google search client.
#[derive(Clone)]
pub struct SerpApiClient {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl SerpApiClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(PipelineError::provider)?;

        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
        })
    }

    #[allow(dead_code)]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl SearchClient for SerpApiClient {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, PipelineError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                PipelineError::SearchUnavailable("SERPAPI_API_KEY is not set".to_string())
            })?;

        let url = format!(
            "{}/search?engine=google&q={}&api_key={}&num={}",
            self.base_url,
            urlencoding::encode(query),
            api_key,
            max_results
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(PipelineError::provider)?;

        if !response.status().is_success() {
            return Err(PipelineError::Provider(format!(
                "SerpApi search failed: {}",
                response.status()
            )));
        }

        let payload: Value = response.json().await.map_err(PipelineError::provider)?;
        Ok(extract_organic_results(&payload, max_results))
    }
}

fn extract_organic_results(payload: &Value, max_results: usize) -> Vec<SearchResult> {
    let items = payload
        .get("organic_results")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    let mut results = Vec::new();
    for item in items {
        let title = item.get("title").and_then(|v| v.as_str()).unwrap_or("");
        let link = item.get("link").and_then(|v| v.as_str()).unwrap_or("");
        if title.is_empty() || link.is_empty() {
            continue;
        }
        results.push(SearchResult {
            title: title.to_string(),
            link: link.to_string(),
        });
        if results.len() >= max_results {
            break;
        }
    }

    results
}

/// Render results as markdown link lines for display and for appending to
/// the Manager context.
pub fn render_links(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No search results found.".to_string();
    }

    results
        .iter()
        .map(|r| format!("- [{}]({})", r.title, r.link))
        .collect::<Vec<_>>()
        .join("\n")
}
