//! SearXNG provider: self-hosted metasearch with JSON output.
//!
//! Optional: skipped unless `searxng_url` is configured. The instance must
//! have the `json` format enabled in its `settings.yml`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::aggregate::url_filter::unique_candidates;
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http;
use crate::provider::ProviderClient;
use crate::types::Provider;

#[derive(Debug, Deserialize)]
struct SearxngResponse {
    #[serde(default)]
    results: Vec<SearxngItem>,
}

#[derive(Debug, Deserialize)]
struct SearxngItem {
    url: Option<String>,
}

/// SearXNG JSON API client.
#[derive(Debug, Clone)]
pub struct SearxngProvider {
    base_url: Option<String>,
    timeout: Duration,
    user_agent: Option<String>,
}

impl SearxngProvider {
    /// Build from the search configuration.
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            base_url: config
                .searxng_url
                .as_deref()
                .map(|u| u.trim_end_matches('/').to_owned())
                .filter(|u| !u.is_empty()),
            timeout: Duration::from_secs(config.timeout_seconds),
            user_agent: config.user_agent.clone(),
        }
    }
}

#[async_trait]
impl ProviderClient for SearxngProvider {
    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or(SearchError::NotConfigured(Provider::Searxng.name()))?;
        tracing::trace!(query, "SearXNG search");

        let client = http::build_client(self.timeout, self.user_agent.as_deref())?;
        let request = client
            .get(format!("{base}/search"))
            .query(&[("q", query), ("format", "json")]);

        let body: SearxngResponse = super::fetch_json(request, Provider::Searxng).await?;
        Ok(parse_results(body))
    }

    fn provider(&self) -> Provider {
        Provider::Searxng
    }
}

fn parse_results(body: SearxngResponse) -> Vec<String> {
    unique_candidates(body.results.into_iter().filter_map(|item| item.url))
}
