//! SerpAPI provider: Google organic results through a paid proxy API.
//!
//! Optional: skipped unless `serpapi_api_key` is configured. The key travels
//! as the `api_key` query parameter, so request URLs never reach logs.

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
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<SerpApiItem>,
}

#[derive(Debug, Deserialize)]
struct SerpApiItem {
    link: Option<String>,
}

/// SerpAPI Google engine client.
#[derive(Clone)]
pub struct SerpApiProvider {
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
    user_agent: Option<String>,
}

impl SerpApiProvider {
    /// Build from the search configuration.
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            endpoint: config.serpapi_endpoint.clone(),
            api_key: config.serpapi_api_key.clone().filter(|k| !k.is_empty()),
            timeout: Duration::from_secs(config.timeout_seconds),
            user_agent: config.user_agent.clone(),
        }
    }
}

#[async_trait]
impl ProviderClient for SerpApiProvider {
    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(SearchError::NotConfigured(Provider::SerpApi.name()))?;
        tracing::trace!(query, "SerpAPI search");

        let client = http::build_client(self.timeout, self.user_agent.as_deref())?;
        let request = client
            .get(&self.endpoint)
            .query(&[("engine", "google"), ("q", query), ("api_key", key)]);

        let body: SerpApiResponse = super::fetch_json(request, Provider::SerpApi).await?;
        Ok(parse_results(body))
    }

    fn provider(&self) -> Provider {
        Provider::SerpApi
    }
}

fn parse_results(body: SerpApiResponse) -> Vec<String> {
    unique_candidates(body.organic_results.into_iter().filter_map(|item| item.link))
}
