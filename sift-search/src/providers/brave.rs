//! Brave Search API provider: independent index, keyed access.
//!
//! Optional: skipped unless `brave_api_key` is configured. The key is sent
//! in the `X-Subscription-Token` header; results live under `web.results`.

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
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveItem>,
}

#[derive(Debug, Deserialize)]
struct BraveItem {
    url: Option<String>,
}

/// Brave Search web API client.
#[derive(Clone)]
pub struct BraveProvider {
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
    user_agent: Option<String>,
}

impl BraveProvider {
    /// Build from the search configuration.
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            endpoint: config.brave_endpoint.clone(),
            api_key: config.brave_api_key.clone().filter(|k| !k.is_empty()),
            timeout: Duration::from_secs(config.timeout_seconds),
            user_agent: config.user_agent.clone(),
        }
    }
}

#[async_trait]
impl ProviderClient for BraveProvider {
    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(SearchError::NotConfigured(Provider::Brave.name()))?;
        tracing::trace!(query, "Brave search");

        let client = http::build_client(self.timeout, self.user_agent.as_deref())?;
        let request = client
            .get(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .header("X-Subscription-Token", key)
            .query(&[("q", query)]);

        let body: BraveResponse = super::fetch_json(request, Provider::Brave).await?;
        Ok(parse_results(body))
    }

    fn provider(&self) -> Provider {
        Provider::Brave
    }
}

fn parse_results(body: BraveResponse) -> Vec<String> {
    let items = body.web.map(|web| web.results).unwrap_or_default();
    unique_candidates(items.into_iter().filter_map(|item| item.url))
}
