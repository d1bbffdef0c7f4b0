//! Search provider implementations.
//!
//! Each module provides a struct implementing [`crate::provider::ProviderClient`]
//! for one backend: DuckDuckGo is scraped from HTML, the others are JSON APIs.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::provider::ProviderClient;
use crate::types::Provider;

pub mod brave;
pub mod duckduckgo;
pub mod searxng;
pub mod serpapi;

pub use brave::BraveProvider;
pub use duckduckgo::DuckDuckGoProvider;
pub use searxng::SearxngProvider;
pub use serpapi::SerpApiProvider;

/// Build the client for `provider` from the search configuration.
pub fn client_for(provider: Provider, config: &SearchConfig) -> Arc<dyn ProviderClient> {
    match provider {
        Provider::DuckDuckGo => Arc::new(DuckDuckGoProvider::from_config(config)),
        Provider::Searxng => Arc::new(SearxngProvider::from_config(config)),
        Provider::Brave => Arc::new(BraveProvider::from_config(config)),
        Provider::SerpApi => Arc::new(SerpApiProvider::from_config(config)),
    }
}

/// Send a JSON API request and decode the body.
///
/// Any non-2xx status is a [`SearchError::Status`]. URLs are stripped from
/// transport errors because some providers carry credentials in the query.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    provider: Provider,
) -> Result<T, SearchError> {
    let response = request
        .send()
        .await
        .map_err(|e| SearchError::Http(format!("{provider} request failed: {}", e.without_url())))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SearchError::Status {
            provider: provider.name(),
            status: status.as_u16(),
        });
    }

    response.json::<T>().await.map_err(|e| {
        SearchError::Parse(format!("{provider} response decode failed: {}", e.without_url()))
    })
}
