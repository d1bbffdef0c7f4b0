//! Search configuration with sensible defaults.
//!
//! [`SearchConfig`] controls which providers are queried and in which
//! priority order, per-request timeouts, the ad/tracker denylist, and the
//! endpoints and credentials of the optional API-backed providers.

use crate::error::SearchError;
use crate::types::Provider;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hosts whose links are never returned as candidates. Subdomains match too.
pub const DEFAULT_BLOCKED_HOSTS: &[&str] = &[
    "duckduckgo.com",
    "bing.com",
    "google.com",
    "doubleclick.net",
    "g.doubleclick.net",
    "facebook.com",
    "fb.com",
    "t.co",
    "twitter.com",
];

/// DuckDuckGo HTML endpoints, queried concurrently and merged in this order.
pub const DEFAULT_DUCKDUCKGO_ENDPOINTS: &[&str] = &[
    "https://duckduckgo.com/html/",
    "https://html.duckduckgo.com/html/",
];

/// Brave Search web endpoint.
pub const DEFAULT_BRAVE_ENDPOINT: &str = "https://api.search.brave.com/res/v1/web/search";

/// SerpAPI JSON endpoint.
pub const DEFAULT_SERPAPI_ENDPOINT: &str = "https://serpapi.com/search.json";

/// Configuration for candidate discovery.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Providers to query, in merge priority order. All run concurrently.
    pub providers: Vec<Provider>,
    /// Maximum number of candidate URLs kept per query after merging.
    pub max_per_query: usize,
    /// Per-provider HTTP request timeout in seconds.
    pub timeout_seconds: u64,
    /// Custom User-Agent string. If `None`, rotates through a built-in list
    /// of realistic browser User-Agents.
    pub user_agent: Option<String>,
    /// Ad/tracker hosts dropped from every result list.
    pub blocked_hosts: Vec<String>,
    /// DuckDuckGo HTML endpoints.
    pub duckduckgo_endpoints: Vec<String>,
    /// Base URL of a SearXNG instance, e.g. `http://localhost:8080`.
    pub searxng_url: Option<String>,
    /// Brave Search API endpoint.
    pub brave_endpoint: String,
    /// Brave Search subscription token. Read from config files but never
    /// written back.
    #[serde(skip_serializing)]
    pub brave_api_key: Option<String>,
    /// SerpAPI endpoint.
    pub serpapi_endpoint: String,
    /// SerpAPI key. Read from config files but never written back.
    #[serde(skip_serializing)]
    pub serpapi_api_key: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            providers: Provider::all().to_vec(),
            max_per_query: 5,
            timeout_seconds: 8,
            user_agent: None,
            blocked_hosts: DEFAULT_BLOCKED_HOSTS.iter().map(|h| (*h).to_owned()).collect(),
            duckduckgo_endpoints: DEFAULT_DUCKDUCKGO_ENDPOINTS
                .iter()
                .map(|e| (*e).to_owned())
                .collect(),
            searxng_url: None,
            brave_endpoint: DEFAULT_BRAVE_ENDPOINT.to_owned(),
            brave_api_key: None,
            serpapi_endpoint: DEFAULT_SERPAPI_ENDPOINT.to_owned(),
            serpapi_api_key: None,
        }
    }
}

impl fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(secret: &Option<String>) -> &'static str {
            if secret.is_some() { "<set>" } else { "<unset>" }
        }
        f.debug_struct("SearchConfig")
            .field("providers", &self.providers)
            .field("max_per_query", &self.max_per_query)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("user_agent", &self.user_agent)
            .field("blocked_hosts", &self.blocked_hosts)
            .field("duckduckgo_endpoints", &self.duckduckgo_endpoints)
            .field("searxng_url", &self.searxng_url)
            .field("brave_endpoint", &self.brave_endpoint)
            .field("brave_api_key", &redact(&self.brave_api_key))
            .field("serpapi_endpoint", &self.serpapi_endpoint)
            .field("serpapi_api_key", &redact(&self.serpapi_api_key))
            .finish()
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `max_per_query` must be greater than 0
    /// - `timeout_seconds` must be greater than 0
    /// - `providers` must not be empty and must not repeat a provider
    /// - DuckDuckGo needs at least one endpoint when enabled
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_per_query == 0 {
            return Err(SearchError::Config(
                "max_per_query must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.providers.is_empty() {
            return Err(SearchError::Config(
                "at least one provider must be enabled".into(),
            ));
        }
        for (i, provider) in self.providers.iter().enumerate() {
            if self.providers[..i].contains(provider) {
                return Err(SearchError::Config(format!(
                    "provider {provider} listed more than once"
                )));
            }
        }
        if self.providers.contains(&Provider::DuckDuckGo) && self.duckduckgo_endpoints.is_empty() {
            return Err(SearchError::Config(
                "duckduckgo_endpoints must not be empty when DuckDuckGo is enabled".into(),
            ));
        }
        Ok(())
    }

    /// Overlay credentials from the process environment.
    ///
    /// Reads `SEARXNG_URL`, `BRAVE_API_KEY` and `SERPAPI_API_KEY`. Unset or
    /// blank variables leave the current value untouched.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Same as [`apply_env`](Self::apply_env) with an injectable lookup.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        if let Some(url) = read("SEARXNG_URL") {
            self.searxng_url = Some(url.trim_end_matches('/').to_owned());
        }
        if let Some(key) = read("BRAVE_API_KEY") {
            self.brave_api_key = Some(key);
        }
        if let Some(key) = read("SERPAPI_API_KEY") {
            self.serpapi_api_key = Some(key);
        }
    }
}
