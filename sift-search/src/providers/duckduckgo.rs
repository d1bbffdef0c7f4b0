//! DuckDuckGo provider: HTML results pages, no credentials required.
//!
//! Queries both HTML endpoints (`duckduckgo.com/html/` and
//! `html.duckduckgo.com/html/`) concurrently. Either endpoint may be served
//! a bot check on any given request, so results from both are merged.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

use crate::aggregate::url_filter::unique_candidates;
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::http;
use crate::provider::ProviderClient;
use crate::types::Provider;

/// Anchor selectors tried in order; the first that matches anything wins.
const ANCHOR_SELECTORS: &[&str] = &[
    r#"a[data-testid="result-title-a"]"#,
    "a.result__a, a.result__url",
    "a",
];

/// DuckDuckGo HTML scraper.
///
/// Priority 1 provider: always available and tolerant of automated
/// requests on its HTML-only endpoints.
#[derive(Debug, Clone)]
pub struct DuckDuckGoProvider {
    endpoints: Vec<String>,
    timeout: Duration,
    user_agent: Option<String>,
}

impl DuckDuckGoProvider {
    /// Build from the search configuration.
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            endpoints: config.duckduckgo_endpoints.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
            user_agent: config.user_agent.clone(),
        }
    }

    /// Resolve DuckDuckGo's redirect wrapper to the real destination.
    ///
    /// DDG wraps outbound links like
    /// `//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=...`; the
    /// `uddg` query parameter holds the percent-encoded target. Links that
    /// are not wrapped are returned as-is (protocol-relative ones get
    /// `https:`).
    pub fn decode_href(href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }

        let full_href = if href.starts_with("//") {
            format!("https:{href}")
        } else if href.starts_with("/l/") {
            format!("https://duckduckgo.com{href}")
        } else {
            href.to_owned()
        };

        let Ok(parsed) = Url::parse(&full_href) else {
            return Some(full_href);
        };

        let is_redirect = parsed
            .host_str()
            .is_some_and(|h| h.ends_with("duckduckgo.com"))
            && parsed.path().starts_with("/l/");
        if !is_redirect {
            return Some(full_href);
        }

        parsed
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, value)| value.into_owned())
            .filter(|target| !target.is_empty())
    }

    async fn query_endpoint(
        client: &reqwest::Client,
        endpoint: &str,
        query: &str,
    ) -> Result<Vec<String>, SearchError> {
        let response = client
            .get(endpoint)
            .query(&[("q", query), ("kl", "us-en")])
            .send()
            .await
            .map_err(|e| SearchError::Http(format!("DuckDuckGo request failed: {}", e.without_url())))?;

        let status = response.status().as_u16();
        if status != 200 && status != 304 {
            return Err(SearchError::Status {
                provider: Provider::DuckDuckGo.name(),
                status,
            });
        }

        let html = response
            .text()
            .await
            .map_err(|e| SearchError::Http(format!("DuckDuckGo response read failed: {}", e.without_url())))?;

        tracing::trace!(endpoint, bytes = html.len(), "DuckDuckGo response received");

        parse_duckduckgo_html(&html)
    }
}

#[async_trait]
impl ProviderClient for DuckDuckGoProvider {
    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError> {
        tracing::trace!(query, "DuckDuckGo search");

        let client = http::build_client(self.timeout, self.user_agent.as_deref())?;

        let outcomes = futures::future::join_all(
            self.endpoints
                .iter()
                .map(|endpoint| Self::query_endpoint(&client, endpoint, query)),
        )
        .await;

        let mut links = Vec::new();
        let mut first_error = None;
        let mut any_ok = false;
        for outcome in outcomes {
            match outcome {
                Ok(urls) => {
                    any_ok = true;
                    links.extend(urls);
                }
                Err(err) => {
                    tracing::debug!(error = %err, "DuckDuckGo endpoint failed");
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) if !any_ok => Err(err),
            _ => Ok(unique_candidates(links)),
        }
    }

    fn provider(&self) -> Provider {
        Provider::DuckDuckGo
    }
}

/// Parse a DuckDuckGo HTML results page into candidate URLs.
///
/// Extracted as a separate function for testability with mock HTML.
pub(crate) fn parse_duckduckgo_html(html: &str) -> Result<Vec<String>, SearchError> {
    let document = Html::parse_document(html);

    for selector_str in ANCHOR_SELECTORS {
        let selector = Selector::parse(selector_str)
            .map_err(|e| SearchError::Parse(format!("invalid anchor selector: {e:?}")))?;

        let hrefs: Vec<&str> = document
            .select(&selector)
            .filter_map(|a| a.value().attr("href"))
            .collect();
        if hrefs.is_empty() {
            continue;
        }

        let urls = unique_candidates(
            hrefs
                .into_iter()
                .filter_map(DuckDuckGoProvider::decode_href)
                .filter(|u| u.starts_with("http")),
        );
        tracing::debug!(count = urls.len(), selector = selector_str, "DuckDuckGo results parsed");
        return Ok(urls);
    }

    Ok(Vec::new())
}
