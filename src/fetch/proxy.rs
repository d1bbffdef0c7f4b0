//! Readability proxy tier.
//!
//! The proxy fetches and cleans the page on our behalf and answers with
//! plain text. It expects the target appended to its prefix with a plain
//! `http://` scheme.

use std::time::Duration;

use reqwest::StatusCode;

use crate::config::ProxyConfig;
use crate::error::{Result, SiftError};

/// Rewrite `url` to the plain `http://` form the proxy expects.
///
/// ```
/// use sift::fetch::normalize_for_proxy;
///
/// assert_eq!(normalize_for_proxy("https://x.example/a"), "http://x.example/a");
/// assert_eq!(normalize_for_proxy("x.example/a"), "http://x.example/a");
/// ```
pub fn normalize_for_proxy(url: &str) -> String {
    let trimmed = url.trim();
    if let Some(rest) = strip_scheme(trimmed, "https://") {
        format!("http://{rest}")
    } else if strip_scheme(trimmed, "http://").is_some() {
        trimmed.to_owned()
    } else {
        format!("http://{trimmed}")
    }
}

fn strip_scheme<'a>(url: &'a str, scheme: &str) -> Option<&'a str> {
    let head = url.get(..scheme.len())?;
    head.eq_ignore_ascii_case(scheme).then(|| &url[scheme.len()..])
}

/// Second extraction tier: fetch through the readability proxy.
#[derive(Debug, Clone)]
pub struct ProxyFetcher {
    prefix: String,
    timeout: Duration,
    min_body_len: usize,
}

impl ProxyFetcher {
    /// Build from the proxy configuration.
    pub fn new(config: &ProxyConfig) -> Self {
        Self {
            prefix: config.prefix.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
            min_body_len: config.min_body_len,
        }
    }

    /// The proxy URL for `url`.
    pub fn proxied_url(&self, url: &str) -> String {
        format!("{}{}", self.prefix, normalize_for_proxy(url))
    }

    /// Fetch `url` through the proxy.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Status`] unless the proxy answers 200 or 304,
    /// and [`SiftError::Fetch`] when the body is too short to be a page.
    pub async fn fetch(&self, client: &reqwest::Client, url: &str) -> Result<String> {
        let response = client
            .get(self.proxied_url(url))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SiftError::Http(e.without_url().to_string()))?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::NOT_MODIFIED {
            return Err(SiftError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SiftError::Http(e.without_url().to_string()))?;
        let len = body.trim().chars().count();
        if len <= self.min_body_len {
            return Err(SiftError::Fetch(format!("proxy body too short ({len} chars)")));
        }
        Ok(body)
    }
}
