//! Plain HTTP GET with a small fixed retry budget.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;

use super::{Payload, is_pdf_content_type};
use crate::config::FetchConfig;
use crate::error::{Result, SiftError};

/// First extraction tier: fetch the page directly.
#[derive(Debug, Clone)]
pub struct StaticFetcher {
    attempts: u32,
    timeout: Duration,
    backoff: Duration,
}

impl StaticFetcher {
    /// Build from the fetch configuration.
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            attempts: config.static_attempts.max(1),
            timeout: config.timeout(),
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }

    /// GET `url`, retrying failed attempts with linear backoff.
    ///
    /// PDF responses are returned as raw bytes whatever their status; any
    /// other response must be a success status.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's error once every attempt has failed.
    pub async fn fetch(&self, client: &reqwest::Client, url: &str) -> Result<Payload> {
        let mut last_error = None;
        for attempt in 0..self.attempts {
            if attempt > 0 {
                tokio::time::sleep(self.backoff * attempt).await;
            }
            match self.fetch_once(client, url).await {
                Ok(payload) => return Ok(payload),
                Err(e) => {
                    tracing::debug!(%url, attempt = attempt + 1, error = %e, "static fetch attempt failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| SiftError::Fetch("no fetch attempts made".into())))
    }

    async fn fetch_once(&self, client: &reqwest::Client, url: &str) -> Result<Payload> {
        let response = client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SiftError::Http(e.without_url().to_string()))?;

        let is_pdf = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(is_pdf_content_type);
        if is_pdf {
            let body = response
                .bytes()
                .await
                .map_err(|e| SiftError::Http(e.without_url().to_string()))?;
            return Ok(Payload::Pdf(body));
        }

        let status = response.status();
        if !status.is_success() {
            return Err(SiftError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SiftError::Http(e.without_url().to_string()))?;
        Ok(Payload::Html(body))
    }
}
