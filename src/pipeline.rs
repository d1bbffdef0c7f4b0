//! Tiered extraction for a single URL.
//!
//! Tiers run cheapest first and stop at the first one whose text clears its
//! threshold:
//!
//! 1. static GET (retried), accepted at `thresholds.min_text_len`
//! 2. readability proxy, accepted at the proxy floor
//! 3. headless render, accepted with any text
//!
//! If nothing is accepted the static text is kept as `static-thin`. Only a
//! render failure produces an `error` outcome.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::SiftConfig;
use crate::content::ContentExtractor;
use crate::fetch::{Payload, ProxyFetcher, RenderFetcher, RenderSession, StaticFetcher};

/// Which tier produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    /// Direct GET cleared the main threshold.
    Static,
    /// Readability proxy cleared the proxy floor.
    Proxy,
    /// Headless render returned a document.
    Render,
    /// Nothing cleared a threshold; the static text is kept as-is.
    StaticThin,
    /// The render tier failed.
    Error,
}

impl Tier {
    /// Stable label, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Proxy => "proxy",
            Self::Render => "render",
            Self::StaticThin => "static-thin",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of extracting one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    /// The candidate URL.
    pub url: String,
    /// Tier that produced `text`.
    pub tier: Tier,
    /// Extracted text, possibly empty.
    pub text: String,
    /// Failure message for `error` outcomes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionOutcome {
    /// A non-error outcome.
    pub fn new(url: impl Into<String>, tier: Tier, text: String) -> Self {
        Self {
            url: url.into(),
            tier,
            text,
            error: None,
        }
    }

    /// An `error` outcome with empty text.
    pub fn failed(url: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            url: url.into(),
            tier: Tier::Error,
            text: String::new(),
            error: Some(error.to_string()),
        }
    }

    /// Returns `true` when the outcome carries text and is not an error.
    pub fn is_success(&self) -> bool {
        self.tier != Tier::Error && !self.text.is_empty()
    }

    /// Length of the extracted text in chars.
    pub fn text_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Anything that turns one URL into an [`ExtractionOutcome`].
///
/// Must never fail: every problem is folded into the outcome.
#[async_trait]
pub trait UrlExtractor: Send + Sync {
    /// Extract `url` using `client` for plain HTTP work.
    async fn extract(&self, client: &reqwest::Client, url: &str) -> ExtractionOutcome;
}

/// The static, proxy, render tier chain.
#[derive(Debug, Clone)]
pub struct ExtractionPipeline {
    static_fetcher: StaticFetcher,
    proxy: Option<ProxyFetcher>,
    render: Option<RenderFetcher>,
    extractor: ContentExtractor,
    min_text_len: usize,
    proxy_floor: usize,
}

impl ExtractionPipeline {
    /// Build the tier chain. The render tier is present only when
    /// `render.enabled` is set and a session is given.
    pub fn new(config: &SiftConfig, render_session: Option<Arc<RenderSession>>) -> Self {
        let render = render_session
            .filter(|_| config.render.enabled)
            .map(|session| RenderFetcher::new(session, &config.render));
        Self {
            static_fetcher: StaticFetcher::new(&config.fetch),
            proxy: config.proxy.enabled.then(|| ProxyFetcher::new(&config.proxy)),
            render,
            extractor: ContentExtractor::new(&config.content),
            min_text_len: config.thresholds.min_text_len,
            proxy_floor: config.thresholds.proxy_floor(),
        }
    }

    /// Run the tiers for `url`.
    pub async fn extract(&self, client: &reqwest::Client, url: &str) -> ExtractionOutcome {
        let static_text = match self.static_fetcher.fetch(client, url).await {
            Ok(payload) => self.extractor.extract(payload, url).await,
            Err(e) => {
                tracing::debug!(%url, error = %e, "static tier failed");
                String::new()
            }
        };
        let static_len = static_text.chars().count();
        if static_len >= self.min_text_len {
            tracing::debug!(%url, chars = static_len, "accepted static tier");
            return ExtractionOutcome::new(url, Tier::Static, static_text);
        }

        if let Some(proxy) = &self.proxy {
            match proxy.fetch(client, url).await {
                Ok(body) => {
                    let text = self.extractor.extract(Payload::Html(body), url).await;
                    let len = text.chars().count();
                    if len >= self.proxy_floor {
                        tracing::debug!(%url, chars = len, "accepted proxy tier");
                        return ExtractionOutcome::new(url, Tier::Proxy, text);
                    }
                    tracing::debug!(%url, chars = len, floor = self.proxy_floor, "proxy text below floor");
                }
                Err(e) => tracing::warn!(%url, error = %e, "proxy tier failed"),
            }
        }

        if let Some(render) = &self.render {
            return match render.fetch(url).await {
                Ok(html) => {
                    let text = self.extractor.extract(Payload::Html(html), url).await;
                    tracing::debug!(%url, chars = text.chars().count(), "accepted render tier");
                    ExtractionOutcome::new(url, Tier::Render, text)
                }
                Err(e) => {
                    tracing::warn!(%url, error = %e, "render tier failed");
                    ExtractionOutcome::failed(url, e)
                }
            };
        }

        tracing::debug!(%url, chars = static_len, "no tier cleared its threshold");
        ExtractionOutcome::new(url, Tier::StaticThin, static_text)
    }
}

#[async_trait]
impl UrlExtractor for ExtractionPipeline {
    async fn extract(&self, client: &reqwest::Client, url: &str) -> ExtractionOutcome {
        ExtractionPipeline::extract(self, client, url).await
    }
}
