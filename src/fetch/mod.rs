//! Fetch tiers: plain HTTP, readability proxy, and headless rendering.
//!
//! Each tier only knows how to get bytes for one URL. Deciding which tier's
//! result is good enough lives in [`crate::pipeline`].

pub mod chromium;
pub mod proxy;
pub mod render;
pub mod static_fetch;

pub use proxy::{ProxyFetcher, normalize_for_proxy};
pub use render::{RenderFetcher, RenderSession};
pub use static_fetch::StaticFetcher;

use bytes::Bytes;

/// Raw page content handed to the content extractor.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Markup, or plain text returned by the proxy.
    Html(String),
    /// A PDF document body.
    Pdf(Bytes),
}

impl Payload {
    /// Returns `true` when there is nothing to extract.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Html(html) => html.trim().is_empty(),
            Self::Pdf(bytes) => bytes.is_empty(),
        }
    }
}

/// Returns `true` when a `Content-Type` header value names a PDF.
pub(crate) fn is_pdf_content_type(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("pdf")
}
