//! Trait definition for pluggable search provider backends.
//!
//! Each backend (DuckDuckGo, SearXNG, Brave, SerpAPI) implements
//! [`ProviderClient`] to provide a uniform interface for querying and
//! extracting candidate URLs.

use crate::error::SearchError;
use crate::types::Provider;
use async_trait::async_trait;

/// A pluggable search backend.
///
/// Implementors query one external backend and extract candidate URLs from
/// its response. Each provider handles its own:
///
/// - request construction, credentials and query encoding
/// - response decoding (HTML anchors or JSON result lists)
/// - normalisation of result URLs and removal of empty or repeated entries
///
/// Failures are returned with a distinct reason. The aggregator logs them and
/// treats the provider as having returned nothing, so a provider never fails
/// the aggregate call. All implementations must be `Send + Sync` so they can
/// be queried concurrently.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Query the backend and return candidate URLs in the backend's order.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the provider is not configured, the request
    /// fails, the status is not accepted, or the response cannot be decoded.
    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError>;

    /// Returns which [`Provider`] this implementation represents.
    fn provider(&self) -> Provider;
}
