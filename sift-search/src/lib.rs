//! # sift-search
//!
//! Multi-provider candidate discovery for sift.
//!
//! Given a query, this crate asks several independent search backends for
//! result links, waits for all of them, and merges what they return into one
//! short, clean list of candidate URLs.
//!
//! ## Design
//!
//! - Scrapes DuckDuckGo's HTML endpoints (no key needed), and optionally
//!   queries SearXNG, the Brave Search API and SerpAPI
//! - Providers run concurrently; the merge waits for every one of them and
//!   uses a fixed priority order, so output never depends on timing
//! - A provider failure (missing key, timeout, bad status) only removes that
//!   provider's contribution
//! - Ad, tracker and search-engine hosts are filtered out, duplicates are
//!   removed by exact URL, and the list is capped per query
//!
//! ## Security
//!
//! - API keys are never logged or included in error messages
//! - Queries are logged only at trace level

pub mod aggregate;
pub mod config;
pub mod error;
pub mod http;
pub mod provider;
pub mod providers;
pub mod types;

pub use aggregate::{Aggregator, Denylist, ProviderReport};
pub use config::SearchConfig;
pub use error::{Result, SearchError};
pub use provider::ProviderClient;
pub use types::{Provider, SearchResult};

/// Discover candidate URLs for `query` using every configured provider.
///
/// Builds an [`Aggregator`] from `config`, queries all providers
/// concurrently, and returns at most `config.max_per_query` URLs.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if the configuration is invalid. Provider
/// failures never surface here: if nothing is found, the result is empty.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> sift_search::Result<()> {
/// let config = sift_search::SearchConfig::default();
/// let result = sift_search::search("P613842 datasheet", &config).await?;
/// for url in &result.urls {
///     println!("{url}");
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search(query: &str, config: &SearchConfig) -> Result<SearchResult> {
    config.validate()?;
    let aggregator = Aggregator::from_config(config);
    Ok(aggregator.aggregate(query, config.max_per_query).await)
}

/// Discover candidate URLs with the default configuration plus credentials
/// from the environment.
///
/// # Errors
///
/// Same as [`search`].
pub async fn search_default(query: &str) -> Result<SearchResult> {
    let mut config = SearchConfig::default();
    config.apply_env();
    search(query, &config).await
}
