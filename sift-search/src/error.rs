//! Error types for the sift-search crate.
//!
//! Provider failures are reported with distinct, stable reasons so callers
//! (and tests) can tell a missing credential from a blocked request. The
//! aggregator collapses every one of them to "no results" for that provider.
//! Credentials never appear in error messages.

/// Errors that can occur while querying a search provider.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The request could not be sent or the response body could not be read.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The provider answered with a status outside the accepted set.
    #[error("unexpected status {status} from {provider}")]
    Status {
        /// Provider that answered.
        provider: &'static str,
        /// HTTP status code returned.
        status: u16,
    },

    /// The provider response could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// The provider is optional and has no endpoint or credential configured.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// Invalid search configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl SearchError {
    /// Returns `true` if this error means the provider was skipped rather
    /// than attempted.
    pub fn is_not_configured(&self) -> bool {
        matches!(self, Self::NotConfigured(_))
    }
}

/// Convenience type alias for sift-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
