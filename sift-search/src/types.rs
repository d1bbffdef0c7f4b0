//! Core types for discovery results and provider identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Candidate URLs discovered for one query.
///
/// `urls` holds normalised absolute URLs, each appearing once, in provider
/// priority order with each provider's own order preserved inside its slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The query these URLs were discovered for.
    pub query: String,
    /// Deduplicated, filtered, capped candidate URLs.
    pub urls: Vec<String>,
}

impl SearchResult {
    /// Number of candidate URLs.
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Returns `true` when no provider produced a usable URL.
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Search backends that sift can query.
///
/// The declaration order is the default priority order used when merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// DuckDuckGo HTML endpoints, scraped. Needs no credentials.
    DuckDuckGo,
    /// Self-hosted SearXNG instance with the JSON output format enabled.
    Searxng,
    /// Brave Search API, keyed by subscription token.
    Brave,
    /// SerpAPI Google results, keyed by API key.
    SerpApi,
}

impl Provider {
    /// Returns the human-readable name of this provider.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DuckDuckGo => "DuckDuckGo",
            Self::Searxng => "SearXNG",
            Self::Brave => "Brave",
            Self::SerpApi => "SerpAPI",
        }
    }

    /// Returns all providers in default priority order.
    pub fn all() -> &'static [Provider] {
        &[Self::DuckDuckGo, Self::Searxng, Self::Brave, Self::SerpApi]
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
