//! Candidate URL normalisation and ad/tracker host filtering.
//!
//! Providers pass every raw link through [`normalize_candidate`] so that the
//! aggregator can deduplicate by exact string equality. The [`Denylist`]
//! removes links whose host is a search engine, ad network, or tracker.

use std::collections::HashSet;
use url::Url;

/// Normalise a raw link into a candidate URL.
///
/// Accepts only absolute `http`/`https` URLs with a host. The URL is
/// re-serialised by [`Url`], which lowercases scheme and host, drops default
/// ports and adds the root path (`https://a.com` becomes `https://a.com/`).
/// Path, query and fragment are otherwise left alone.
///
/// Returns `None` for empty, relative, or non-web links.
///
/// # Examples
///
/// ```
/// use sift_search::aggregate::url_filter::normalize_candidate;
///
/// assert_eq!(
///     normalize_candidate(" HTTPS://Example.COM:443/a?b=1 ").as_deref(),
///     Some("https://example.com/a?b=1")
/// );
/// assert_eq!(normalize_candidate("/relative/path"), None);
/// assert_eq!(normalize_candidate("mailto:someone@example.com"), None);
/// ```
pub fn normalize_candidate(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = Url::parse(trimmed).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    parsed.host_str().filter(|h| !h.is_empty())?;
    Some(parsed.into())
}

/// Normalise a sequence of raw links, dropping invalid and repeated entries.
///
/// Order of first appearance is preserved.
pub fn unique_candidates<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    raw.into_iter()
        .filter_map(|link| normalize_candidate(link.as_ref()))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Set of hosts whose links are never returned to callers.
///
/// A URL is blocked when its host equals a listed host or is a subdomain of
/// one. URLs whose host cannot be determined are blocked as well.
#[derive(Debug, Clone, Default)]
pub struct Denylist {
    hosts: Vec<String>,
}

impl Denylist {
    /// Build a denylist from host names. Entries are lowercased and trimmed;
    /// a leading `.` is ignored.
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hosts = hosts
            .into_iter()
            .map(|h| h.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|h| !h.is_empty())
            .collect();
        Self { hosts }
    }

    /// Returns `true` if `url` must not be returned as a candidate.
    pub fn is_blocked(&self, url: &str) -> bool {
        let Some(host) = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_lowercase))
        else {
            return true;
        };
        self.hosts.iter().any(|blocked| {
            host == *blocked
                || host
                    .strip_suffix(blocked.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}
