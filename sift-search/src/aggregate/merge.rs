//! Deterministic merge of per-provider candidate lists.
//!
//! Provider batches are concatenated in priority order, blocked hosts and
//! repeated URLs are dropped, and the result is truncated to the cap. The
//! merge only runs after every provider has finished, so the output never
//! depends on which provider answered first.

use std::collections::HashSet;

use super::url_filter::Denylist;

/// Merge provider batches into one capped, deduplicated URL list.
///
/// `batches` must already be in provider priority order. Within a batch the
/// provider's own order is kept. A URL seen in an earlier batch keeps its
/// earlier position. URLs are compared by exact string equality.
pub fn merge_ranked<I>(batches: I, denylist: &Denylist, cap: usize) -> Vec<String>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::new();

    for batch in batches {
        for url in batch {
            if merged.len() >= cap {
                return merged;
            }
            if denylist.is_blocked(&url) || !seen.insert(url.clone()) {
                continue;
            }
            merged.push(url);
        }
    }

    merged
}
