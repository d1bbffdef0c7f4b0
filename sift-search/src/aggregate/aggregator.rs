//! Core aggregator: concurrent multi-provider fan-out, then deterministic merge.
//!
//! Queries every configured provider concurrently and waits for all of them,
//! including slow ones, before merging. Failed providers contribute nothing;
//! their reasons are logged and returned from
//! [`Aggregator::aggregate_detailed`].

use std::sync::Arc;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::provider::ProviderClient;
use crate::providers;
use crate::types::{Provider, SearchResult};

use super::merge::merge_ranked;
use super::url_filter::Denylist;

/// What one provider produced for one query.
#[derive(Debug)]
pub struct ProviderReport {
    /// Which provider this report is for.
    pub provider: Provider,
    /// The provider's own URL list, or why it produced none.
    pub outcome: Result<Vec<String>, SearchError>,
}

impl ProviderReport {
    /// URLs returned by the provider; empty when it failed.
    pub fn urls(&self) -> &[String] {
        match &self.outcome {
            Ok(urls) => urls,
            Err(_) => &[],
        }
    }
}

/// Fans a query out to every provider and merges the results.
///
/// Provider order in the aggregator is the merge priority order.
#[derive(Clone)]
pub struct Aggregator {
    providers: Vec<Arc<dyn ProviderClient>>,
    denylist: Denylist,
}

impl Aggregator {
    /// Build an aggregator over explicit provider clients.
    pub fn new(providers: Vec<Arc<dyn ProviderClient>>, denylist: Denylist) -> Self {
        Self {
            providers,
            denylist,
        }
    }

    /// Build the configured providers, in `config.providers` order.
    pub fn from_config(config: &SearchConfig) -> Self {
        let clients = config
            .providers
            .iter()
            .map(|provider| providers::client_for(*provider, config))
            .collect();
        Self::new(clients, Denylist::new(&config.blocked_hosts))
    }

    /// Providers queried by this aggregator, in priority order.
    pub fn providers(&self) -> Vec<Provider> {
        self.providers.iter().map(|p| p.provider()).collect()
    }

    /// Discover up to `cap` candidate URLs for `query`.
    ///
    /// Never fails: when every provider yields nothing, the result is empty.
    pub async fn aggregate(&self, query: &str, cap: usize) -> SearchResult {
        self.aggregate_detailed(query, cap).await.0
    }

    /// Same as [`aggregate`](Self::aggregate), also returning each provider's
    /// raw outcome in priority order.
    ///
    /// # Pipeline
    ///
    /// 1. Fan out to all providers with [`futures::future::join_all`]
    /// 2. Wait for every provider to finish, slow ones included
    /// 3. Log failures (skipped providers at debug, the rest at warn)
    /// 4. Concatenate in priority order, drop blocked hosts and repeats
    /// 5. Truncate to `cap`
    pub async fn aggregate_detailed(
        &self,
        query: &str,
        cap: usize,
    ) -> (SearchResult, Vec<ProviderReport>) {
        tracing::trace!(query, providers = self.providers.len(), "aggregating");

        let futures = self.providers.iter().map(|client| async move {
            ProviderReport {
                provider: client.provider(),
                outcome: client.search(query).await,
            }
        });
        let reports = futures::future::join_all(futures).await;

        for report in &reports {
            match &report.outcome {
                Ok(urls) => {
                    tracing::debug!(provider = %report.provider, count = urls.len(), "provider returned results");
                }
                Err(err) if err.is_not_configured() => {
                    tracing::debug!(provider = %report.provider, "provider skipped: {err}");
                }
                Err(err) => {
                    tracing::warn!(provider = %report.provider, error = %err, "provider query failed");
                }
            }
        }

        let urls = merge_ranked(
            reports.iter().map(|r| r.urls().to_vec()),
            &self.denylist,
            cap,
        );
        tracing::debug!(count = urls.len(), cap, "candidates merged");

        let result = SearchResult {
            query: query.to_owned(),
            urls,
        };
        (result, reports)
    }
}
