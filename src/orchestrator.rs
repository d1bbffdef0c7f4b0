//! Batched, bounded discovery-and-extraction runs.
//!
//! Queries are processed in batches of `orchestrator.query_batch_width`. A
//! batch runs to completion before the next starts and gets its own HTTP
//! client. Inside a batch every query aggregates concurrently and every
//! candidate URL is extracted concurrently, with a single run-wide semaphore
//! capping how many extractions are in flight.

use std::ops::AddAssign;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use sift_search::Aggregator;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::config::SiftConfig;
use crate::error::{Result, SiftError};
use crate::fetch::RenderSession;
use crate::pipeline::{ExtractionOutcome, ExtractionPipeline, UrlExtractor};

/// Decides whether extracted text is about the subject of the run.
#[async_trait]
pub trait RelevanceCheck: Send + Sync {
    /// Returns `true` if `text` looks relevant to `subject`.
    async fn is_relevant(&self, text: &str, subject: &str) -> bool;
}

/// Turns a subject into search queries.
pub trait QueryPlanner: Send + Sync {
    /// Queries to run for `subject`, in order.
    fn plan(&self, subject: &str) -> Vec<String>;
}

/// A planner that ignores the subject and returns a fixed list.
#[derive(Debug, Clone, Default)]
pub struct FixedQueries(pub Vec<String>);

impl QueryPlanner for FixedQueries {
    fn plan(&self, _subject: &str) -> Vec<String> {
        self.0.clone()
    }
}

/// Per-query or per-run counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    /// URLs an extraction was started for.
    pub checked: usize,
    /// Non-error outcomes with non-empty text.
    pub extracted_ok: usize,
    /// Outcomes the relevance check accepted.
    pub relevant: usize,
}

impl AddAssign for Tally {
    fn add_assign(&mut self, other: Self) {
        self.checked += other.checked;
        self.extracted_ok += other.extracted_ok;
        self.relevant += other.relevant;
    }
}

/// Everything produced for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryReport {
    /// The query as run.
    pub query: String,
    /// Candidate URLs in aggregation order.
    pub urls: Vec<String>,
    /// One outcome per URL, in completion order.
    pub outcomes: Vec<ExtractionOutcome>,
    /// Counters for this query.
    pub tally: Tally,
}

/// Everything produced for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    /// Reports for the queries that ran, in query order.
    pub queries: Vec<QueryReport>,
    /// Sum of every query's tally.
    pub totals: Tally,
    /// `true` if the stop signal skipped at least one batch.
    pub stopped_early: bool,
}

/// Drives discovery and extraction for a list of queries.
pub struct Orchestrator {
    config: SiftConfig,
    aggregator: Aggregator,
    extractor: Arc<dyn UrlExtractor>,
    render_session: Option<Arc<RenderSession>>,
    relevance: Option<Arc<dyn RelevanceCheck>>,
    stop: CancellationToken,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("providers", &self.aggregator.providers())
            .field("render", &self.render_session.is_some())
            .field("relevance", &self.relevance.is_some())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Build an orchestrator with the providers and tiers `config` enables.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Config`] or [`SiftError::Search`] if the
    /// configuration is invalid.
    pub fn new(config: SiftConfig) -> Result<Self> {
        config.validate()?;
        let render_session = config.render.enabled.then(|| {
            Arc::new(RenderSession::chromium(
                &config.render,
                config.fetch.user_agent.clone(),
            ))
        });
        let extractor: Arc<dyn UrlExtractor> = Arc::new(ExtractionPipeline::new(
            &config,
            render_session.clone(),
        ));
        Ok(Self {
            aggregator: Aggregator::from_config(&config.search),
            extractor,
            render_session,
            relevance: None,
            stop: CancellationToken::new(),
            config,
        })
    }

    /// Replace the candidate aggregator.
    pub fn with_aggregator(mut self, aggregator: Aggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    /// Use `session` for the render tier and rebuild the tier chain around it.
    pub fn with_render_session(mut self, session: Arc<RenderSession>) -> Self {
        self.extractor = Arc::new(ExtractionPipeline::new(&self.config, Some(Arc::clone(&session))));
        self.render_session = Some(session);
        self
    }

    /// Replace the per-URL extractor.
    pub fn with_extractor(mut self, extractor: Arc<dyn UrlExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Score extracted text with `check`.
    pub fn with_relevance(mut self, check: Arc<dyn RelevanceCheck>) -> Self {
        self.relevance = Some(check);
        self
    }

    /// Token that stops the run before the next batch when cancelled.
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// The configuration this orchestrator runs with.
    pub fn config(&self) -> &SiftConfig {
        &self.config
    }

    /// Run every query. Relevance is not checked without a subject.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Search`] if an HTTP client cannot be built.
    /// Provider and URL failures never fail the run.
    pub async fn run(&self, queries: &[String]) -> Result<RunReport> {
        self.run_inner(queries, None).await
    }

    /// Plan queries for `subject`, run them, and check relevance against it.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub async fn run_subject(&self, planner: &dyn QueryPlanner, subject: &str) -> Result<RunReport> {
        let queries = planner.plan(subject);
        self.run_inner(&queries, Some(subject)).await
    }

    async fn run_inner(&self, queries: &[String], subject: Option<&str>) -> Result<RunReport> {
        let permits = Semaphore::new(self.config.orchestrator.max_concurrent_extractions);
        let width = self.config.orchestrator.query_batch_width.max(1);
        let mut report = RunReport::default();

        let outcome = self.run_batches(queries, subject, width, &permits, &mut report).await;

        if self.config.render.enabled {
            if let Some(session) = &self.render_session {
                if let Err(e) = session.shutdown().await {
                    tracing::warn!(error = %e, "render session shutdown failed");
                }
            }
        }

        outcome?;
        tracing::info!(
            queries = report.queries.len(),
            checked = report.totals.checked,
            extracted_ok = report.totals.extracted_ok,
            relevant = report.totals.relevant,
            stopped_early = report.stopped_early,
            "run finished"
        );
        Ok(report)
    }

    async fn run_batches(
        &self,
        queries: &[String],
        subject: Option<&str>,
        width: usize,
        permits: &Semaphore,
        report: &mut RunReport,
    ) -> Result<()> {
        for (index, batch) in queries.chunks(width).enumerate() {
            if self.stop.is_cancelled() {
                tracing::info!(batch = index, "stop requested, skipping remaining batches");
                report.stopped_early = true;
                break;
            }
            tracing::info!(batch = index, queries = batch.len(), "starting batch");

            let client = sift_search::http::build_client(
                self.config.fetch.timeout(),
                self.config.fetch.user_agent.as_deref(),
            )?;

            let reports = join_all(
                batch
                    .iter()
                    .map(|query| self.process_query(&client, query, subject, permits)),
            )
            .await;

            for query_report in reports {
                report.totals += query_report.tally;
                report.queries.push(query_report);
            }
        }
        Ok(())
    }

    async fn process_query(
        &self,
        client: &reqwest::Client,
        query: &str,
        subject: Option<&str>,
        permits: &Semaphore,
    ) -> QueryReport {
        tracing::trace!(query, "aggregating candidates");
        let result = self
            .aggregator
            .aggregate(query, self.config.search.max_per_query)
            .await;
        if result.is_empty() {
            tracing::info!("no candidate URLs for query");
        }

        let mut tally = Tally::default();
        let mut outcomes = Vec::with_capacity(result.urls.len());
        let mut in_flight: FuturesUnordered<_> = result
            .urls
            .iter()
            .map(|url| self.extract_one(client, url, subject, permits))
            .collect();

        while let Some((outcome, relevant)) = in_flight.next().await {
            tally.checked += 1;
            if outcome.is_success() {
                tally.extracted_ok += 1;
            }
            if relevant {
                tally.relevant += 1;
            }
            outcomes.push(outcome);
        }
        drop(in_flight);

        tracing::debug!(
            urls = result.urls.len(),
            extracted_ok = tally.extracted_ok,
            relevant = tally.relevant,
            "query finished"
        );
        QueryReport {
            query: result.query,
            urls: result.urls,
            outcomes,
            tally,
        }
    }

    async fn extract_one(
        &self,
        client: &reqwest::Client,
        url: &str,
        subject: Option<&str>,
        permits: &Semaphore,
    ) -> (ExtractionOutcome, bool) {
        // The semaphore is never closed, so acquisition only waits.
        let _permit = permits.acquire().await.ok();
        let outcome = self.extractor.extract(client, url).await;
        tracing::debug!(%url, tier = %outcome.tier, chars = outcome.text_len(), "extracted");

        let relevant = match (&self.relevance, subject) {
            (Some(check), Some(subject)) if outcome.is_success() => {
                check.is_relevant(&outcome.text, subject).await
            }
            _ => false,
        };
        (outcome, relevant)
    }
}
