//! Orchestrator tests: batching, the extraction budget, tallies, the stop
//! signal, relevance scoring, and render session teardown.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sift::{
    ExtractionOutcome, FixedQueries, Orchestrator, RelevanceCheck, Tier, UrlExtractor,
};
use sift_search::{Aggregator, Denylist, Provider, ProviderClient, SearchError};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::{BrowserCounters, ScriptedLauncher, fast_config, long_page};

/// Provider answering from a fixed query → URLs table.
struct TableProvider {
    table: HashMap<String, Vec<String>>,
}

#[async_trait]
impl ProviderClient for TableProvider {
    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError> {
        Ok(self.table.get(query).cloned().unwrap_or_default())
    }

    fn provider(&self) -> Provider {
        Provider::DuckDuckGo
    }
}

fn aggregator(table: &[(&str, Vec<String>)]) -> Aggregator {
    let table = table
        .iter()
        .map(|(query, urls)| ((*query).to_owned(), urls.clone()))
        .collect();
    Aggregator::new(vec![Arc::new(TableProvider { table })], Denylist::default())
}

fn urls(prefix: &str, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("https://{prefix}.example/{i}"))
        .collect()
}

/// Extractor that sleeps, records peak concurrency and call order, and
/// returns empty text for URLs containing `empty`.
#[derive(Default)]
struct TracingExtractor {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: Mutex<Vec<String>>,
    delay: Duration,
    cancel_on_first: Option<CancellationToken>,
}

impl TracingExtractor {
    fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

#[async_trait]
impl UrlExtractor for TracingExtractor {
    async fn extract(&self, _client: &reqwest::Client, url: &str) -> ExtractionOutcome {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().expect("lock").push(url.to_owned());
        if let Some(token) = &self.cancel_on_first {
            token.cancel();
        }

        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if url.contains("empty") {
            ExtractionOutcome::new(url, Tier::StaticThin, String::new())
        } else if url.contains("fail") {
            ExtractionOutcome::failed(url, "navigation timed out after 10 ms")
        } else {
            ExtractionOutcome::new(url, Tier::Static, format!("content of {url} about P613842"))
        }
    }
}

/// Relevance check that matches on substring and counts calls.
#[derive(Default)]
struct ContainsSubject {
    calls: AtomicUsize,
}

#[async_trait]
impl RelevanceCheck for ContainsSubject {
    async fn is_relevant(&self, text: &str, subject: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        text.contains(subject)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Concurrency and batching
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn extractions_never_exceed_the_budget() {
    let mut config = fast_config();
    config.orchestrator.max_concurrent_extractions = 2;
    config.orchestrator.query_batch_width = 4;

    let extractor = Arc::new(TracingExtractor::with_delay(Duration::from_millis(20)));
    let orchestrator = Orchestrator::new(config)
        .expect("valid config")
        .with_aggregator(aggregator(&[
            ("q1", urls("one", 5)),
            ("q2", urls("two", 5)),
            ("q3", urls("three", 5)),
        ]))
        .with_extractor(Arc::clone(&extractor) as Arc<dyn UrlExtractor>);

    let queries = vec!["q1".to_owned(), "q2".to_owned(), "q3".to_owned()];
    let report = orchestrator.run(&queries).await.expect("run succeeds");

    let peak = extractor.peak.load(Ordering::SeqCst);
    assert!(peak <= 2, "peak in-flight extractions was {peak}");
    assert!(peak >= 1);
    assert_eq!(report.totals.checked, 15);
    assert_eq!(report.totals.extracted_ok, 15);
    assert_eq!(report.queries.len(), 3);
    assert_eq!(
        report.queries.iter().map(|q| q.query.as_str()).collect::<Vec<_>>(),
        ["q1", "q2", "q3"]
    );
}

#[tokio::test]
async fn batches_run_one_after_another() {
    let mut config = fast_config();
    config.orchestrator.query_batch_width = 1;

    let extractor = Arc::new(TracingExtractor::with_delay(Duration::from_millis(5)));
    let orchestrator = Orchestrator::new(config)
        .expect("valid config")
        .with_aggregator(aggregator(&[("first", urls("a", 3)), ("second", urls("b", 3))]))
        .with_extractor(Arc::clone(&extractor) as Arc<dyn UrlExtractor>);

    let queries = vec!["first".to_owned(), "second".to_owned()];
    orchestrator.run(&queries).await.expect("run succeeds");

    let calls = extractor.calls.lock().expect("lock").clone();
    assert_eq!(calls.len(), 6);
    assert!(calls[..3].iter().all(|url| url.contains("a.example")));
    assert!(calls[3..].iter().all(|url| url.contains("b.example")));
}

#[tokio::test]
async fn queries_without_candidates_report_zero_tallies() {
    let orchestrator = Orchestrator::new(fast_config())
        .expect("valid config")
        .with_aggregator(aggregator(&[]))
        .with_extractor(Arc::new(TracingExtractor::default()));

    let report = orchestrator
        .run(&["nothing here".to_owned()])
        .await
        .expect("run succeeds");

    assert_eq!(report.queries.len(), 1);
    assert!(report.queries[0].urls.is_empty());
    assert!(report.queries[0].outcomes.is_empty());
    assert_eq!(report.totals, sift::Tally::default());
}

#[tokio::test]
async fn tallies_count_checked_ok_and_errors() {
    let extractor = Arc::new(TracingExtractor::default());
    let orchestrator = Orchestrator::new(fast_config())
        .expect("valid config")
        .with_aggregator(aggregator(&[(
            "mixed",
            vec![
                "https://good.example/".to_owned(),
                "https://empty.example/".to_owned(),
                "https://fail.example/".to_owned(),
            ],
        )]))
        .with_extractor(extractor);

    let report = orchestrator.run(&["mixed".to_owned()]).await.expect("run succeeds");
    let query = &report.queries[0];

    assert_eq!(query.tally.checked, 3);
    assert_eq!(query.tally.extracted_ok, 1);
    assert_eq!(query.tally.relevant, 0);
    assert_eq!(query.outcomes.len(), 3);
    assert!(query.outcomes.iter().any(|o| o.tier == Tier::Error));
}

// ────────────────────────────────────────────────────────────────────────────
// Stop signal
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn stop_before_run_skips_every_batch() {
    let extractor = Arc::new(TracingExtractor::default());
    let orchestrator = Orchestrator::new(fast_config())
        .expect("valid config")
        .with_aggregator(aggregator(&[("q", urls("a", 2))]))
        .with_extractor(Arc::clone(&extractor) as Arc<dyn UrlExtractor>);

    orchestrator.stop_token().cancel();
    let report = orchestrator.run(&["q".to_owned()]).await.expect("run succeeds");

    assert!(report.stopped_early);
    assert!(report.queries.is_empty());
    assert!(extractor.calls.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn stop_during_batch_lets_it_finish_and_skips_the_rest() {
    let mut config = fast_config();
    config.orchestrator.query_batch_width = 1;

    let base = Orchestrator::new(config).expect("valid config");
    let extractor = Arc::new(TracingExtractor {
        delay: Duration::from_millis(5),
        cancel_on_first: Some(base.stop_token()),
        ..TracingExtractor::default()
    });
    let orchestrator = base
        .with_aggregator(aggregator(&[("first", urls("a", 3)), ("second", urls("b", 3))]))
        .with_extractor(Arc::clone(&extractor) as Arc<dyn UrlExtractor>);

    let report = orchestrator
        .run(&["first".to_owned(), "second".to_owned()])
        .await
        .expect("run succeeds");

    assert!(report.stopped_early);
    assert_eq!(report.queries.len(), 1);
    assert_eq!(report.queries[0].outcomes.len(), 3);
    assert_eq!(report.totals.checked, 3);
}

// ────────────────────────────────────────────────────────────────────────────
// Relevance
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn run_subject_scores_successful_outcomes_only() {
    let check = Arc::new(ContainsSubject::default());
    let orchestrator = Orchestrator::new(fast_config())
        .expect("valid config")
        .with_aggregator(aggregator(&[(
            "P613842 datasheet",
            vec![
                "https://good.example/".to_owned(),
                "https://empty.example/".to_owned(),
                "https://fail.example/".to_owned(),
            ],
        )]))
        .with_extractor(Arc::new(TracingExtractor::default()))
        .with_relevance(Arc::clone(&check) as Arc<dyn RelevanceCheck>);

    let planner = FixedQueries(vec!["P613842 datasheet".to_owned()]);
    let report = orchestrator
        .run_subject(&planner, "P613842")
        .await
        .expect("run succeeds");

    assert_eq!(report.totals.relevant, 1);
    assert_eq!(check.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn run_without_subject_never_scores() {
    let check = Arc::new(ContainsSubject::default());
    let orchestrator = Orchestrator::new(fast_config())
        .expect("valid config")
        .with_aggregator(aggregator(&[("q", urls("a", 2))]))
        .with_extractor(Arc::new(TracingExtractor::default()))
        .with_relevance(Arc::clone(&check) as Arc<dyn RelevanceCheck>);

    let report = orchestrator.run(&["q".to_owned()]).await.expect("run succeeds");
    assert_eq!(report.totals.relevant, 0);
    assert_eq!(check.calls.load(Ordering::SeqCst), 0);
}

// ────────────────────────────────────────────────────────────────────────────
// Render session lifecycle
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn render_session_is_shut_down_after_run() {
    let mut config = fast_config();
    config.render.enabled = true;

    let (session, counters) = ScriptedLauncher::new("<p>x</p>", Duration::ZERO).into_session();
    session.browser().await.expect("launch");

    let orchestrator = Orchestrator::new(config)
        .expect("valid config")
        .with_render_session(Arc::clone(&session))
        .with_aggregator(aggregator(&[]))
        .with_extractor(Arc::new(TracingExtractor::default()));

    orchestrator.run(&["q".to_owned()]).await.expect("run succeeds");

    assert_eq!(BrowserCounters::get(&counters.shutdowns), 1);
    assert!(!session.is_running().await);
}

// ────────────────────────────────────────────────────────────────────────────
// End to end over HTTP
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn end_to_end_with_real_pipeline() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/good"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(long_page()),
        )
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&site)
        .await;

    let good = format!("{}/good", site.uri());
    let down = format!("{}/down", site.uri());
    let orchestrator = Orchestrator::new(fast_config())
        .expect("valid config")
        .with_aggregator(aggregator(&[("sensor", vec![good.clone(), down.clone()])]));

    let report = orchestrator.run(&["sensor".to_owned()]).await.expect("run succeeds");
    let query = &report.queries[0];

    assert_eq!(query.urls, vec![good.clone(), down.clone()]);
    assert_eq!(query.tally.checked, 2);
    assert_eq!(query.tally.extracted_ok, 1);

    let by_url: HashMap<&str, &ExtractionOutcome> =
        query.outcomes.iter().map(|o| (o.url.as_str(), o)).collect();
    assert_eq!(by_url[good.as_str()].tier, Tier::Static);
    assert_eq!(by_url[down.as_str()].tier, Tier::StaticThin);
    assert!(by_url[down.as_str()].text.is_empty());
}
