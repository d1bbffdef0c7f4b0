//! Tier selection tests for the extraction pipeline.
//!
//! Pages are served by wiremock; the proxy is a second wiremock server and
//! the render tier uses the scripted in-memory browser from `helpers`.

use std::time::Duration;

use sift::{ExtractionPipeline, Tier};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::{BrowserCounters, ScriptedLauncher, fast_config, long_page, thin_page};

async fn serve(server: &MockServer, route: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .mount(server)
        .await;
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body)
}

// ────────────────────────────────────────────────────────────────────────────
// Static tier
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn static_success_short_circuits_proxy_and_render() {
    let site = MockServer::start().await;
    serve(&site, "/product", html(long_page())).await;

    let proxy = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(500)))
        .expect(0)
        .mount(&proxy)
        .await;

    let (session, counters) = ScriptedLauncher::new("<p>rendered</p>", Duration::ZERO).into_session();

    let mut config = fast_config();
    config.proxy.enabled = true;
    config.proxy.prefix = format!("{}/", proxy.uri());
    config.render.enabled = true;
    let pipeline = ExtractionPipeline::new(&config, Some(session));

    let url = format!("{}/product", site.uri());
    let outcome = pipeline.extract(&reqwest::Client::new(), &url).await;

    assert_eq!(outcome.tier, Tier::Static);
    assert!(outcome.text_len() >= config.thresholds.min_text_len);
    assert!(outcome.text.contains("switching distance"));
    assert!(!outcome.text.contains("Home | Products"));
    assert_eq!(outcome.url, url);
    assert_eq!(BrowserCounters::get(&counters.launches), 0);
}

#[tokio::test]
async fn static_failures_without_fallbacks_are_thin_and_empty() {
    let site = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&site)
        .await;

    let pipeline = ExtractionPipeline::new(&fast_config(), None);
    let outcome = pipeline
        .extract(&reqwest::Client::new(), &format!("{}/broken", site.uri()))
        .await;

    assert_eq!(outcome.tier, Tier::StaticThin);
    assert!(outcome.text.is_empty());
    assert!(outcome.error.is_none());
}

#[tokio::test]
async fn unreadable_pdf_degrades_to_empty_text() {
    let site = MockServer::start().await;
    serve(
        &site,
        "/datasheet.pdf",
        ResponseTemplate::new(200)
            .insert_header("content-type", "application/pdf")
            .set_body_bytes(b"%PDF-1.7 this is not really a pdf".to_vec()),
    )
    .await;

    let pipeline = ExtractionPipeline::new(&fast_config(), None);
    let outcome = pipeline
        .extract(&reqwest::Client::new(), &format!("{}/datasheet.pdf", site.uri()))
        .await;

    assert_eq!(outcome.tier, Tier::StaticThin);
    assert!(outcome.text.is_empty());
}

// ────────────────────────────────────────────────────────────────────────────
// Proxy tier
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn thin_static_uses_proxy_text_above_floor() {
    let site = MockServer::start().await;
    serve(&site, "/spa", html(thin_page())).await;

    let proxy = MockServer::start().await;
    let proxied_path = format!("/{}/spa", site.uri());
    let readable = "Title: P613842\n\nMarkdown Content:\n".to_owned()
        + &"Rated operating current 200 mA, supply voltage 10 to 30 V DC. ".repeat(5);
    Mock::given(method("GET"))
        .and(path(proxied_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(readable))
        .expect(1)
        .mount(&proxy)
        .await;

    let mut config = fast_config();
    config.proxy.enabled = true;
    config.proxy.prefix = format!("{}/", proxy.uri());
    let pipeline = ExtractionPipeline::new(&config, None);

    let outcome = pipeline
        .extract(&reqwest::Client::new(), &format!("{}/spa", site.uri()))
        .await;

    assert_eq!(outcome.tier, Tier::Proxy);
    assert!(outcome.text.contains("Rated operating current"));
    assert!(outcome.text_len() >= config.thresholds.proxy_floor());
}

#[tokio::test]
async fn thin_static_and_thin_proxy_keep_static_text() {
    let site = MockServer::start().await;
    serve(&site, "/spa", html(thin_page())).await;

    let proxy = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Short proxy answer that is just over fifty chars long."))
        .expect(1)
        .mount(&proxy)
        .await;

    let mut config = fast_config();
    config.proxy.enabled = true;
    config.proxy.prefix = format!("{}/", proxy.uri());
    let pipeline = ExtractionPipeline::new(&config, None);

    let outcome = pipeline
        .extract(&reqwest::Client::new(), &format!("{}/spa", site.uri()))
        .await;

    assert_eq!(outcome.tier, Tier::StaticThin);
    assert_eq!(outcome.text, "Loading catalogue");
}

#[tokio::test]
async fn proxy_error_status_falls_through() {
    let site = MockServer::start().await;
    serve(&site, "/spa", html(thin_page())).await;

    let proxy = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).set_body_string("x".repeat(400)))
        .expect(1)
        .mount(&proxy)
        .await;

    let mut config = fast_config();
    config.proxy.enabled = true;
    config.proxy.prefix = format!("{}/", proxy.uri());
    let pipeline = ExtractionPipeline::new(&config, None);

    let outcome = pipeline
        .extract(&reqwest::Client::new(), &format!("{}/spa", site.uri()))
        .await;

    assert_eq!(outcome.tier, Tier::StaticThin);
}

// ────────────────────────────────────────────────────────────────────────────
// Render tier
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn thin_static_is_rendered_when_enabled() {
    let site = MockServer::start().await;
    serve(&site, "/spa", html(thin_page())).await;

    let (session, counters) = ScriptedLauncher::new(
        "<html><body><main><p>Hydrated product table</p><p>Stock: 12</p></main></body></html>",
        Duration::ZERO,
    )
    .into_session();

    let mut config = fast_config();
    config.render.enabled = true;
    let pipeline = ExtractionPipeline::new(&config, Some(session));

    let outcome = pipeline
        .extract(&reqwest::Client::new(), &format!("{}/spa", site.uri()))
        .await;

    assert_eq!(outcome.tier, Tier::Render);
    assert_eq!(outcome.text, "Hydrated product table\nStock: 12");
    assert_eq!(BrowserCounters::get(&counters.launches), 1);
    assert_eq!(BrowserCounters::get(&counters.pages_closed), 1);
    assert_eq!(BrowserCounters::get(&counters.blocked_kinds), 4);
}

#[tokio::test]
async fn render_accepts_empty_text() {
    let site = MockServer::start().await;
    serve(&site, "/blank", ResponseTemplate::new(404)).await;

    let (session, _counters) = ScriptedLauncher::new("<html><body></body></html>", Duration::ZERO).into_session();
    let mut config = fast_config();
    config.render.enabled = true;
    let pipeline = ExtractionPipeline::new(&config, Some(session));

    let outcome = pipeline
        .extract(&reqwest::Client::new(), &format!("{}/blank", site.uri()))
        .await;

    assert_eq!(outcome.tier, Tier::Render);
    assert!(outcome.text.is_empty());
    assert!(outcome.error.is_none());
}

#[tokio::test]
async fn render_timeout_is_an_error_outcome_and_page_is_closed() {
    let site = MockServer::start().await;
    serve(&site, "/slow", html(thin_page())).await;

    let (session, counters) = ScriptedLauncher::new("<p>never</p>", Duration::from_secs(10)).into_session();
    let mut config = fast_config();
    config.render.enabled = true;
    config.render.navigation_timeout_ms = 100;
    let pipeline = ExtractionPipeline::new(&config, Some(session));

    let url = format!("{}/slow", site.uri());
    let outcome = pipeline.extract(&reqwest::Client::new(), &url).await;

    assert_eq!(outcome.tier, Tier::Error);
    assert!(outcome.text.is_empty());
    let message = outcome.error.expect("error message");
    assert!(message.contains("timed out"), "got: {message}");
    assert_eq!(BrowserCounters::get(&counters.pages_opened), 1);
    assert_eq!(BrowserCounters::get(&counters.pages_closed), 1);
}

#[tokio::test]
async fn concurrent_renders_share_one_browser() {
    let site = MockServer::start().await;
    serve(&site, "/spa", html(thin_page())).await;

    let (session, counters) =
        ScriptedLauncher::new("<p>rendered</p>", Duration::from_millis(20)).into_session();
    let mut config = fast_config();
    config.render.enabled = true;
    let pipeline = ExtractionPipeline::new(&config, Some(session));
    let client = reqwest::Client::new();
    let url = format!("{}/spa", site.uri());

    let outcomes = futures_util::future::join_all((0..6).map(|_| pipeline.extract(&client, &url))).await;

    assert!(outcomes.iter().all(|o| o.tier == Tier::Render));
    assert_eq!(BrowserCounters::get(&counters.launches), 1);
    assert_eq!(BrowserCounters::get(&counters.pages_opened), 6);
    assert_eq!(BrowserCounters::get(&counters.pages_closed), 6);
}
