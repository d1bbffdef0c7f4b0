//! Sift: resilient web discovery with tiered content extraction.
//!
//! Given a list of search queries, sift finds candidate pages through several
//! independent search providers and pulls readable text out of each page,
//! degrading gracefully when a page resists plain fetching.
//!
//! # Architecture
//!
//! - **Discovery** ([`sift_search`]): providers run concurrently, their links
//!   are merged in a fixed priority order, filtered and capped
//! - **Extraction** ([`pipeline`]): static GET, then a readability proxy,
//!   then a headless browser, stopping at the first tier with enough text
//! - **Content** ([`content`], [`pdf`]): boilerplate stripping and main-text
//!   selection for HTML, page text for PDFs, off the async runtime
//! - **Orchestration** ([`orchestrator`]): query batches, a run-wide
//!   extraction budget, per-query tallies, and a cooperative stop signal

pub mod config;
pub mod content;
pub mod error;
pub mod fetch;
pub mod orchestrator;
pub mod pdf;
pub mod pipeline;

pub use config::SiftConfig;
pub use content::ContentExtractor;
pub use error::{Result, SiftError};
pub use fetch::RenderSession;
pub use orchestrator::{
    FixedQueries, Orchestrator, QueryPlanner, QueryReport, RelevanceCheck, RunReport, Tally,
};
pub use pipeline::{ExtractionOutcome, ExtractionPipeline, Tier, UrlExtractor};
