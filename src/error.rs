//! Error types for the sift pipeline.

/// Top-level error type for discovery and extraction.
///
/// Most of these never reach a caller of the orchestrator: fetch and render
/// failures are folded into an [`ExtractionOutcome`](crate::ExtractionOutcome)
/// by the pipeline. They are still typed so each tier can be tested on its
/// own.
#[derive(Debug, thiserror::Error)]
pub enum SiftError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Request could not be sent or the body could not be read.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A fetch answered with a status the tier does not accept.
    #[error("unexpected status {0}")]
    Status(u16),

    /// A fetch succeeded but its payload is unusable.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Headless rendering failed.
    #[error("render error: {0}")]
    Render(#[from] crate::fetch::render::RenderError),

    /// Candidate discovery error.
    #[error("search error: {0}")]
    Search(#[from] sift_search::SearchError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, SiftError>;
