//! Configuration types for discovery and extraction runs.

use serde::{Deserialize, Serialize};
use sift_search::SearchConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, SiftError};

/// Top-level configuration for a sift run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiftConfig {
    /// Candidate discovery settings (providers, cap, denylist, credentials).
    pub search: SearchConfig,
    /// Static fetch tier settings.
    pub fetch: FetchConfig,
    /// Text length thresholds that decide tier acceptance.
    pub thresholds: ThresholdConfig,
    /// Readability proxy tier settings.
    pub proxy: ProxyConfig,
    /// Headless render tier settings.
    pub render: RenderConfig,
    /// Main-text extraction settings.
    pub content: ContentConfig,
    /// Batching and concurrency limits.
    pub orchestrator: OrchestratorConfig,
}

/// Static fetch tier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Total number of GET attempts per URL.
    pub static_attempts: u32,
    /// Per-request timeout in milliseconds.
    pub static_timeout_ms: u64,
    /// Backoff unit in milliseconds. Before retry `n` the fetcher sleeps
    /// `n * backoff_ms`.
    pub backoff_ms: u64,
    /// Custom User-Agent for page fetches (None = rotate).
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            static_attempts: 2,
            static_timeout_ms: 10_000,
            backoff_ms: 200,
            user_agent: None,
        }
    }
}

impl FetchConfig {
    /// Per-request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.static_timeout_ms)
    }
}

/// Minimum extracted text lengths, counted in chars.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Text length at which the static tier is accepted.
    pub min_text_len: usize,
    /// Text length at which the proxy tier is accepted.
    ///
    /// When unset the floor is `min(200, min_text_len / 2)`.
    pub proxy_min_text_len: Option<usize>,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            min_text_len: 450,
            proxy_min_text_len: None,
        }
    }
}

impl ThresholdConfig {
    /// Effective acceptance floor for the proxy tier.
    pub fn proxy_floor(&self) -> usize {
        self.proxy_min_text_len
            .unwrap_or_else(|| (self.min_text_len / 2).min(200))
    }
}

/// Readability proxy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Whether the proxy tier runs at all.
    pub enabled: bool,
    /// Prefix the plain-scheme target URL is appended to.
    pub prefix: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// A trimmed response body must be longer than this to count.
    pub min_body_len: usize,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: "https://r.jina.ai/".to_owned(),
            timeout_ms: 10_000,
            min_body_len: 50,
        }
    }
}

/// Headless browser render configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Whether the render tier runs. Off by default because it needs a
    /// local Chromium.
    pub enabled: bool,
    /// Navigation plus DOM-ready budget in milliseconds.
    pub navigation_timeout_ms: u64,
    /// Fixed wait after DOM-ready for scripts to populate the page.
    pub settle_ms: u64,
    /// Browser executable. None lets chromiumoxide search the usual paths.
    pub chrome_executable: Option<PathBuf>,
    /// Viewport width in pixels.
    pub window_width: u32,
    /// Viewport height in pixels.
    pub window_height: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            navigation_timeout_ms: 10_000,
            settle_ms: 2_500,
            chrome_executable: None,
            window_width: 1280,
            window_height: 800,
        }
    }
}

/// Content extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Maximum chars of text kept per page.
    pub max_chars: usize,
    /// Maximum number of PDF pages read.
    pub pdf_max_pages: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            max_chars: 100_000,
            pdf_max_pages: 10,
        }
    }
}

/// Batching and concurrency configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Number of queries aggregated together in one batch.
    pub query_batch_width: usize,
    /// Run-wide cap on concurrent URL extractions.
    pub max_concurrent_extractions: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            query_batch_width: 4,
            max_concurrent_extractions: 10,
        }
    }
}

impl SiftConfig {
    /// Check that every section holds usable values.
    ///
    /// # Errors
    ///
    /// Returns [`SiftError::Config`] naming the first offending field, or the
    /// search section's own validation error.
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        if self.fetch.static_attempts == 0 {
            return Err(SiftError::Config(
                "fetch.static_attempts must be greater than 0".into(),
            ));
        }
        if self.fetch.static_timeout_ms == 0 {
            return Err(SiftError::Config(
                "fetch.static_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.proxy.enabled && self.proxy.prefix.trim().is_empty() {
            return Err(SiftError::Config(
                "proxy.prefix must not be empty when the proxy is enabled".into(),
            ));
        }
        if self.render.enabled && self.render.navigation_timeout_ms == 0 {
            return Err(SiftError::Config(
                "render.navigation_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.content.max_chars == 0 {
            return Err(SiftError::Config(
                "content.max_chars must be greater than 0".into(),
            ));
        }
        if self.orchestrator.query_batch_width == 0 {
            return Err(SiftError::Config(
                "orchestrator.query_batch_width must be greater than 0".into(),
            ));
        }
        if self.orchestrator.max_concurrent_extractions == 0 {
            return Err(SiftError::Config(
                "orchestrator.max_concurrent_extractions must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Overlay provider credentials from `SEARXNG_URL`, `BRAVE_API_KEY` and
    /// `SERPAPI_API_KEY`.
    pub fn apply_env(&mut self) {
        self.search.apply_env();
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| SiftError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| SiftError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/sift/config.toml`.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp/sift-config"))
            .join("sift")
            .join("config.toml")
    }
}
