//! Headless render tier.
//!
//! The browser sits behind three small traits so the tier can be driven by
//! a real Chromium ([`super::chromium`]) or by a test double:
//!
//! - [`BrowserLauncher`] starts a browser process
//! - [`RenderBrowser`] opens pages and shuts the process down
//! - [`RenderPage`] navigates, returns the rendered HTML, and closes
//!
//! [`RenderSession`] owns at most one browser per run. It launches lazily on
//! first use behind an async mutex, so concurrent first callers share one
//! launch; pages opened afterwards render concurrently.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::config::RenderConfig;

/// Render tier failures. Each becomes an `error` outcome for its URL.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RenderError {
    /// The browser could not be started.
    #[error("browser launch failed: {0}")]
    Launch(String),

    /// A page could not be opened or prepared.
    #[error("page setup failed: {0}")]
    Page(String),

    /// Navigation failed before the document was ready.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Navigation plus DOM-ready exceeded the budget.
    #[error("navigation timed out after {0} ms")]
    Timeout(u64),

    /// Rendered HTML could not be read back.
    #[error("content read failed: {0}")]
    Content(String),

    /// The session was already shut down.
    #[error("browser session is closed")]
    Closed,
}

/// Request categories dropped while rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Raster and vector images.
    Image,
    /// Audio and video.
    Media,
    /// Web fonts.
    Font,
    /// CSS.
    Stylesheet,
}

/// Heavy resources that do not affect page text.
pub const BLOCKED_RESOURCES: &[ResourceKind] = &[
    ResourceKind::Image,
    ResourceKind::Media,
    ResourceKind::Font,
    ResourceKind::Stylesheet,
];

/// One browser tab.
#[async_trait]
pub trait RenderPage: Send {
    /// Fail every subsequent request of the given kinds.
    async fn block_resources(&mut self, kinds: &[ResourceKind]) -> Result<(), RenderError>;

    /// Navigate to `url` and return once the DOM is ready.
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError>;

    /// Serialized HTML of the current document.
    async fn html(&mut self) -> Result<String, RenderError>;

    /// Close the tab. Must be safe to call after any earlier failure.
    async fn close(&mut self) -> Result<(), RenderError>;
}

/// A running browser shared by every render in a run.
#[async_trait]
pub trait RenderBrowser: Send + Sync {
    /// Open a fresh blank page.
    async fn open_page(&self) -> Result<Box<dyn RenderPage>, RenderError>;

    /// Stop the browser process.
    async fn shutdown(&self) -> Result<(), RenderError>;
}

/// Starts a browser.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Launch a new browser process.
    async fn launch(&self) -> Result<Arc<dyn RenderBrowser>, RenderError>;
}

/// Lazily launched, run-scoped browser handle.
pub struct RenderSession {
    launcher: Box<dyn BrowserLauncher>,
    browser: Mutex<Option<Arc<dyn RenderBrowser>>>,
}

impl std::fmt::Debug for RenderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderSession").finish_non_exhaustive()
    }
}

impl RenderSession {
    /// Create a session that launches through `launcher` on first use.
    pub fn new(launcher: impl BrowserLauncher + 'static) -> Self {
        Self {
            launcher: Box::new(launcher),
            browser: Mutex::new(None),
        }
    }

    /// Create a session backed by a local headless Chromium.
    pub fn chromium(config: &RenderConfig, user_agent: Option<String>) -> Self {
        Self::new(super::chromium::ChromiumLauncher::new(config, user_agent))
    }

    /// The shared browser, launching it if this is the first call.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Launch`] if the browser cannot be started. The
    /// next call tries again.
    pub async fn browser(&self) -> Result<Arc<dyn RenderBrowser>, RenderError> {
        let mut guard = self.browser.lock().await;
        if let Some(browser) = guard.as_ref() {
            return Ok(Arc::clone(browser));
        }
        tracing::info!("launching headless browser");
        let browser = self.launcher.launch().await?;
        *guard = Some(Arc::clone(&browser));
        Ok(browser)
    }

    /// Returns `true` if a browser has been launched and not shut down.
    pub async fn is_running(&self) -> bool {
        self.browser.lock().await.is_some()
    }

    /// Shut the browser down if one is running. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns the browser's shutdown error. The session is cleared either way.
    pub async fn shutdown(&self) -> Result<(), RenderError> {
        let browser = self.browser.lock().await.take();
        match browser {
            Some(browser) => {
                tracing::info!("shutting down headless browser");
                browser.shutdown().await
            }
            None => Ok(()),
        }
    }
}

/// Third extraction tier: render the page in the shared browser.
#[derive(Debug, Clone)]
pub struct RenderFetcher {
    session: Arc<RenderSession>,
    navigation_timeout: Duration,
    settle: Duration,
}

impl RenderFetcher {
    /// Build a fetcher that renders through `session`.
    pub fn new(session: Arc<RenderSession>, config: &RenderConfig) -> Self {
        Self {
            session,
            navigation_timeout: Duration::from_millis(config.navigation_timeout_ms),
            settle: Duration::from_millis(config.settle_ms),
        }
    }

    /// Render `url` and return the resulting HTML.
    ///
    /// The page is closed before returning, on success and on failure.
    ///
    /// # Errors
    ///
    /// Any [`RenderError`] from launching, navigating, or reading the page.
    pub async fn fetch(&self, url: &str) -> Result<String, RenderError> {
        let browser = self.session.browser().await?;
        let mut page = browser.open_page().await?;
        let result = self.render_on(page.as_mut(), url).await;
        if let Err(e) = page.close().await {
            tracing::debug!(%url, error = %e, "failed to close render page");
        }
        result
    }

    async fn render_on(&self, page: &mut dyn RenderPage, url: &str) -> Result<String, RenderError> {
        page.block_resources(BLOCKED_RESOURCES).await?;

        match tokio::time::timeout(self.navigation_timeout, page.navigate(url)).await {
            Ok(navigated) => navigated?,
            Err(_) => {
                let millis = u64::try_from(self.navigation_timeout.as_millis()).unwrap_or(u64::MAX);
                return Err(RenderError::Timeout(millis));
            }
        }

        tokio::time::sleep(self.settle).await;
        page.html().await
    }
}
