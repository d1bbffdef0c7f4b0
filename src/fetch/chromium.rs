//! Headless Chromium backend for the render tier, driven over CDP.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use futures_util::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::render::{BrowserLauncher, RenderBrowser, RenderError, RenderPage, ResourceKind};
use crate::config::RenderConfig;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(50);

impl ResourceKind {
    fn cdp_type(self) -> ResourceType {
        match self {
            Self::Image => ResourceType::Image,
            Self::Media => ResourceType::Media,
            Self::Font => ResourceType::Font,
            Self::Stylesheet => ResourceType::Stylesheet,
        }
    }
}

/// Launches a local headless Chromium.
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    executable: Option<PathBuf>,
    window: (u32, u32),
    user_agent: String,
}

impl ChromiumLauncher {
    /// Build from the render configuration. Without a `user_agent` one is
    /// picked from the rotation list.
    pub fn new(config: &RenderConfig, user_agent: Option<String>) -> Self {
        Self {
            executable: config.chrome_executable.clone(),
            window: (config.window_width, config.window_height),
            user_agent: user_agent
                .unwrap_or_else(|| sift_search::http::random_user_agent().to_owned()),
        }
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Arc<dyn RenderBrowser>, RenderError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg(format!("--user-agent={}", self.user_agent))
            .window_size(self.window.0, self.window.1);
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(RenderError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!(error = %e, "CDP handler error");
                }
            }
        });

        Ok(Arc::new(ChromiumBrowser {
            browser: Mutex::new(Some(browser)),
            handler_task: Mutex::new(Some(handler_task)),
        }))
    }
}

/// A running Chromium process.
pub struct ChromiumBrowser {
    browser: Mutex<Option<Browser>>,
    handler_task: Mutex<Option<JoinHandle<()>>>,
}

#[async_trait]
impl RenderBrowser for ChromiumBrowser {
    async fn open_page(&self) -> Result<Box<dyn RenderPage>, RenderError> {
        let guard = self.browser.lock().await;
        let browser = guard.as_ref().ok_or(RenderError::Closed)?;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Page(e.to_string()))?;
        Ok(Box::new(ChromiumPage {
            page: Some(page),
            interceptor: None,
        }))
    }

    async fn shutdown(&self) -> Result<(), RenderError> {
        let browser = self.browser.lock().await.take();
        let result = match browser {
            Some(mut browser) => browser
                .close()
                .await
                .map(|_| ())
                .map_err(|e| RenderError::Launch(format!("browser close failed: {e}"))),
            None => Ok(()),
        };
        if let Some(task) = self.handler_task.lock().await.take() {
            task.abort();
        }
        result
    }
}

/// One Chromium tab with optional request interception.
pub struct ChromiumPage {
    page: Option<Page>,
    interceptor: Option<JoinHandle<()>>,
}

impl ChromiumPage {
    fn page(&self) -> Result<&Page, RenderError> {
        self.page.as_ref().ok_or(RenderError::Closed)
    }
}

#[async_trait]
impl RenderPage for ChromiumPage {
    async fn block_resources(&mut self, kinds: &[ResourceKind]) -> Result<(), RenderError> {
        let page = self.page()?.clone();
        let mut paused = page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(|e| RenderError::Page(e.to_string()))?;
        let blocked: Vec<ResourceType> = kinds.iter().map(|kind| kind.cdp_type()).collect();

        let intercept_page = page.clone();
        let interceptor = tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let request_id = event.request_id.clone();
                let reply = if blocked.contains(&event.resource_type) {
                    intercept_page
                        .execute(FailRequestParams::new(request_id, ErrorReason::BlockedByClient))
                        .await
                        .map(|_| ())
                } else {
                    intercept_page
                        .execute(ContinueRequestParams::new(request_id))
                        .await
                        .map(|_| ())
                };
                if let Err(e) = reply {
                    tracing::trace!(error = %e, "request interception reply failed");
                }
            }
        });
        self.interceptor = Some(interceptor);

        page.execute(EnableParams::default())
            .await
            .map_err(|e| RenderError::Page(e.to_string()))?;
        Ok(())
    }

    async fn navigate(&mut self, url: &str) -> Result<(), RenderError> {
        let page = self.page()?;
        let navigation = page
            .execute(NavigateParams::new(url))
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;
        if let Some(error_text) = navigation.result.error_text.clone() {
            return Err(RenderError::Navigation(error_text));
        }

        loop {
            let state: String = page
                .evaluate("document.readyState")
                .await
                .map_err(|e| RenderError::Navigation(e.to_string()))?
                .into_value()
                .map_err(|e| RenderError::Navigation(e.to_string()))?;
            if state != "loading" {
                return Ok(());
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    async fn html(&mut self) -> Result<String, RenderError> {
        self.page()?
            .content()
            .await
            .map_err(|e| RenderError::Content(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        if let Some(task) = self.interceptor.take() {
            task.abort();
        }
        match self.page.take() {
            Some(page) => page
                .close()
                .await
                .map_err(|e| RenderError::Page(format!("page close failed: {e}"))),
            None => Ok(()),
        }
    }
}
