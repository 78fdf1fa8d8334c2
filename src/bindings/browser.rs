//! Headless-browser service binding
//!
//! Wraps chromiumoxide behind a small session trait. A session is acquired
//! per request, never pooled, and must be closed exactly once regardless of
//! how the caller exits. The scraping logic itself lives in
//! [`crate::scrape`] as a serialized closure; this module only carries it
//! across the CDP boundary.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};

use super::BindingError;

const TEXT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[async_trait]
pub trait BrowserBinding: Send + Sync {
    /// Acquire a fresh browser session.
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, BindingError>;
}

#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate to `url` and wait for the page to load.
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), BindingError>;

    /// Best-effort wait until the page body matches `pattern`
    /// (case-insensitive). Returns `false` on timeout, never an error.
    async fn wait_for_text(&self, pattern: &str, timeout: Duration) -> bool;

    /// Evaluate a serialized expression in the page context and return its
    /// JSON value.
    async fn evaluate(&self, expression: &str) -> Result<Value, BindingError>;

    /// Best-effort full-page PNG capture. `None` on failure.
    async fn screenshot_png(&self) -> Option<Vec<u8>>;

    /// Release the session. Consumes it so a double close cannot compile.
    async fn close(self: Box<Self>);
}

/// Launches a local Chromium per session.
pub struct HeadlessChromium {
    executable: Option<String>,
    headless: bool,
}

impl HeadlessChromium {
    pub fn new(executable: Option<String>, headless: bool) -> Self {
        Self {
            executable,
            headless,
        }
    }
}

#[async_trait]
impl BrowserBinding for HeadlessChromium {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, BindingError> {
        let mut builder = BrowserConfig::builder();
        if !self.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(BindingError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BindingError::Launch(e.to_string()))?;

        // The handler stream must be driven for the whole session lifetime.
        let driver = tokio::spawn(async move { while handler.next().await.is_some() {} });

        tracing::debug!("browser session launched");
        Ok(Box::new(ChromiumSession {
            browser,
            driver,
            page: Mutex::new(None),
        }))
    }
}

struct ChromiumSession {
    browser: Browser,
    driver: JoinHandle<()>,
    page: Mutex<Option<Page>>,
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&self, url: &str, deadline: Duration) -> Result<(), BindingError> {
        let navigation = async {
            let page = self.browser.new_page(url).await?;
            page.wait_for_navigation().await?;
            Ok::<Page, chromiumoxide::error::CdpError>(page)
        };

        let page = timeout(deadline, navigation)
            .await
            .map_err(|_| BindingError::NavTimeout(deadline))?
            .map_err(|e| BindingError::Navigation(e.to_string()))?;

        *self.page.lock().await = Some(page);
        Ok(())
    }

    async fn wait_for_text(&self, pattern: &str, deadline: Duration) -> bool {
        let Ok(pattern_literal) = serde_json::to_string(pattern) else {
            return false;
        };
        let expression = format!(
            "document.body !== null && new RegExp({pattern_literal}, 'i').test(document.body.innerText)"
        );

        let end = Instant::now() + deadline;
        loop {
            if let Ok(value) = self.evaluate(&expression).await {
                if value.as_bool() == Some(true) {
                    return true;
                }
            }
            if Instant::now() >= end {
                return false;
            }
            sleep(TEXT_POLL_INTERVAL).await;
        }
    }

    async fn evaluate(&self, expression: &str) -> Result<Value, BindingError> {
        let guard = self.page.lock().await;
        let page = guard
            .as_ref()
            .ok_or_else(|| BindingError::Evaluate("no page loaded".to_string()))?;

        let result = page
            .evaluate(expression)
            .await
            .map_err(|e| BindingError::Evaluate(e.to_string()))?;

        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn screenshot_png(&self) -> Option<Vec<u8>> {
        let guard = self.page.lock().await;
        let page = guard.as_ref()?;
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();

        match page.screenshot(params).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(error = %e, "screenshot capture failed, continuing without it");
                None
            }
        }
    }

    async fn close(self: Box<Self>) {
        let this = *self;
        if let Some(page) = this.page.lock().await.take() {
            let _ = page.close().await;
        }
        let mut browser = this.browser;
        if let Err(e) = browser.close().await {
            tracing::warn!(error = %e, "browser close failed");
        }
        let _ = browser.wait().await;
        this.driver.abort();
        tracing::debug!("browser session closed");
    }
}
