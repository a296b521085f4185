//! Headless Chromium session using chromiumoxide.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use scraper::Html;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::Timing;
use crate::extractor::parse_selector;
use crate::traits::Browser;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One Chromium process with a single tab reused for every navigation.
pub struct ChromiumBrowser {
    browser: CdpBrowser,
    page: Page,
    handler: JoinHandle<()>,
    page_timeout: Duration,
}

impl ChromiumBrowser {
    /// Launch headless Chromium. `CHROME_PATH` overrides executable discovery.
    pub async fn launch(timing: &Timing) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .arg("--headless=new")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--window-size=1280,2200");
        if let Ok(path) = std::env::var("CHROME_PATH") {
            builder = builder.chrome_executable(PathBuf::from(path));
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = CdpBrowser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to open a tab")?;

        Ok(Self {
            browser,
            page,
            handler,
            page_timeout: timing.page_timeout,
        })
    }
}

#[async_trait]
impl Browser for ChromiumBrowser {
    async fn goto(&mut self, url: &str) -> Result<()> {
        debug!("navigate {}", url);
        match tokio::time::timeout(self.page_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => bail!("navigation to {url} failed: {e}"),
            Err(_) => bail!(
                "navigation to {url} timed out after {}ms",
                self.page_timeout.as_millis()
            ),
        }
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool> {
        let started = Instant::now();
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(true);
            }
            if started.elapsed() >= timeout {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn page_source(&mut self) -> Result<String> {
        let result = self
            .page
            .evaluate("document.documentElement.outerHTML")
            .await
            .context("failed to read page markup")?;

        result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert page markup: {e:?}"))
    }

    async fn outer_html_of(&mut self, selector: &str) -> Result<Vec<String>> {
        let markup = self.page_source().await?;
        let selector = parse_selector("inspect", selector)?;
        let document = Html::parse_document(&markup);
        Ok(document.select(&selector).map(|el| el.html()).collect())
    }

    async fn close(&mut self) -> Result<()> {
        if let Err(e) = self.browser.close().await {
            warn!("Chromium did not close cleanly: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
        Ok(())
    }
}
