use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use tracing::debug;

use crate::config::Timing;
use crate::extractor::parse_selector;
use crate::traits::{Browser, SiteConfig};

/// Session backed by plain HTTP requests.
///
/// Pages are taken as served, so waits reduce to a presence check on the
/// fetched markup.
pub struct HttpBrowser {
    client: Client,
    current: Option<String>,
}

impl HttpBrowser {
    pub fn new(site: &SiteConfig, timing: &Timing) -> Result<Self> {
        let client = Client::builder()
            .user_agent(site.user_agent())
            .timeout(timing.page_timeout)
            .build()?;

        Ok(Self {
            client,
            current: None,
        })
    }

    fn current(&self) -> Result<&str> {
        self.current
            .as_deref()
            .context("no page loaded in the HTTP session")
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.current = None;
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Failed to fetch {}: {}",
                url,
                response.status()
            ));
        }

        self.current = Some(response.text().await?);
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, _timeout: Duration) -> Result<bool> {
        let selector = parse_selector("wait", selector)?;
        let document = Html::parse_document(self.current()?);
        Ok(document.select(&selector).next().is_some())
    }

    async fn page_source(&mut self) -> Result<String> {
        self.current().map(str::to_string)
    }

    async fn outer_html_of(&mut self, selector: &str) -> Result<Vec<String>> {
        let selector = parse_selector("inspect", selector)?;
        let document = Html::parse_document(self.current()?);
        Ok(document.select(&selector).map(|el| el.html()).collect())
    }

    async fn close(&mut self) -> Result<()> {
        self.current = None;
        Ok(())
    }
}
