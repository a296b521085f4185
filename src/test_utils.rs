//! In-memory browser session for unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use scraper::Html;

use crate::extractor::parse_selector;
use crate::traits::Browser;

/// Serves fixed markup per URL and records what the caller did with it.
#[derive(Default)]
pub struct ScriptedBrowser {
    pages: HashMap<String, String>,
    current: Option<String>,
    /// Number of `close` calls, shared with the test
    pub closes: Arc<AtomicUsize>,
    /// Timeouts passed to `wait_for`, in call order
    pub waits: Arc<Mutex<Vec<Duration>>>,
}

impl ScriptedBrowser {
    pub fn with_page(mut self, url: &str, markup: &str) -> Self {
        self.pages.insert(url.to_string(), markup.to_string());
        self
    }

    fn current(&self) -> Result<&str> {
        self.current.as_deref().context("no page loaded")
    }
}

#[async_trait]
impl Browser for ScriptedBrowser {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.current = Some(
            self.pages
                .get(url)
                .cloned()
                .with_context(|| format!("no page scripted for {url}"))?,
        );
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool> {
        if let Ok(mut waits) = self.waits.lock() {
            waits.push(timeout);
        }
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
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
