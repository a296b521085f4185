use std::time::Instant;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::Resolution;
use crate::resolver::Resolver;
use crate::store::{ResultStore, read_skus};
use crate::traits::Browser;

/// Totals of one check run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub found: usize,
    pub not_found: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.found + self.not_found
    }
}

/// Drives a full check run over the SKU input table
pub struct StockChecker {
    config: Config,
    resolver: Resolver,
}

impl StockChecker {
    pub fn new(config: Config) -> Result<Self> {
        let resolver = Resolver::new(&config)?;
        Ok(Self { config, resolver })
    }

    /// Resolve every SKU with the given session and record the outcomes.
    ///
    /// The input table is read before anything is written, so a missing
    /// table leaves existing outputs untouched. The session is closed on
    /// every path out of this function once it has been handed over.
    pub async fn run(&self, mut browser: Box<dyn Browser>) -> Result<RunSummary> {
        let outcome = self.run_with(browser.as_mut()).await;

        if let Err(e) = browser.close().await {
            warn!("Failed to close browser session: {:#}", e);
        }

        outcome
    }

    async fn run_with(&self, browser: &mut dyn Browser) -> Result<RunSummary> {
        let paths = &self.config.paths;
        let skus = read_skus(&paths.sku_input)?;
        let mut store = ResultStore::create(&paths.results, &paths.not_found)?;

        let started = Instant::now();
        let mut summary = RunSummary::default();

        for (i, sku) in skus.iter().enumerate() {
            info!("[{}/{}] Checking {}", i + 1, skus.len(), sku);

            let resolution = self.resolver.resolve(browser, sku).await;
            store.record(&resolution)?;
            let table = match &resolution {
                Resolution::Found(_) => {
                    summary.found += 1;
                    "results"
                }
                Resolution::NotFound(_) => {
                    summary.not_found += 1;
                    "not-found"
                }
            };
            debug!("Recorded {} in the {} table", resolution.sku(), table);

            tokio::time::sleep(self.config.timing.between_sku).await;
        }

        info!(
            "Checked {} SKUs in {:.1}s: {} found, {} not found",
            summary.total(),
            started.elapsed().as_secs_f64(),
            summary.found,
            summary.not_found
        );
        Ok(summary)
    }
}
