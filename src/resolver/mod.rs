//! Per-SKU resolution: search, collect candidate product links, and visit them
//! in order until one yields a priced row.

use anyhow::{Context, Result};
use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{Config, ResolverOptions, Timing};
use crate::extractor::{Extraction, Extractor, parse_selector};
use crate::models::{ResultRecord, Resolution};
use crate::snapshots::Snapshots;
use crate::traits::{Browser, SiteConfig};

pub struct Resolver {
    site: SiteConfig,
    timing: Timing,
    options: ResolverOptions,
    base_url: Url,
    listing_link: Selector,
    legacy_listing_link: Selector,
    extractor: Extractor,
    snapshots: Snapshots,
}

/// Why a candidate page produced nothing; doubles as the snapshot tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Miss {
    NoTable,
    NoRow,
    NoPrice,
}

impl Miss {
    fn tag(self) -> &'static str {
        match self {
            Self::NoTable => "no_table",
            Self::NoRow => "no_row",
            Self::NoPrice => "no_price",
        }
    }
}

impl Resolver {
    pub fn new(config: &Config) -> Result<Self> {
        let site = config.site.clone();
        let base_url = Url::parse(&site.base_url)
            .with_context(|| format!("invalid base URL {}", site.base_url))?;

        Ok(Self {
            listing_link: parse_selector("listing link", &site.selectors.listing_link)?,
            legacy_listing_link: parse_selector(
                "legacy listing link",
                &site.selectors.legacy_listing_link,
            )?,
            extractor: Extractor::new(&site, config.resolver.fallback_matching)?,
            snapshots: Snapshots::new(
                config.paths.debug_dir.clone(),
                config.resolver.debug_snapshots,
            ),
            timing: config.timing,
            options: config.resolver.clone(),
            base_url,
            site,
        })
    }

    /// Resolve one SKU. Never fails: every error degrades to "not found".
    pub async fn resolve(&self, browser: &mut dyn Browser, sku: &str) -> Resolution {
        let candidates = match self.search(browser, sku).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Search for {} failed: {:#}", sku, e);
                Vec::new()
            }
        };

        if candidates.is_empty() {
            info!("{}: no candidates", sku);
            self.snapshots.save(browser, sku, "no_candidates").await;
            return Resolution::not_found(sku);
        }

        debug!("{}: {} candidate(s)", sku, candidates.len());

        for link in &candidates {
            match self.try_candidate(browser, sku, link).await {
                Ok(Ok(record)) => {
                    info!(
                        "{}: {} {} ({})",
                        sku,
                        record.availability.label(),
                        record.price,
                        link
                    );
                    return Resolution::Found(record);
                }
                Ok(Err(miss)) => {
                    debug!("{}: {} on {}", sku, miss.tag(), link);
                    self.snapshots.save(browser, sku, miss.tag()).await;
                }
                Err(e) => debug!("{}: candidate {} failed: {:#}", sku, link, e),
            }
        }

        info!("{}: not found in {} candidate(s)", sku, candidates.len());
        Resolution::not_found(sku)
    }

    async fn search(&self, browser: &mut dyn Browser, sku: &str) -> Result<Vec<String>> {
        let url = self.site.build_search_url(sku);
        browser.goto(&url).await?;
        tokio::time::sleep(self.timing.request_wait).await;

        let listing = format!(
            "{}, {}",
            self.site.selectors.listing_link, self.site.selectors.legacy_listing_link
        );
        if !browser.wait_for(&listing, self.timing.search_wait).await? {
            debug!("{}: no product listing on {}", sku, url);
        }

        let markup = browser.page_source().await?;
        Ok(self.collect_candidates(&markup))
    }

    /// Product links from the primary then the legacy listing pattern,
    /// absolute, deduplicated in discovery order and capped.
    pub fn collect_candidates(&self, markup: &str) -> Vec<String> {
        let document = Html::parse_document(markup);
        let hrefs = document
            .select(&self.listing_link)
            .chain(document.select(&self.legacy_listing_link))
            .filter_map(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty());

        let mut links: Vec<String> = Vec::new();
        for href in hrefs {
            let Ok(url) = self.base_url.join(href) else {
                continue;
            };
            let url = String::from(url);
            if !links.contains(&url) {
                links.push(url);
            }
        }
        links.truncate(self.options.max_candidates);
        links
    }

    async fn try_candidate(
        &self,
        browser: &mut dyn Browser,
        sku: &str,
        link: &str,
    ) -> Result<std::result::Result<ResultRecord, Miss>> {
        browser.goto(link).await?;
        tokio::time::sleep(self.timing.request_wait).await;

        if !browser
            .wait_for(&self.site.selectors.table_body, self.timing.page_timeout)
            .await?
        {
            return Ok(Err(Miss::NoTable));
        }

        let markup = browser.page_source().await?;
        let outcome = match self.extractor.extract(&markup, sku) {
            None => Err(Miss::NoRow),
            Some(Extraction {
                availability,
                quantity,
                price: Some(price),
            }) if !price.is_empty() => Ok(ResultRecord {
                sku: sku.to_string(),
                availability,
                quantity,
                price,
            }),
            Some(_) => Err(Miss::NoPrice),
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::test_utils::ScriptedBrowser;

    fn resolver(max_candidates: usize) -> Resolver {
        let mut config = Config::new(Path::new("."));
        config.resolver.max_candidates = max_candidates;
        Resolver::new(&config).unwrap()
    }

    #[test]
    fn candidates_are_absolute_and_ordered_primary_first() {
        let markup = r#"<html><body>
            <div class="product-title"><a href="https://filstar.com/legacy-reel">Legacy</a></div>
            <div class="product-item-wapper"><a class="product-name" href="/products/rod-1">Rod</a></div>
            <div class="product-item-wapper"><a class="product-name" href="products/line-2">Line</a></div>
        </body></html>"#;

        assert_eq!(
            resolver(12).collect_candidates(markup),
            vec![
                "https://filstar.com/products/rod-1",
                "https://filstar.com/products/line-2",
                "https://filstar.com/legacy-reel",
            ]
        );
    }

    #[test]
    fn candidates_are_deduplicated() {
        let markup = r#"<html><body>
            <div class="product-item-wapper"><a class="product-name" href="/p/1">One</a></div>
            <div class="product-title"><a href="https://filstar.com/p/1">One again</a></div>
            <div class="product-item-wapper"><a class="product-name" href="/p/1">One</a></div>
        </body></html>"#;

        assert_eq!(
            resolver(12).collect_candidates(markup),
            vec!["https://filstar.com/p/1"]
        );
    }

    #[test]
    fn candidates_are_capped() {
        let links: String = (0..20)
            .map(|i| format!(r#"<div class="product-item-wapper"><a class="product-name" href="/p/{i}">P</a></div>"#))
            .collect();
        let markup = format!("<html><body>{links}</body></html>");

        let candidates = resolver(12).collect_candidates(&markup);
        assert_eq!(candidates.len(), 12);
        assert_eq!(candidates[0], "https://filstar.com/p/0");
        assert_eq!(candidates[11], "https://filstar.com/p/11");
    }

    #[tokio::test]
    async fn search_wait_is_shorter_than_product_wait() {
        let mut config = Config::new(Path::new("."));
        config.timing = Timing::immediate();
        let resolver = Resolver::new(&config).unwrap();
        let mut browser = ScriptedBrowser::default()
            .with_page("https://filstar.com/search?term=42", "<html><body></body></html>")
            .with_page(
                "https://filstar.com/search?term=960837",
                r#"<html><body><div class="product-item-wapper"><a class="product-name" href="/p/1">P</a></div></body></html>"#,
            )
            .with_page("https://filstar.com/p/1", "<html><body></body></html>");
        let waits = browser.waits.clone();

        assert_eq!(resolver.resolve(&mut browser, "42").await, Resolution::not_found("42"));
        assert_eq!(
            resolver.resolve(&mut browser, "960837").await,
            Resolution::not_found("960837")
        );

        assert_eq!(
            *waits.lock().unwrap(),
            vec![
                config.timing.search_wait,
                config.timing.search_wait,
                config.timing.page_timeout,
            ]
        );
    }

    #[test]
    fn links_without_href_are_ignored() {
        let markup = r#"<html><body>
            <div class="product-item-wapper"><a class="product-name">No link</a></div>
            <div class="product-title"><a href="  ">Blank</a></div>
        </body></html>"#;

        assert!(resolver(12).collect_candidates(markup).is_empty());
    }
}
