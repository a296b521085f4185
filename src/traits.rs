//! Site contract and the browser-session seam used by the resolver

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

/// Where filstar pages live and how their markup is read
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Shown in run logs
    pub name: String,
    /// Base URL that relative product links are resolved against
    pub base_url: String,
    /// Search page address; `{query}` is replaced by the percent-encoded SKU
    pub search_url_pattern: String,
    /// Leva marker (`лв`) a price must carry to be read from a row
    pub currency_marker: String,
    /// Literal tooltip text shown on out-of-stock rows
    pub out_of_stock_phrase: String,
    /// Search listing links and the fast-order table on product pages
    pub selectors: SiteSelectors,
}

/// CSS selectors for the search listing and the product table
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    /// Primary product-listing link on the search page
    pub listing_link: String,
    /// Secondary (legacy) product link on the search page
    pub legacy_listing_link: String,
    /// Body of the fast-order table on a product page
    pub table_body: String,
    /// Rows within the fast-order table
    pub table_row: String,
    /// Cell holding the product code within a row
    pub code_cell: String,
    /// Struck-through (regular) price within a row
    pub struck_price: String,
    /// "Notify me when back in stock" call-to-action within a row
    pub notify_request: String,
    /// Notification icon inside a tooltip container
    pub notify_icon: String,
}

impl SiteConfig {
    /// The filstar.com contract: `/search?term=` search and Leva prices.
    pub fn filstar() -> Self {
        Self::with_base_url("https://filstar.com")
    }

    /// Same contract rooted at another origin (mirrors, local fixtures).
    pub fn with_base_url(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            name: "Filstar".to_string(),
            search_url_pattern: format!("{base_url}/search?term={{query}}"),
            base_url,
            currency_marker: "лв".to_string(),
            out_of_stock_phrase: "Изчерпан продукт!".to_string(),
            selectors: SiteSelectors {
                listing_link: ".product-item-wapper a.product-name".to_string(),
                legacy_listing_link: ".product-title a".to_string(),
                table_body: "#fast-order-table tbody".to_string(),
                table_row: "#fast-order-table tbody tr".to_string(),
                code_cell: "td.td-sky".to_string(),
                struck_price: "strike".to_string(),
                notify_request: "[data-target='#send-request']".to_string(),
                notify_icon: "[data-toggle='tooltip'] img, .tooltip img".to_string(),
            },
        }
    }

    /// Search page for one SKU, e.g. `https://filstar.com/search?term=960837`
    pub fn build_search_url(&self, sku: &str) -> String {
        self.search_url_pattern
            .replace("{query}", &urlencoding::encode(sku.trim()))
    }

    /// User agent sent by the HTTP backend
    pub fn user_agent(&self) -> &'static str {
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
    }
}

/// A single browser session reused across the whole run.
///
/// Implementations keep the "current page" as state: `goto` replaces it and
/// every other call observes it.
#[async_trait]
pub trait Browser: Send {
    /// Navigate the session to `url`
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Wait up to `timeout` for an element matching `selector` to be present
    ///
    /// # Returns
    /// * `Result<bool>` - `false` when the timeout elapsed without a match
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool>;

    /// Full markup of the current page as rendered
    async fn page_source(&mut self) -> Result<String>;

    /// Outer HTML of every element on the current page matching `selector`
    async fn outer_html_of(&mut self, selector: &str) -> Result<Vec<String>>;

    /// Tear the session down
    async fn close(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_the_sku() {
        let site = SiteConfig::filstar();
        assert_eq!(
            site.build_search_url("960837"),
            "https://filstar.com/search?term=960837"
        );
        assert_eq!(
            site.build_search_url("96 08"),
            "https://filstar.com/search?term=96%2008"
        );
        assert_eq!(
            site.build_search_url(" 960837\n"),
            "https://filstar.com/search?term=960837"
        );
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let site = SiteConfig::with_base_url("http://127.0.0.1:4000/");
        assert_eq!(site.base_url, "http://127.0.0.1:4000");
        assert_eq!(
            site.build_search_url("1"),
            "http://127.0.0.1:4000/search?term=1"
        );
    }
}
