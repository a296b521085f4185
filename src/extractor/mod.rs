//! Product-page extraction: find the row for a SKU in the fast-order table and
//! read its price and stock status.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::CheckerError;
use crate::models::{Availability, QUANTITY_PLACEHOLDER};
use crate::traits::SiteConfig;

/// What a matching row yielded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub availability: Availability,
    pub quantity: String,
    /// Decimal string with a period separator
    pub price: Option<String>,
}

/// Compiled selectors and patterns for one site contract
#[derive(Debug)]
pub struct Extractor {
    row: Selector,
    code_cell: Selector,
    struck_price: Selector,
    notify_request: Selector,
    notify_icon: Selector,
    price_pattern: Regex,
    out_of_stock_phrase: String,
    fallback_matching: bool,
}

pub(crate) fn parse_selector(name: &'static str, selector: &str) -> Result<Selector, CheckerError> {
    Selector::parse(selector).map_err(|e| CheckerError::InvalidSelector {
        name,
        selector: selector.to_string(),
        reason: format!("{e:?}"),
    })
}

/// Strip everything that is not an ASCII digit
pub fn only_digits(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

/// Text content of an element with text nodes separated by single spaces
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

impl Extractor {
    pub fn new(site: &SiteConfig, fallback_matching: bool) -> Result<Self, CheckerError> {
        let selectors = &site.selectors;
        let price_pattern = Regex::new(&format!(
            r"(?i)(\d+[.,]?\d*)\s*{}",
            regex::escape(&site.currency_marker)
        ))
        .map_err(|e| CheckerError::InvalidSelector {
            name: "currency marker",
            selector: site.currency_marker.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            row: parse_selector("table row", &selectors.table_row)?,
            code_cell: parse_selector("code cell", &selectors.code_cell)?,
            struck_price: parse_selector("struck price", &selectors.struck_price)?,
            notify_request: parse_selector("notify request", &selectors.notify_request)?,
            notify_icon: parse_selector("notify icon", &selectors.notify_icon)?,
            price_pattern,
            out_of_stock_phrase: site.out_of_stock_phrase.clone(),
            fallback_matching,
        })
    }

    /// Extract price and availability for `sku` from rendered product-page markup.
    ///
    /// # Returns
    /// * `None` - no row of the product table belongs to `sku`
    /// * `Some(Extraction)` - the matching row; its price may still be absent
    pub fn extract(&self, markup: &str, sku: &str) -> Option<Extraction> {
        let document = Html::parse_document(markup);
        let digits = only_digits(sku);
        if digits.is_empty() {
            return None;
        }

        let row = self
            .match_code_cell(&document, &digits)
            .or_else(|| self.match_row_text(&document, &digits))?;
        let row_text = element_text(row);

        let price = self
            .struck_price_of(row)
            .or_else(|| self.find_price(&row_text));

        let availability = if self.is_out_of_stock(row, &row_text) {
            Availability::OutOfStock
        } else {
            Availability::Available
        };

        Some(Extraction {
            availability,
            quantity: QUANTITY_PLACEHOLDER.to_string(),
            price,
        })
    }

    fn match_code_cell<'a>(&self, document: &'a Html, digits: &str) -> Option<ElementRef<'a>> {
        document.select(&self.row).find(|row| {
            row.select(&self.code_cell)
                .next()
                .is_some_and(|cell| only_digits(&element_text(cell)) == digits)
        })
    }

    fn match_row_text<'a>(&self, document: &'a Html, digits: &str) -> Option<ElementRef<'a>> {
        if !self.fallback_matching {
            return None;
        }
        let token = Regex::new(&format!(r"\b{}\b", regex::escape(digits))).ok()?;
        document
            .select(&self.row)
            .find(|row| token.is_match(&element_text(*row)))
    }

    fn struck_price_of(&self, row: ElementRef<'_>) -> Option<String> {
        let struck = row.select(&self.struck_price).next()?;
        self.find_price(&element_text(struck))
    }

    fn find_price(&self, text: &str) -> Option<String> {
        self.price_pattern
            .captures(text)
            .map(|caps| caps[1].replace(',', "."))
    }

    fn is_out_of_stock(&self, row: ElementRef<'_>, row_text: &str) -> bool {
        row.select(&self.notify_request).next().is_some()
            || row_text.contains(&self.out_of_stock_phrase)
            || row.select(&self.notify_icon).next().is_some()
    }
}
