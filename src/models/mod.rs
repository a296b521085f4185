//! Records produced by a check run and consumed by the feed converter

use serde::Serialize;

/// Header of the results table
pub const RESULTS_HEADER: [&str; 4] = ["SKU", "Наличност", "Бройки", "Цена"];

/// Header of the not-found table
pub const NOT_FOUND_HEADER: [&str; 1] = ["SKU"];

/// Quantity column value; stock counts are never read from the page
pub const QUANTITY_PLACEHOLDER: &str = "-";

/// Stock status as labelled in the results table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Availability {
    #[serde(rename = "Наличен")]
    Available,
    #[serde(rename = "Изчерпан")]
    OutOfStock,
}

impl Availability {
    pub const AVAILABLE_LABEL: &'static str = "Наличен";
    pub const OUT_OF_STOCK_LABEL: &'static str = "Изчерпан";

    pub fn label(self) -> &'static str {
        match self {
            Self::Available => Self::AVAILABLE_LABEL,
            Self::OutOfStock => Self::OUT_OF_STOCK_LABEL,
        }
    }
}

/// A SKU resolved to a priced product row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRecord {
    #[serde(rename = "SKU")]
    pub sku: String,
    #[serde(rename = "Наличност")]
    pub availability: Availability,
    #[serde(rename = "Бройки")]
    pub quantity: String,
    #[serde(rename = "Цена")]
    pub price: String,
}

/// A SKU no candidate page could price
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotFoundRecord {
    #[serde(rename = "SKU")]
    pub sku: String,
}

/// Outcome of resolving one SKU; exactly one per input SKU
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(ResultRecord),
    NotFound(NotFoundRecord),
}

impl Resolution {
    pub fn not_found(sku: &str) -> Self {
        Self::NotFound(NotFoundRecord {
            sku: sku.to_string(),
        })
    }

    pub fn sku(&self) -> &str {
        match self {
            Self::Found(record) => &record.sku,
            Self::NotFound(record) => &record.sku,
        }
    }
}

/// Feed availability value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockStatus {
    InStock,
    OutOfStock,
}

impl StockStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InStock => "in_stock",
            Self::OutOfStock => "out_of_stock",
        }
    }
}

/// One `<item>` of a feed document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub sku: String,
    /// Decimal string, empty when the source had none
    pub price: String,
    /// Integer string, empty when unknown
    pub quantity: String,
    pub availability: StockStatus,
}
