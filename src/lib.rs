//! Product availability checker for filstar.com
//!
//! A check run resolves every SKU of the input table to a price and stock
//! status through a browser session and records the outcome; a conversion
//! turns the recorded results into chunked XML feed documents.

pub mod browser;
pub mod checker;
pub mod config;
pub mod converter;
pub mod error;
pub mod extractor;
pub mod inspect;
pub mod models;
pub mod resolver;
pub mod snapshots;
pub mod store;
#[cfg(test)]
mod test_utils;
pub mod traits;

pub use checker::{RunSummary, StockChecker};
pub use config::Config;
pub use converter::Converter;
pub use error::CheckerError;
pub use models::{FeedItem, NotFoundRecord, Resolution, ResultRecord};
pub use resolver::Resolver;
