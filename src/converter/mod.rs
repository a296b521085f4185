//! Results table → chunked XML feed documents

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use regex::Regex;
use tracing::info;

use crate::config::Config;
use crate::error::CheckerError;
use crate::models::{Availability, FeedItem, StockStatus};

const SKU_COLUMNS: &[&str] = &["SKU", "sku"];
const PRICE_COLUMNS: &[&str] = &["Цена (лв.)", "Цена", "price", "Price"];
const QUANTITY_COLUMNS: &[&str] = &["Бройки", "quantity", "Qty", "qty"];
const AVAILABILITY_COLUMNS: &[&str] = &["Наличност", "availability", "Availability"];

pub struct Converter {
    results: PathBuf,
    feed_dir: PathBuf,
    batch_size: usize,
    marked_price: Regex,
    any_number: Regex,
    integer: Regex,
}

impl Converter {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            results: config.paths.results.clone(),
            feed_dir: config.paths.feed_dir.clone(),
            batch_size: config.batch_size.max(1),
            marked_price: Regex::new(&format!(
                r"(?i)(\d+[.,]?\d*)\s*{}",
                regex::escape(&config.site.currency_marker)
            ))?,
            any_number: Regex::new(r"(\d+[.,]?\d*)")?,
            integer: Regex::new(r"\d+")?,
        })
    }

    /// Read the results table and write one document per batch.
    ///
    /// # Returns
    /// * `Result<Vec<PathBuf>>` - paths of the documents written, in order
    pub fn convert(&self) -> Result<Vec<PathBuf>> {
        let items = self.read_items()?;
        info!("Loaded {} products from {}", items.len(), self.results.display());

        if items.is_empty() {
            info!("No products to write");
            return Ok(Vec::new());
        }

        std::fs::create_dir_all(&self.feed_dir)
            .with_context(|| format!("failed to create {}", self.feed_dir.display()))?;

        let mut written = Vec::new();
        for (i, batch) in items.chunks(self.batch_size).enumerate() {
            let path = self.feed_dir.join(format!("filstar_xml_{}.xml", i + 1));
            write_document(&path, batch)?;
            info!("Wrote {} ({} products)", path.display(), batch.len());
            written.push(path);
        }
        Ok(written)
    }

    /// Normalised feed items, skipping rows without a SKU
    pub fn read_items(&self) -> Result<Vec<FeedItem>> {
        if !self.results.exists() {
            return Err(CheckerError::MissingResults {
                path: self.results.clone(),
            }
            .into());
        }

        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::All)
            .from_path(&self.results)
            .with_context(|| format!("failed to open {}", self.results.display()))?;

        let headers = reader
            .headers()
            .with_context(|| format!("failed to read header of {}", self.results.display()))?
            .clone();

        let mut items = Vec::new();
        for record in reader.records() {
            let record =
                record.with_context(|| format!("failed to read {}", self.results.display()))?;
            // Short rows leave trailing columns out of the map; extra cells are dropped.
            let mut row = HashMap::new();
            for (name, value) in headers.iter().zip(record.iter()) {
                row.entry(name.to_string()).or_insert_with(|| value.to_string());
            }
            if let Some(item) = self.feed_item(&row) {
                items.push(item);
            }
        }
        Ok(items)
    }

    fn feed_item(&self, row: &HashMap<String, String>) -> Option<FeedItem> {
        let sku = first_existing(row, SKU_COLUMNS);
        if sku.is_empty() {
            return None;
        }
        Some(FeedItem {
            sku: sku.to_string(),
            price: self.normalize_price(first_existing(row, PRICE_COLUMNS)),
            quantity: self.normalize_quantity(first_existing(row, QUANTITY_COLUMNS)),
            availability: availability_from_text(first_existing(row, AVAILABILITY_COLUMNS)),
        })
    }

    /// Decimal before the currency marker, else the first decimal, else empty
    pub fn normalize_price(&self, text: &str) -> String {
        let text = text.trim();
        self.marked_price
            .captures(text)
            .or_else(|| self.any_number.captures(text))
            .map(|caps| caps[1].replace(',', "."))
            .unwrap_or_default()
    }

    /// Placeholder or empty becomes empty; otherwise the first integer run
    pub fn normalize_quantity(&self, text: &str) -> String {
        let text = text.trim();
        if text.is_empty() || text == "-" {
            return String::new();
        }
        self.integer
            .find(text)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }
}

/// First non-empty value among `keys`; empty if none
fn first_existing<'a>(row: &'a HashMap<String, String>, keys: &[&str]) -> &'a str {
    keys.iter()
        .filter_map(|key| row.get(*key).map(|value| value.trim()))
        .find(|value| !value.is_empty())
        .unwrap_or("")
}

/// Only the exact "available" label, ignoring case, means in stock
pub fn availability_from_text(text: &str) -> StockStatus {
    if text.trim().to_lowercase() == Availability::AVAILABLE_LABEL.to_lowercase() {
        StockStatus::InStock
    } else {
        StockStatus::OutOfStock
    }
}

fn write_document(path: &Path, items: &[FeedItem]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = Writer::new_with_indent(BufWriter::new(file), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("products")))?;
    for item in items {
        writer.write_event(Event::Start(BytesStart::new("item")))?;
        write_field(&mut writer, "sku", &item.sku)?;
        write_field(&mut writer, "price", &item.price)?;
        write_field(&mut writer, "quantity", &item.quantity)?;
        write_field(&mut writer, "availability", item.availability.as_str())?;
        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("products")))?;

    writer
        .into_inner()
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn write_field<W: Write>(writer: &mut Writer<W>, name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new(name)))?;
    } else {
        writer.write_event(Event::Start(BytesStart::new(name)))?;
        writer.write_event(Event::Text(BytesText::new(value)))?;
        writer.write_event(Event::End(BytesEnd::new(name)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter_in(dir: &Path, batch_size: usize) -> Converter {
        let mut config = Config::new(dir);
        config.batch_size = batch_size;
        Converter::new(&config).unwrap()
    }

    fn default_converter() -> Converter {
        converter_in(Path::new("."), 1400)
    }

    fn write_results(dir: &Path, body: &str) {
        std::fs::write(dir.join("results_filstar.csv"), body).unwrap();
    }

    #[test]
    fn price_uses_marker_and_comma_decimal() {
        let c = default_converter();
        assert_eq!(c.normalize_price("12,50 лв"), "12.50");
        assert_eq!(c.normalize_price("7 лв"), "7");
        assert_eq!(c.normalize_price("Цена: 3 бр. по 8,40 ЛВ"), "8.40");
    }

    #[test]
    fn price_normalization_is_idempotent() {
        let c = default_converter();
        assert_eq!(c.normalize_price("12.50"), "12.50");
        let once = c.normalize_price("99,90 лв.");
        assert_eq!(c.normalize_price(&once), once);
    }

    #[test]
    fn price_without_number_is_empty() {
        let c = default_converter();
        assert_eq!(c.normalize_price(""), "");
        assert_eq!(c.normalize_price("няма"), "");
    }

    #[test]
    fn quantity_normalization() {
        let c = default_converter();
        assert_eq!(c.normalize_quantity("-"), "");
        assert_eq!(c.normalize_quantity(""), "");
        assert_eq!(c.normalize_quantity("15 бр"), "15");
        assert_eq!(c.normalize_quantity("много"), "");
    }

    #[test]
    fn availability_mapping_is_case_insensitive_and_total() {
        assert_eq!(availability_from_text("Наличен"), StockStatus::InStock);
        assert_eq!(availability_from_text("НАЛИЧЕН"), StockStatus::InStock);
        assert_eq!(availability_from_text(" наличен "), StockStatus::InStock);
        assert_eq!(availability_from_text("Изчерпан"), StockStatus::OutOfStock);
        assert_eq!(availability_from_text("Наличен скоро"), StockStatus::OutOfStock);
        assert_eq!(availability_from_text(""), StockStatus::OutOfStock);
    }

    #[test]
    fn rows_without_sku_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_results(
            dir.path(),
            "SKU,Наличност,Бройки,Цена\n,Наличен,-,1.00\n960837,Наличен,-,25.00\n111,Изчерпан,-,3.10\n",
        );

        let items = converter_in(dir.path(), 1400).read_items().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[0],
            FeedItem {
                sku: "960837".to_string(),
                price: "25.00".to_string(),
                quantity: String::new(),
                availability: StockStatus::InStock,
            }
        );
        assert_eq!(items[1].availability, StockStatus::OutOfStock);
    }

    #[test]
    fn ragged_rows_do_not_stop_the_conversion() {
        let dir = tempfile::tempdir().unwrap();
        write_results(
            dir.path(),
            "SKU,Наличност,Бройки,Цена\n1,Наличен,-,2.00,extra\n2,Наличен\n3,Изчерпан,-,4.00\n",
        );

        let items = converter_in(dir.path(), 1400).read_items().unwrap();
        assert_eq!(
            items,
            vec![
                FeedItem {
                    sku: "1".to_string(),
                    price: "2.00".to_string(),
                    quantity: String::new(),
                    availability: StockStatus::InStock,
                },
                FeedItem {
                    sku: "2".to_string(),
                    price: String::new(),
                    quantity: String::new(),
                    availability: StockStatus::InStock,
                },
                FeedItem {
                    sku: "3".to_string(),
                    price: "4.00".to_string(),
                    quantity: String::new(),
                    availability: StockStatus::OutOfStock,
                },
            ]
        );
    }

    #[test]
    fn header_variants_are_resolved() {
        let dir = tempfile::tempdir().unwrap();
        write_results(
            dir.path(),
            "sku,Availability,qty,Цена (лв.),Цена\n42, наличен ,7 бр,,\"5,60 лв\"\n",
        );

        let items = converter_in(dir.path(), 1400).read_items().unwrap();
        assert_eq!(
            items,
            vec![FeedItem {
                sku: "42".to_string(),
                price: "5.60".to_string(),
                quantity: "7".to_string(),
                availability: StockStatus::InStock,
            }]
        );
    }

    #[test]
    fn batches_are_numbered_from_one() {
        let dir = tempfile::tempdir().unwrap();
        let mut body = String::from("SKU,Наличност,Бройки,Цена\n");
        for i in 0..2801 {
            body.push_str(&format!("{},Наличен,-,1.00\n", 100_000 + i));
        }
        write_results(dir.path(), &body);

        let written = converter_in(dir.path(), 1400).convert().unwrap();
        assert_eq!(written.len(), 3);

        let counts: Vec<usize> = written
            .iter()
            .map(|path| std::fs::read_to_string(path).unwrap().matches("<item>").count())
            .collect();
        assert_eq!(counts, vec![1400, 1400, 1]);
        assert_eq!(written[2], dir.path().join("filstar_xml_3.xml"));
    }

    #[test]
    fn document_layout() {
        let dir = tempfile::tempdir().unwrap();
        write_results(
            dir.path(),
            "SKU,Наличност,Бройки,Цена\n960837,Изчерпан,-,\"25,00 лв\"\n",
        );

        let written = converter_in(dir.path(), 1400).convert().unwrap();
        let xml = std::fs::read_to_string(&written[0]).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains("<products>"));
        assert!(xml.contains("<sku>960837</sku>"));
        assert!(xml.contains("<price>25.00</price>"));
        assert!(xml.contains("<quantity/>"));
        assert!(xml.contains("<availability>out_of_stock</availability>"));
        assert!(xml.trim_end().ends_with("</products>"));
    }

    #[test]
    fn no_valid_rows_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write_results(dir.path(), "SKU,Наличност,Бройки,Цена\n,Наличен,-,1.00\n");

        let written = converter_in(dir.path(), 1400).convert().unwrap();
        assert!(written.is_empty());
        assert!(!dir.path().join("filstar_xml_1.xml").exists());
    }

    #[test]
    fn missing_results_table_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = converter_in(dir.path(), 1400).convert().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CheckerError>(),
            Some(CheckerError::MissingResults { .. })
        ));
        assert!(!dir.path().join("filstar_xml_1.xml").exists());
    }
}
