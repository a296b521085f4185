//! CSV tables: the SKU input list and the append-only result tables

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim, Writer, WriterBuilder};
use tracing::info;

use crate::error::CheckerError;
use crate::models::{NOT_FOUND_HEADER, RESULTS_HEADER, Resolution};

/// Read the SKU column of the input table.
///
/// The header row is skipped, as are blank cells and a repeated `sku` header.
pub fn read_skus(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(CheckerError::MissingInput {
            path: path.to_path_buf(),
        }
        .into());
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut skus = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("failed to read {}", path.display()))?;
        let Some(value) = record.get(0) else {
            continue;
        };
        if value.is_empty() || value.eq_ignore_ascii_case("sku") {
            continue;
        }
        skus.push(value.to_string());
    }

    info!("Loaded {} SKUs from {}", skus.len(), path.display());
    Ok(skus)
}

/// Results and not-found tables for one run
pub struct ResultStore {
    results: Writer<File>,
    not_found: Writer<File>,
}

fn create_table(path: &Path, header: &[&str]) -> Result<Writer<File>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    writer.write_record(header)?;
    writer.flush()?;
    Ok(writer)
}

impl ResultStore {
    /// Truncate both tables and write their headers
    pub fn create(results: &Path, not_found: &Path) -> Result<Self> {
        Ok(Self {
            results: create_table(results, &RESULTS_HEADER)?,
            not_found: create_table(not_found, &NOT_FOUND_HEADER)?,
        })
    }

    /// Append one resolution to the table it belongs to
    pub fn record(&mut self, resolution: &Resolution) -> Result<()> {
        match resolution {
            Resolution::Found(record) => {
                self.results.serialize(record)?;
                self.results.flush()?;
            }
            Resolution::NotFound(record) => {
                self.not_found.serialize(record)?;
                self.not_found.flush()?;
            }
        }
        Ok(())
    }
}
