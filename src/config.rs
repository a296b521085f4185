//! Run configuration
//!
//! Every component receives the part of [`Config`] it needs at construction.
//! Defaults:
//!
//! | setting          | default                   |
//! |------------------|---------------------------|
//! | input table      | `sku_list_filstar.csv`    |
//! | results table    | `results_filstar.csv`     |
//! | not-found table  | `not_found_filstar.csv`   |
//! | debug directory  | `debug_html/`             |
//! | feed documents   | `filstar_xml_{n}.xml`     |
//! | request wait     | 500 ms                    |
//! | pause per SKU    | 600 ms                    |
//! | page timeout     | 20 s                      |
//! | search wait      | 5 s                       |
//! | max candidates   | 12                        |
//! | batch size       | 1400                      |
//!
//! All file names resolve against the base directory, which defaults to the
//! current working directory.
//!
//! The search wait bounds how long a search page is polled for a product
//! listing. A SKU with no search hits costs this much on a rendering backend,
//! so it is kept well below the page timeout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::traits::SiteConfig;

pub const DEFAULT_MAX_CANDIDATES: usize = 12;
pub const DEFAULT_BATCH_SIZE: usize = 1400;

/// Everything a run needs, built once in `main`.
#[derive(Debug, Clone)]
pub struct Config {
    pub site: SiteConfig,
    pub paths: Paths,
    pub timing: Timing,
    pub resolver: ResolverOptions,
    /// Items per feed document
    pub batch_size: usize,
}

impl Config {
    pub fn new(base_dir: &Path) -> Self {
        Self {
            site: SiteConfig::filstar(),
            paths: Paths::under(base_dir),
            timing: Timing::default(),
            resolver: ResolverOptions::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Input and output locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub sku_input: PathBuf,
    pub results: PathBuf,
    pub not_found: PathBuf,
    pub debug_dir: PathBuf,
    /// Directory the feed documents are written into
    pub feed_dir: PathBuf,
    /// Target of the `inspect` element dump
    pub inspect_output: PathBuf,
}

impl Paths {
    pub fn under(base_dir: &Path) -> Self {
        Self {
            sku_input: base_dir.join("sku_list_filstar.csv"),
            results: base_dir.join("results_filstar.csv"),
            not_found: base_dir.join("not_found_filstar.csv"),
            debug_dir: base_dir.join("debug_html"),
            feed_dir: base_dir.to_path_buf(),
            inspect_output: base_dir.join("debug_elements.txt"),
        }
    }
}

/// Fixed politeness pauses and bounded waits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Pause after every navigation
    pub request_wait: Duration,
    /// Pause between two SKUs
    pub between_sku: Duration,
    /// Upper bound for page loads and the product-table wait
    pub page_timeout: Duration,
    /// Upper bound for the product-listing wait on a search page
    pub search_wait: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            request_wait: Duration::from_millis(500),
            between_sku: Duration::from_millis(600),
            page_timeout: Duration::from_secs(20),
            search_wait: Duration::from_secs(5),
        }
    }
}

impl Timing {
    /// No pauses, short timeout. Used against local fixtures.
    pub fn immediate() -> Self {
        Self {
            request_wait: Duration::ZERO,
            between_sku: Duration::ZERO,
            page_timeout: Duration::from_secs(5),
            search_wait: Duration::from_secs(1),
        }
    }
}

/// Behaviour switches for the resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Fall back to a whole-word search of each row's text when no code cell matches
    pub fallback_matching: bool,
    /// Save page markup under the debug directory on failure paths
    pub debug_snapshots: bool,
    /// Cap on candidate links visited per SKU
    pub max_candidates: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            fallback_matching: false,
            debug_snapshots: false,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}
