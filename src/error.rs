use std::path::PathBuf;

use thiserror::Error;

/// Fatal conditions that stop a run before any output is produced.
#[derive(Debug, Error)]
pub enum CheckerError {
    #[error("SKU input table not found: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("results table not found: {}", path.display())]
    MissingResults { path: PathBuf },

    #[error("invalid {name} selector \"{selector}\": {reason}")]
    InvalidSelector {
        name: &'static str,
        selector: String,
        reason: String,
    },
}
