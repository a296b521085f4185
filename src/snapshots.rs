use std::path::PathBuf;

use tracing::debug;

use crate::traits::Browser;

/// Best-effort dumps of the current page on failure paths.
#[derive(Debug, Clone)]
pub struct Snapshots {
    dir: PathBuf,
    enabled: bool,
}

impl Snapshots {
    pub fn new(dir: PathBuf, enabled: bool) -> Self {
        Self { dir, enabled }
    }

    pub fn path_for(&self, sku: &str, tag: &str) -> PathBuf {
        self.dir.join(format!("debug_{sku}_{tag}.html"))
    }

    /// Write the session's current markup to `debug_{sku}_{tag}.html`.
    /// Failures are logged at debug level and otherwise ignored.
    pub async fn save(&self, browser: &mut dyn Browser, sku: &str, tag: &str) {
        if !self.enabled {
            return;
        }
        let markup = match browser.page_source().await {
            Ok(markup) => markup,
            Err(e) => {
                debug!("No snapshot for {} ({}): {}", sku, tag, e);
                return;
            }
        };
        let path = self.path_for(sku, tag);
        let written = match tokio::fs::create_dir_all(&self.dir).await {
            Ok(()) => tokio::fs::write(&path, markup).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            debug!("Could not write {}: {}", path.display(), e);
        }
    }
}
