//! Search-page element dump for working out listing selectors by hand

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::traits::Browser;

/// Load the search page for `sku` and write every `<input>` and `<a>`
/// element's outer HTML to the configured dump file.
pub async fn dump_search_elements(
    browser: &mut dyn Browser,
    config: &Config,
    sku: &str,
) -> Result<PathBuf> {
    let url = config.site.build_search_url(sku);
    info!("Loading {}", url);
    browser.goto(&url).await?;
    tokio::time::sleep(config.timing.request_wait).await;

    let inputs = browser.outer_html_of("input").await?;
    let anchors = browser.outer_html_of("a").await?;

    let mut dump = String::from("=== INPUT ELEMENTS ===\n");
    for element in &inputs {
        let _ = writeln!(dump, "{element}");
    }
    dump.push_str("\n=== ANCHOR ELEMENTS ===\n");
    for element in &anchors {
        let _ = writeln!(dump, "{element}");
    }

    let path = config.paths.inspect_output.clone();
    tokio::fs::write(&path, dump)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(
        "Wrote {} ({} inputs, {} anchors)",
        path.display(),
        inputs.len(),
        anchors.len()
    );
    Ok(path)
}
