//! Browser session backends
//!
//! The resolver only talks to [`Browser`]; which backend sits behind it is a
//! run-time choice.

use anyhow::Result;
use tracing::info;

use crate::config::Timing;
use crate::traits::{Browser, SiteConfig};

#[cfg(feature = "chromium")]
mod chromium;
mod http;

#[cfg(feature = "chromium")]
pub use chromium::ChromiumBrowser;
pub use http::HttpBrowser;

/// Which backend drives the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BrowserKind {
    /// Headless Chromium; renders client-side markup
    Chromium,
    /// Plain HTTP fetches; no JavaScript
    Http,
}

/// Start a session of the requested kind
pub async fn launch(kind: BrowserKind, site: &SiteConfig, timing: &Timing) -> Result<Box<dyn Browser>> {
    info!("Starting {:?} browser session for {}", kind, site.name);
    match kind {
        BrowserKind::Http => Ok(Box::new(HttpBrowser::new(site, timing)?)),
        #[cfg(feature = "chromium")]
        BrowserKind::Chromium => Ok(Box::new(ChromiumBrowser::launch(timing).await?)),
        #[cfg(not(feature = "chromium"))]
        BrowserKind::Chromium => Err(anyhow::anyhow!(
            "this build has no Chromium support; rebuild with the `chromium` feature or use --browser http"
        )),
    }
}
