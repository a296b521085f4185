use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use filstar_checker::browser::{self, BrowserKind};
use filstar_checker::{Config, Converter, StockChecker, inspect};

#[derive(Debug, Parser)]
#[command(name = "filstar-checker")]
#[command(about = "Check filstar.com price and stock for a list of SKUs")]
struct Cli {
    /// Directory the default input and output files live in
    #[arg(long, env = "FILSTAR_BASE_DIR", global = true)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve every SKU of the input table and write the result tables
    Check(CheckArgs),
    /// Turn the results table into chunked XML feed documents
    Convert(ConvertArgs),
    /// Dump the search page's input and anchor elements for one SKU
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
struct SessionArgs {
    /// Browser backend driving the session
    #[arg(long, value_enum, env = "FILSTAR_BROWSER", default_value = "chromium")]
    browser: BrowserKind,
}

#[derive(Debug, Args)]
struct CheckArgs {
    #[command(flatten)]
    session: SessionArgs,

    /// SKU input table
    #[arg(long)]
    input: Option<PathBuf>,

    /// Results table to write
    #[arg(long)]
    results: Option<PathBuf>,

    /// Not-found table to write
    #[arg(long)]
    not_found: Option<PathBuf>,

    /// Also match rows whose text contains the SKU as a whole word
    #[arg(long, env = "FILSTAR_FALLBACK_MATCHING")]
    fallback_matching: bool,

    /// Save page markup when a SKU cannot be resolved
    #[arg(long, env = "FILSTAR_DEBUG_SNAPSHOTS")]
    debug_snapshots: bool,

    /// Where debug snapshots go
    #[arg(long)]
    debug_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ConvertArgs {
    /// Results table to read
    #[arg(long)]
    results: Option<PathBuf>,

    /// Directory for the feed documents
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Products per feed document
    #[arg(long, default_value_t = filstar_checker::config::DEFAULT_BATCH_SIZE)]
    batch_size: usize,
}

#[derive(Debug, Args)]
struct InspectArgs {
    /// SKU to search for
    #[arg(default_value = "960837")]
    sku: String,

    #[command(flatten)]
    session: SessionArgs,

    /// Dump file
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let base_dir = match cli.base_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let mut config = Config::new(&base_dir);

    match cli.command {
        Commands::Check(args) => {
            if let Some(path) = args.input {
                config.paths.sku_input = path;
            }
            if let Some(path) = args.results {
                config.paths.results = path;
            }
            if let Some(path) = args.not_found {
                config.paths.not_found = path;
            }
            if let Some(path) = args.debug_dir {
                config.paths.debug_dir = path;
            }
            config.resolver.fallback_matching = args.fallback_matching;
            config.resolver.debug_snapshots = args.debug_snapshots;

            if !config.paths.sku_input.exists() {
                return Err(filstar_checker::CheckerError::MissingInput {
                    path: config.paths.sku_input.clone(),
                }
                .into());
            }

            info!("Starting stock check for {}", config.site.name);
            let checker = StockChecker::new(config.clone())?;
            let session = browser::launch(args.session.browser, &config.site, &config.timing).await?;
            let summary = checker.run(session).await?;
            info!(
                "Results in {} ({} rows), not found in {} ({} rows)",
                config.paths.results.display(),
                summary.found,
                config.paths.not_found.display(),
                summary.not_found
            );
        }
        Commands::Convert(args) => {
            if let Some(path) = args.results {
                config.paths.results = path;
            }
            if let Some(dir) = args.output_dir {
                config.paths.feed_dir = dir;
            }
            config.batch_size = args.batch_size;

            let written = Converter::new(&config)?.convert()?;
            info!("Wrote {} feed document(s)", written.len());
        }
        Commands::Inspect(args) => {
            if let Some(path) = args.output {
                config.paths.inspect_output = path;
            }

            let mut session = browser::launch(args.session.browser, &config.site, &config.timing).await?;
            let outcome = inspect::dump_search_elements(session.as_mut(), &config, &args.sku).await;
            if let Err(e) = session.close().await {
                error!("Failed to close browser session: {:#}", e);
            }
            outcome?;
        }
    }

    Ok(())
}
