// Job posting scraper
//
// Renders one career-portal posting, extracts a normalized record and writes
// it as JSON. Exits non-zero without writing anything when the page cannot be
// acquired.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use kodegen_tools_jobscrape::{
    ChromePageAcquirer, ExtractionPipeline, load_yaml_config, output,
};

#[derive(Debug, Parser)]
#[command(name = "kodegen-jobscrape", version, about = "Extract a normalized job posting from a career portal")]
struct Args {
    /// Posting URL (defaults to the configured URL)
    url: Option<String>,

    /// Log the per-field extraction trace
    #[arg(long)]
    debug: bool,

    /// Where to write the JSON record
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Config file (defaults to ./config.yaml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Navigation timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_yaml_config(args.config.as_deref()).context("Failed to load config")?;
    if let Some(url) = args.url {
        config.scrape.url = url;
    }
    if args.debug {
        config.scrape.debug = true;
    }
    if let Some(path) = args.output {
        config.scrape.output = path;
    }
    if let Some(ms) = args.timeout_ms {
        config.scrape.navigation_timeout_ms = ms;
    }

    let default_level = if config.scrape.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let acquirer = ChromePageAcquirer::from_config(&config)?;
    let pipeline = ExtractionPipeline::new(acquirer).with_debug(config.scrape.debug);

    match pipeline
        .run_to_file(&config.scrape.url, &config.scrape.output)
        .await
    {
        Ok(extraction) => {
            println!("{}", output::summary(&extraction.posting));
            info!("Done: {}", config.scrape.output.display());
            Ok(())
        }
        Err(e) => {
            error!("Scrape failed: {:#}", e);
            std::process::exit(1);
        }
    }
}
