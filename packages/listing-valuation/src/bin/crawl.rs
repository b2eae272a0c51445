// Entry point: crawl listings, enrich them, write the CSV

use anyhow::{Context, Result};
use clap::Parser;
use listing_valuation::{export, AppConfig, BilprisClient, Crawler, HttpFetcher};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crawl vehicle listings and compare listed prices with estimated values
#[derive(Parser, Debug)]
#[command(name = "crawl")]
struct Args {
    /// Marketplace index page (overrides INDEX_URL)
    #[arg(long)]
    index_url: Option<String>,

    /// CSV output path (overrides OUTPUT_PATH)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Listing pages fetched concurrently (overrides CRAWL_CONCURRENCY)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Only take the first N listings (overrides MAX_LISTINGS)
    #[arg(long)]
    max_listings: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,listing_valuation=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = AppConfig::from_env().context("Failed to load configuration")?;
    if let Some(index_url) = args.index_url {
        config.crawl.index_url = index_url;
    }
    if let Some(output) = args.output {
        config.output_path = output;
    }
    if let Some(concurrency) = args.concurrency {
        config.crawl = config.crawl.with_concurrency(concurrency);
    }
    if let Some(max) = args.max_listings {
        config.crawl = config.crawl.with_max_listings(max);
    }
    tracing::info!(index_url = %config.crawl.index_url, "Configuration loaded");

    let fetcher = HttpFetcher::new(&config.crawl).context("Failed to create HTTP client")?;
    let valuation =
        BilprisClient::new(&config.valuation).context("Failed to create valuation client")?;

    let crawler = Crawler::new(config.crawl, fetcher, valuation)
        .context("Failed to set up crawler")?;

    crawler.run().await.context("Crawl failed")?;

    let records = crawler.store().snapshot();
    export::export_csv(&config.output_path, &records).with_context(|| {
        format!("Failed to write results to {}", config.output_path.display())
    })?;

    Ok(())
}
