// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (diagnostics go to stderr, RUST_LOG controls the level)
// 2. Parse command-line arguments using clap
// 3. Build the right fetcher for the subcommand
// 4. Run the crawl - report lines are printed to stdout as pages are visited
// 5. Exit with 0 when the crawl ran, 2 when setup failed
//
// A crawl itself cannot fail: broken pages are reported and skipped.
// =============================================================================

mod cli;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use url::Url;
use web_crawler::crawl::{crawl_with, Crawler};
use web_crawler::fetch::{CannedFetcher, HttpFetcher, HttpOptions};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("web_crawler=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    std::process::exit(exit_code(run().await));
}

// 0 once a crawl has run (page failures are only reported), 2 if setup failed
fn exit_code(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Demo {
            seed,
            depth,
            table,
            max_concurrency,
        } => handle_demo(&seed, depth, table.as_deref(), max_concurrency).await,
        Commands::Site {
            url,
            depth,
            max_concurrency,
            timeout_secs,
            same_domain,
        } => handle_site(&url, depth, max_concurrency, timeout_secs, same_domain).await,
    }
}

// Handles the 'demo' subcommand
async fn handle_demo(
    seed: &str,
    depth: usize,
    table: Option<&Path>,
    max_concurrency: Option<usize>,
) -> Result<()> {
    let fetcher = match table {
        Some(path) => CannedFetcher::from_path(path)?,
        None => CannedFetcher::golang_tour(),
    };
    tracing::info!("Loaded fetch table with {} page(s)", fetcher.len());

    let mut crawler = Crawler::new();
    if let Some(max) = max_concurrency {
        crawler = crawler.with_max_concurrency(max);
    }

    crawl_with(crawler, seed, depth, Arc::new(fetcher)).await;
    Ok(())
}

// Handles the 'site' subcommand
async fn handle_site(
    url: &str,
    depth: usize,
    max_concurrency: usize,
    timeout_secs: u64,
    same_domain: bool,
) -> Result<()> {
    let start = Url::parse(url).with_context(|| format!("Invalid URL '{}'", url))?;

    let same_host = if same_domain {
        let host = start
            .host_str()
            .ok_or_else(|| anyhow!("URL has no host: {}", url))?;
        Some(host.to_string())
    } else {
        None
    };

    let fetcher = HttpFetcher::new(HttpOptions {
        timeout: Duration::from_secs(timeout_secs),
        same_host,
        ..HttpOptions::default()
    })?;

    let crawler = Crawler::new().with_max_concurrency(max_concurrency);
    crawl_with(crawler, start.as_str(), depth, Arc::new(fetcher)).await;
    Ok(())
}
