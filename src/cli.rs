// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - demo: crawl a canned link table (built-in golang.org pages, or JSON)
// - site: crawl real web pages over HTTP
//
// Rust concepts:
// - Derive macros: clap generates the parser from these types
// - Option<T>: Flags that may or may not be given
// =============================================================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "web-crawler",
    version,
    about = "Crawl a graph of linked pages concurrently, visiting each page once",
    long_about = "web-crawler follows links from a seed page, one task per link, up to a \
                  maximum depth. Every page is fetched at most once. Each visited page \
                  prints one line: `found: <url> \"<content>\"` or the fetch error."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a canned link table instead of the network
    ///
    /// Example: web-crawler demo --depth 4
    Demo {
        /// Page to start from
        #[arg(long, default_value = "https://golang.org/")]
        seed: String,

        /// Maximum crawl depth (0 = fetch nothing, 1 = only the seed)
        #[arg(long, default_value_t = 4)]
        depth: usize,

        /// JSON file with the link table to use instead of the built-in one
        ///
        /// Format: {"<url>": {"body": "...", "links": ["<url>", ...]}}
        #[arg(long)]
        table: Option<PathBuf>,

        /// Maximum number of fetches running at the same time
        #[arg(long)]
        max_concurrency: Option<usize>,
    },

    /// Crawl real web pages
    ///
    /// Example: web-crawler site https://example.com --depth 2 --same-domain
    Site {
        /// Website URL to start from (e.g., https://example.com)
        url: String,

        /// Maximum crawl depth (0 = fetch nothing, 1 = only the start page)
        #[arg(long, default_value_t = 2)]
        depth: usize,

        /// Maximum number of requests running at the same time
        #[arg(long, default_value_t = 16)]
        max_concurrency: usize,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,

        /// Only follow links on the same host as the start URL
        #[arg(long)]
        same_domain: bool,
    },
}
