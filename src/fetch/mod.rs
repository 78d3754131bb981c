// src/fetch/mod.rs
// =============================================================================
// This module defines how the crawler gets pages.
//
// The crawler never talks to the network itself. It asks a `Fetcher` for a
// page and gets back the page body and the links found on it. Anything that
// implements the trait can be plugged in:
// - canned: a fixed table of pages (demo runs and tests)
// - http: real web pages fetched with reqwest and parsed with scraper
//
// Rust concepts:
// - Traits: Shared behaviour, like interfaces in other languages
// - async-trait: Lets a trait have async methods AND be used as `dyn Fetcher`
// - thiserror: Derives std::error::Error for our error enum
// =============================================================================

mod canned;
mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use canned::CannedFetcher;
pub use http::{HttpFetcher, HttpOptions};

// A fetched page: its content and the links found inside that content.
//
// The crawler consumes this immediately and never stores it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Human-readable content (canned body, or the HTML <title>)
    pub body: String,
    /// Linked identifiers, in the order they appear on the page
    #[serde(default)]
    pub links: Vec<String>,
}

impl Page {
    pub fn new(body: impl Into<String>, links: &[&str]) -> Self {
        Self {
            body: body.into(),
            links: links.iter().map(|l| l.to_string()).collect(),
        }
    }
}

// Everything that can go wrong while fetching a single page.
//
// A FetchError is always local to one page: the crawler reports it and
// carries on with the rest of the graph.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The identifier is unknown to the fetcher
    #[error("not found: {0}")]
    NotFound(String),

    /// The server answered, but not with a 2xx status
    #[error("HTTP {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The request never got a usable answer (DNS, TLS, timeout, ...)
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The identifier could not be parsed as a URL
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

// The capability the crawler depends on.
//
// `Send + Sync` because one fetcher is shared (behind an Arc) by every
// crawl task, and those tasks may run on different threads.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns the content of `url` and the links found in it.
    async fn fetch(&self, url: &str) -> Result<Page, FetchError>;
}
