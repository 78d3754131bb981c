// src/fetch/canned.rs
// =============================================================================
// A Fetcher that answers from a fixed table instead of the network.
//
// Used for:
// - The `demo` subcommand (built-in golang.org table, or a JSON file)
// - Tests, where we need a link graph we fully control
//
// JSON table format:
//   {
//     "https://golang.org/": {
//       "body": "The Go Programming Language",
//       "links": ["https://golang.org/pkg/", "https://golang.org/cmd/"]
//     }
//   }
// =============================================================================

use super::{FetchError, Fetcher, Page};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct CannedFetcher {
    pages: HashMap<String, Page>,
}

impl CannedFetcher {
    pub fn new(pages: HashMap<String, Page>) -> Self {
        Self { pages }
    }

    // Parses a table from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let pages: HashMap<String, Page> =
            serde_json::from_str(json).context("Invalid fetch table JSON")?;
        Ok(Self::new(pages))
    }

    // Reads and parses a table from a JSON file
    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read fetch table {}", path.display()))?;
        Self::from_json(&json)
            .with_context(|| format!("Could not load fetch table {}", path.display()))
    }

    // The built-in demo graph: a tiny slice of golang.org.
    //
    // https://golang.org/cmd/ is linked but has no entry, so crawling it
    // produces a "not found" failure.
    pub fn golang_tour() -> Self {
        let mut pages = HashMap::new();
        pages.insert(
            "https://golang.org/".to_string(),
            Page::new(
                "The Go Programming Language",
                &["https://golang.org/pkg/", "https://golang.org/cmd/"],
            ),
        );
        pages.insert(
            "https://golang.org/pkg/".to_string(),
            Page::new(
                "Packages",
                &[
                    "https://golang.org/",
                    "https://golang.org/cmd/",
                    "https://golang.org/pkg/fmt/",
                    "https://golang.org/pkg/os/",
                ],
            ),
        );
        pages.insert(
            "https://golang.org/pkg/fmt/".to_string(),
            Page::new(
                "Package fmt",
                &["https://golang.org/", "https://golang.org/pkg/"],
            ),
        );
        pages.insert(
            "https://golang.org/pkg/os/".to_string(),
            Page::new(
                "Package os",
                &["https://golang.org/", "https://golang.org/pkg/"],
            ),
        );
        Self::new(pages)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[async_trait]
impl Fetcher for CannedFetcher {
    async fn fetch(&self, url: &str) -> Result<Page, FetchError> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }
}
