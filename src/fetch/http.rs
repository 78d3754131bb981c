// src/fetch/http.rs
// =============================================================================
// A Fetcher that downloads real web pages.
//
// How it works:
// 1. GET the page with a shared reqwest Client
// 2. Treat any non-2xx status as a failed fetch
// 3. Parse the HTML with scraper
// 4. Use the <title> text as the page content
// 5. Collect every <a href>, resolved to an absolute http(s) URL
//
// Optionally, links can be restricted to a single host so a crawl does not
// wander off across the whole internet.
//
// Rust concepts:
// - map_err: Convert one error type into another
// - HashSet: Drop duplicate links while keeping their first-seen order
// =============================================================================

use super::{FetchError, Fetcher, Page};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

// Settings for the live fetcher (filled in from command-line flags)
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Per-request timeout
    pub timeout: Duration,
    /// Sent as the User-Agent header
    pub user_agent: String,
    /// If set, only links on this host are returned
    pub same_host: Option<String>,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: format!("web-crawler/{}", env!("CARGO_PKG_VERSION")),
            same_host: None,
        }
    }
}

pub struct HttpFetcher {
    client: Client,
    same_host: Option<String>,
}

impl HttpFetcher {
    pub fn new(options: HttpOptions) -> Result<Self> {
        // One client for the whole crawl, so connections are pooled
        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            same_host: options.same_host,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Page, FetchError> {
        let page_url = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let response = self
            .client
            .get(page_url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        // Relative links resolve against where the page was actually served
        // from, which differs from `page_url` after a redirect
        let final_url = response.url().clone();

        let html = response
            .text()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        // The parsed document is not Send, so it lives entirely inside
        // this synchronous call and never across an .await
        Ok(parse_page(&html, &final_url, self.same_host.as_deref()))
    }
}

// Turns raw HTML into a Page: title as body, resolved links as links
fn parse_page(html: &str, page_url: &Url, same_host: Option<&str>) -> Page {
    let document = Html::parse_document(html);

    // Constant selectors, known to be valid
    let title_selector = Selector::parse("title").expect("valid 'title' selector");
    let link_selector = Selector::parse("a[href]").expect("valid 'a[href]' selector");

    let body = document
        .select(&title_selector)
        .next()
        .map(|title| {
            title
                .text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&link_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(link) = resolve_link(page_url, href) else {
            continue;
        };
        if let Some(host) = same_host {
            if link.host_str() != Some(host) {
                continue;
            }
        }
        let link = link.to_string();
        if seen.insert(link.clone()) {
            links.push(link);
        }
    }

    tracing::debug!("Extracted {} links from {}", links.len(), page_url);
    Page { body, links }
}

// Resolves a link (possibly relative) to an absolute http(s) URL
fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();

    // Skip anchors and special protocols
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    // /page and /page#section are the same page
    url.set_fragment(None);
    Some(url)
}
