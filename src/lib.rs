//! A concurrent, depth-bounded web crawler.
//!
//! Starting from a seed URL, the crawler fetches each page, reports it, and
//! follows every link on it in its own tokio task, one level of depth at a
//! time. Each URL is fetched at most once per crawl, and a crawl only returns
//! after every reachable page within the depth budget has been attempted.
//!
//! Pages come from a [`fetch::Fetcher`]: a fixed table ([`fetch::CannedFetcher`])
//! or real HTTP ([`fetch::HttpFetcher`]).
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use web_crawler::crawl::Crawler;
//! use web_crawler::fetch::CannedFetcher;
//!
//! #[tokio::main]
//! async fn main() {
//!     let crawler = Arc::new(Crawler::new().with_max_concurrency(8));
//!     crawler
//!         .crawl("https://golang.org/", 4, Arc::new(CannedFetcher::golang_tour()))
//!         .await;
//!     println!("{} page(s) visited", crawler.visited_count());
//! }
//! ```

pub mod crawl;
pub mod fetch;
