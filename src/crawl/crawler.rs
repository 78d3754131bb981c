// src/crawl/crawler.rs
// =============================================================================
// The concurrent, depth-bounded crawler.
//
// How a single visit works:
// 1. Depth budget used up? Stop.
// 2. Claim the URL in the visited set. Someone else already did? Stop.
// 3. Fetch the page.
// 4. Fetch failed? Report the error and stop (there are no links to follow).
// 5. Report the page.
// 6. Spawn one task per link, with one less unit of depth.
// 7. Wait for ALL of those tasks before returning.
//
// Because of step 7, `crawl()` only returns once the whole reachable part
// of the graph (within the depth budget) has been attempted.
//
// The visited set:
// - Only grows, entries are never removed
// - Step 2 checks and inserts under one write lock, so two tasks can never
//   both decide to fetch the same URL
// - A failed fetch keeps its entry, so it is not retried on another path
//
// Rust concepts:
// - Arc: Shared ownership, so every task can hold the same Crawler
// - RwLock: Many readers OR one writer
// - JoinSet: A group of spawned tasks we can wait on together
// - BoxFuture: Recursive async code needs a boxed (heap allocated) future
// =============================================================================

use super::report::{ReportSink, StdoutSink};
use crate::fetch::Fetcher;
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub struct Crawler {
    visited: RwLock<HashSet<String>>,
    fetch_limit: Option<Arc<Semaphore>>,
    sink: Arc<dyn ReportSink>,
}

impl Default for Crawler {
    fn default() -> Self {
        Self::new()
    }
}

impl Crawler {
    // A crawler with unbounded fan-out that reports to stdout
    pub fn new() -> Self {
        Self {
            visited: RwLock::new(HashSet::new()),
            fetch_limit: None,
            sink: Arc::new(StdoutSink),
        }
    }

    // Caps how many fetches may be in flight at once.
    //
    // Only the fetch itself holds a permit. A parent waiting for its
    // children holds nothing, so a deep graph cannot starve itself.
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.fetch_limit = Some(Arc::new(Semaphore::new(max.max(1))));
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = sink;
        self
    }

    // Crawls from `url`, following links up to `depth` hops.
    //
    // depth 0 does nothing; depth 1 fetches only `url` itself.
    pub async fn crawl(self: &Arc<Self>, url: &str, depth: usize, fetcher: Arc<dyn Fetcher>) {
        tracing::info!("Crawling {} with depth {}", url, depth);
        Arc::clone(self)
            .visit(url.to_string(), depth, fetcher)
            .await;
        tracing::info!("Finished crawling {}: {} page(s) visited", url, self.visited_count());
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(url)
    }

    // Snapshot of every URL attempted so far (successful or not)
    pub fn visited(&self) -> HashSet<String> {
        self.visited
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn visited_count(&self) -> usize {
        self.visited
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    // Returns true if this call inserted `url`, false if it was already there
    fn mark_visited(&self, url: &str) -> bool {
        let mut visited = self.visited.write().unwrap_or_else(PoisonError::into_inner);
        if visited.contains(url) {
            return false;
        }
        visited.insert(url.to_string())
    }

    fn visit(
        self: Arc<Self>,
        url: String,
        depth: usize,
        fetcher: Arc<dyn Fetcher>,
    ) -> BoxFuture<'static, ()> {
        async move {
            if depth == 0 {
                return;
            }
            if !self.mark_visited(&url) {
                tracing::debug!("Skipping already visited URL: {}", url);
                return;
            }

            let result = {
                // Closed semaphores never happen here; without a permit we
                // simply run unbounded
                let _permit = match &self.fetch_limit {
                    Some(limit) => limit.acquire().await.ok(),
                    None => None,
                };
                fetcher.fetch(&url).await
            };

            let page = match result {
                Ok(page) => page,
                Err(e) => {
                    tracing::debug!("Fetch failed for {}: {}", url, e);
                    self.sink.failed(&e);
                    return;
                }
            };
            self.sink.found(&url, &page.body);

            let mut children = JoinSet::new();
            for link in page.links {
                children.spawn(Arc::clone(&self).visit(link, depth - 1, Arc::clone(&fetcher)));
            }

            // Join barrier: every child (and its whole subtree) finishes first
            while let Some(joined) = children.join_next().await {
                if let Err(e) = joined {
                    tracing::warn!("Crawl task below {} did not finish: {}", url, e);
                }
            }
        }
        .boxed()
    }
}

// Runs one crawl with a fresh default Crawler (stdout, unbounded fan-out).
pub async fn crawl(seed: &str, depth: usize, fetcher: Arc<dyn Fetcher>) {
    crawl_with(Crawler::new(), seed, depth, fetcher).await;
}

// Runs one crawl with a configured Crawler, which is dropped afterwards
pub async fn crawl_with(crawler: Crawler, seed: &str, depth: usize, fetcher: Arc<dyn Fetcher>) {
    let crawler = Arc::new(crawler);
    crawler.crawl(seed, depth, fetcher).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::MemorySink;
    use crate::fetch::{CannedFetcher, FetchError, Page};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    // Wraps a CannedFetcher, counting fetches per URL and optionally sleeping
    // to give concurrent tasks a chance to overlap
    struct CountingFetcher {
        inner: CannedFetcher,
        delay: Duration,
        counts: Mutex<HashMap<String, usize>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl CountingFetcher {
        fn new(table: &[(&str, &str, &[&str])]) -> Self {
            let pages = table
                .iter()
                .map(|(url, body, links)| (url.to_string(), Page::new(*body, links)))
                .collect();
            Self {
                inner: CannedFetcher::new(pages),
                delay: Duration::ZERO,
                counts: Mutex::new(HashMap::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn count(&self, url: &str) -> usize {
            self.counts.lock().unwrap().get(url).copied().unwrap_or(0)
        }

        fn total(&self) -> usize {
            self.counts.lock().unwrap().values().sum()
        }
    }

    #[async_trait]
    impl Fetcher for CountingFetcher {
        async fn fetch(&self, url: &str) -> Result<Page, FetchError> {
            *self.counts.lock().unwrap().entry(url.to_string()).or_default() += 1;

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.inner.fetch(url).await
        }
    }

    fn crawler_with_sink() -> (Arc<Crawler>, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let crawler = Arc::new(Crawler::new().with_sink(sink.clone()));
        (crawler, sink)
    }

    fn set(urls: &[&str]) -> HashSet<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }

    #[tokio::test]
    async fn test_small_graph_with_cycle() {
        let fetcher = Arc::new(CountingFetcher::new(&[
            ("A", "a", &["B", "C"]),
            ("B", "b", &["A"]),
            ("C", "c", &[]),
        ]));
        let (crawler, sink) = crawler_with_sink();

        crawler.crawl("A", 4, fetcher.clone()).await;

        assert_eq!(crawler.visited(), set(&["A", "B", "C"]));
        for url in ["A", "B", "C"] {
            assert_eq!(fetcher.count(url), 1, "{} fetched more than once", url);
        }
        let mut lines = sink.lines();
        lines.sort();
        assert_eq!(
            lines,
            vec![r#"found: A "a""#, r#"found: B "b""#, r#"found: C "c""#]
        );
    }

    #[tokio::test]
    async fn test_unknown_link_is_reported_and_not_followed() {
        let fetcher = Arc::new(CountingFetcher::new(&[("A", "a", &["B"])]));
        let (crawler, sink) = crawler_with_sink();

        crawler.crawl("A", 3, fetcher.clone()).await;

        assert_eq!(sink.lines(), vec![r#"found: A "a""#, "not found: B"]);
        assert_eq!(crawler.visited(), set(&["A", "B"]));
        assert_eq!(fetcher.total(), 2);
    }

    #[tokio::test]
    async fn test_depth_zero_is_a_no_op() {
        let fetcher = Arc::new(CountingFetcher::new(&[("A", "a", &["B"])]));
        let (crawler, sink) = crawler_with_sink();

        crawler.crawl("A", 0, fetcher.clone()).await;

        assert_eq!(fetcher.total(), 0);
        assert!(crawler.visited().is_empty());
        assert!(sink.lines().is_empty());
    }

    #[tokio::test]
    async fn test_depth_bounds_the_path_length() {
        let table: &[(&str, &str, &[&str])] = &[
            ("A", "a", &["B"]),
            ("B", "b", &["C"]),
            ("C", "c", &["D"]),
            ("D", "d", &[]),
        ];

        let fetcher = Arc::new(CountingFetcher::new(table));
        let (crawler, _sink) = crawler_with_sink();
        crawler.crawl("A", 2, fetcher.clone()).await;
        assert_eq!(crawler.visited(), set(&["A", "B"]));
        assert_eq!(fetcher.count("C"), 0);

        let fetcher = Arc::new(CountingFetcher::new(table));
        let (crawler, _sink) = crawler_with_sink();
        crawler.crawl("A", 3, fetcher.clone()).await;
        assert_eq!(crawler.visited(), set(&["A", "B", "C"]));
        assert!(!crawler.is_visited("D"));
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_siblings() {
        let fetcher = Arc::new(CountingFetcher::new(&[
            ("A", "a", &["X", "B"]),
            ("B", "b", &["C"]),
            ("C", "c", &[]),
        ]));
        let (crawler, sink) = crawler_with_sink();

        crawler.crawl("A", 5, fetcher.clone()).await;

        assert_eq!(crawler.visited(), set(&["A", "X", "B", "C"]));
        let lines = sink.lines();
        assert_eq!(lines.len(), 4);
        assert!(lines.contains(&"not found: X".to_string()));
        assert!(lines.contains(&r#"found: C "c""#.to_string()));
    }

    #[tokio::test]
    async fn test_failed_page_is_not_retried_on_another_path() {
        // Both A and B link to the missing page M
        let fetcher = Arc::new(CountingFetcher::new(&[
            ("A", "a", &["M", "B"]),
            ("B", "b", &["M"]),
        ]));
        let (crawler, sink) = crawler_with_sink();

        crawler.crawl("A", 4, fetcher.clone()).await;

        assert_eq!(fetcher.count("M"), 1);
        let failures = sink.lines().iter().filter(|l| l.starts_with("not found")).count();
        assert_eq!(failures, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shared_page_fetched_once_under_concurrency() {
        // Ten siblings all point at the same hub, and they run in parallel
        let mut table: Vec<(String, Vec<&str>)> = Vec::new();
        let leaves: Vec<String> = (0..10).map(|i| format!("L{}", i)).collect();
        for leaf in &leaves {
            table.push((leaf.clone(), vec!["HUB"]));
        }
        let mut pages: Vec<(&str, &str, &[&str])> = table
            .iter()
            .map(|(url, links)| (url.as_str(), "leaf", links.as_slice()))
            .collect();
        let leaf_refs: Vec<&str> = leaves.iter().map(String::as_str).collect();
        pages.push(("ROOT", "root", leaf_refs.as_slice()));
        pages.push(("HUB", "hub", &[]));

        let fetcher =
            Arc::new(CountingFetcher::new(&pages).with_delay(Duration::from_millis(10)));
        let (crawler, sink) = crawler_with_sink();

        crawler.crawl("ROOT", 3, fetcher.clone()).await;

        assert_eq!(fetcher.count("HUB"), 1);
        assert_eq!(fetcher.total(), 12);
        assert_eq!(sink.lines().len(), 12);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_max_concurrency_limits_fetches_in_flight() {
        let leaves: Vec<String> = (0..8).map(|i| format!("L{}", i)).collect();
        let leaf_refs: Vec<&str> = leaves.iter().map(String::as_str).collect();
        let mut pages: Vec<(&str, &str, &[&str])> = vec![("ROOT", "root", leaf_refs.as_slice())];
        for leaf in &leaf_refs {
            pages.push((*leaf, "leaf", &[]));
        }

        let fetcher =
            Arc::new(CountingFetcher::new(&pages).with_delay(Duration::from_millis(20)));
        let sink = Arc::new(MemorySink::new());
        let crawler = Arc::new(
            Crawler::new()
                .with_max_concurrency(2)
                .with_sink(sink.clone()),
        );

        crawler.crawl("ROOT", 2, fetcher.clone()).await;

        assert_eq!(crawler.visited_count(), 9);
        assert!(fetcher.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_single_permit_does_not_deadlock_deep_graph() {
        let fetcher = Arc::new(CountingFetcher::new(&[
            ("A", "a", &["B", "C"]),
            ("B", "b", &["D"]),
            ("C", "c", &["D"]),
            ("D", "d", &["A"]),
        ]));
        let crawler = Arc::new(
            Crawler::new()
                .with_max_concurrency(1)
                .with_sink(Arc::new(MemorySink::new())),
        );

        crawler.crawl("A", 10, fetcher.clone()).await;

        assert_eq!(crawler.visited(), set(&["A", "B", "C", "D"]));
        assert_eq!(fetcher.total(), 4);
    }

    #[tokio::test]
    async fn test_golang_tour() {
        let (crawler, sink) = crawler_with_sink();

        crawler
            .crawl("https://golang.org/", 4, Arc::new(CannedFetcher::golang_tour()))
            .await;

        assert_eq!(crawler.visited_count(), 5);
        let lines = sink.lines();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], r#"found: https://golang.org/ "The Go Programming Language""#);
        assert!(lines.contains(&"not found: https://golang.org/cmd/".to_string()));
    }

    #[tokio::test]
    async fn test_free_crawl_function_completes() {
        let fetcher = Arc::new(CountingFetcher::new(&[("A", "a", &["B"]), ("B", "b", &[])]));
        crawl("A", 2, fetcher.clone()).await;
        assert_eq!(fetcher.total(), 2);
    }

    #[tokio::test]
    async fn test_crawl_with_uses_configured_crawler() {
        let fetcher = Arc::new(CountingFetcher::new(&[("A", "a", &["B"]), ("B", "b", &[])]));
        let sink = Arc::new(MemorySink::new());

        crawl_with(
            Crawler::new().with_max_concurrency(1).with_sink(sink.clone()),
            "A",
            2,
            fetcher.clone(),
        )
        .await;

        assert_eq!(sink.lines(), vec![r#"found: A "a""#, r#"found: B "b""#]);
    }

    // Panics when asked for one particular URL
    struct PanickingFetcher {
        inner: CannedFetcher,
        panic_on: &'static str,
    }

    #[async_trait]
    impl Fetcher for PanickingFetcher {
        async fn fetch(&self, url: &str) -> Result<Page, FetchError> {
            if url == self.panic_on {
                panic!("fetcher blew up on {}", url);
            }
            self.inner.fetch(url).await
        }
    }

    #[tokio::test]
    async fn test_panicking_child_does_not_stop_siblings() {
        let mut pages = HashMap::new();
        pages.insert("A".to_string(), Page::new("a", &["P", "B"]));
        pages.insert("B".to_string(), Page::new("b", &[]));
        let fetcher = Arc::new(PanickingFetcher {
            inner: CannedFetcher::new(pages),
            panic_on: "P",
        });
        let sink = Arc::new(MemorySink::new());
        let crawler = Arc::new(
            Crawler::new()
                .with_max_concurrency(1)
                .with_sink(sink.clone()),
        );

        crawler.crawl("A", 3, fetcher).await;

        let mut lines = sink.lines();
        lines.sort();
        assert_eq!(lines, vec![r#"found: A "a""#, r#"found: B "b""#]);
        assert_eq!(crawler.visited(), set(&["A", "B", "P"]));
    }
}
