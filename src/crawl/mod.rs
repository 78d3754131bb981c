// src/crawl/mod.rs
// =============================================================================
// This module handles crawling a graph of linked pages.
//
// Features:
// - Concurrent fan-out: one task per discovered link
// - Configurable depth limit
// - Every page fetched at most once per crawl, even when many pages link to it
// - Optional cap on how many fetches run at the same time
// - Per-page failures are reported, never fatal
//
// Submodules:
// - crawler: The traversal itself and the visited set
// - report: Where "found" / error lines are sent
// =============================================================================

mod crawler;
mod report;

pub use crawler::{crawl, crawl_with, Crawler};
pub use report::{MemorySink, ReportSink, StdoutSink};
