// src/crawl/report.rs
// =============================================================================
// Where the crawler reports what it did.
//
// Every newly visited page produces exactly one line:
// - success: `found: <url> "<body>"`
// - failure: the error message, e.g. `not found: <url>`
//
// Lines from concurrent branches interleave in whatever order the tasks run,
// so nothing should depend on their order.
// =============================================================================

use crate::fetch::FetchError;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

// Receives one call per visited page. Shared by all crawl tasks.
pub trait ReportSink: Send + Sync {
    fn found(&self, url: &str, body: &str);
    fn failed(&self, error: &FetchError);
}

// Prints report lines to standard output.
//
// Write errors are ignored: a closed pipe (`web-crawler demo | head -1`)
// must not bring the crawl down.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl ReportSink for StdoutSink {
    fn found(&self, url: &str, body: &str) {
        write_line(&mut io::stdout().lock(), &found_line(url, body));
    }

    fn failed(&self, error: &FetchError) {
        write_line(&mut io::stdout().lock(), &error.to_string());
    }
}

fn write_line(out: &mut impl Write, line: &str) {
    if let Err(e) = writeln!(out, "{}", line) {
        tracing::debug!("Dropped report line: {}", e);
    }
}

// Keeps report lines in memory so they can be inspected afterwards
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    // Copy of every line reported so far, in arrival order
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, line: String) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
    }
}

impl ReportSink for MemorySink {
    fn found(&self, url: &str, body: &str) {
        self.push(found_line(url, body));
    }

    fn failed(&self, error: &FetchError) {
        self.push(error.to_string());
    }
}

// `{:?}` on a str quotes and escapes it
fn found_line(url: &str, body: &str) -> String {
    format!("found: {} {:?}", url, body)
}
