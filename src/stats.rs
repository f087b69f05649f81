//! # Statistics Module
//!
//! Collects metrics about the crawler's operation: how many resources were
//! enqueued and admitted, why the rest were dropped, and what came back
//! from the network.
//!
//! All counters are atomic so fetch tasks and the dispatch loop update them
//! without coordination. A snapshot feeds both the `Display` form logged at
//! shutdown and the JSON export.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Atomic counters describing a crawler's lifetime activity.
#[derive(Debug, serde::Serialize)]
pub struct StatCollector {
    #[serde(skip)]
    start_time: Instant,

    // Admission metrics
    pub resources_enqueued: AtomicUsize,
    pub resources_admitted: AtomicUsize,
    pub duplicates_dropped: AtomicUsize,
    pub depth_dropped: AtomicUsize,
    pub robots_denied: AtomicUsize,

    // Fetch metrics
    pub pages_fetched: AtomicUsize,
    pub fetch_failures: AtomicUsize,
    pub mime_rejects: AtomicUsize,
    pub links_discovered: AtomicUsize,
    pub total_bytes_downloaded: AtomicUsize,
    pub response_status_counts: Arc<dashmap::DashMap<u16, usize>>,
}

struct StatsSnapshot {
    resources_enqueued: usize,
    resources_admitted: usize,
    duplicates_dropped: usize,
    depth_dropped: usize,
    robots_denied: usize,
    pages_fetched: usize,
    fetch_failures: usize,
    mime_rejects: usize,
    links_discovered: usize,
    total_bytes_downloaded: usize,
    response_status_counts: HashMap<u16, usize>,
    elapsed: Duration,
}

impl StatsSnapshot {
    fn formatted_bytes(&self) -> String {
        const KB: usize = 1024;
        const MB: usize = 1024 * KB;

        if self.total_bytes_downloaded >= MB {
            format!("{:.2} MB", self.total_bytes_downloaded as f64 / MB as f64)
        } else if self.total_bytes_downloaded >= KB {
            format!("{:.2} KB", self.total_bytes_downloaded as f64 / KB as f64)
        } else {
            format!("{} B", self.total_bytes_downloaded)
        }
    }
}

impl StatCollector {
    pub(crate) fn new() -> Self {
        StatCollector {
            start_time: Instant::now(),
            resources_enqueued: AtomicUsize::new(0),
            resources_admitted: AtomicUsize::new(0),
            duplicates_dropped: AtomicUsize::new(0),
            depth_dropped: AtomicUsize::new(0),
            robots_denied: AtomicUsize::new(0),
            pages_fetched: AtomicUsize::new(0),
            fetch_failures: AtomicUsize::new(0),
            mime_rejects: AtomicUsize::new(0),
            links_discovered: AtomicUsize::new(0),
            total_bytes_downloaded: AtomicUsize::new(0),
            response_status_counts: Arc::new(dashmap::DashMap::new()),
        }
    }

    fn snapshot(&self) -> StatsSnapshot {
        let mut status_counts = HashMap::new();
        for entry in self.response_status_counts.iter() {
            let (key, value) = entry.pair();
            status_counts.insert(*key, *value);
        }

        StatsSnapshot {
            resources_enqueued: self.resources_enqueued.load(Ordering::SeqCst),
            resources_admitted: self.resources_admitted.load(Ordering::SeqCst),
            duplicates_dropped: self.duplicates_dropped.load(Ordering::SeqCst),
            depth_dropped: self.depth_dropped.load(Ordering::SeqCst),
            robots_denied: self.robots_denied.load(Ordering::SeqCst),
            pages_fetched: self.pages_fetched.load(Ordering::SeqCst),
            fetch_failures: self.fetch_failures.load(Ordering::SeqCst),
            mime_rejects: self.mime_rejects.load(Ordering::SeqCst),
            links_discovered: self.links_discovered.load(Ordering::SeqCst),
            total_bytes_downloaded: self.total_bytes_downloaded.load(Ordering::SeqCst),
            response_status_counts: status_counts,
            elapsed: self.start_time.elapsed(),
        }
    }

    pub(crate) fn increment_resources_enqueued(&self) {
        self.resources_enqueued.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_resources_admitted(&self) {
        self.resources_admitted.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_duplicates_dropped(&self) {
        self.duplicates_dropped.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_depth_dropped(&self) {
        self.depth_dropped.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_robots_denied(&self) {
        self.robots_denied.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_pages_fetched(&self) {
        self.pages_fetched.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_fetch_failures(&self) {
        self.fetch_failures.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_mime_rejects(&self) {
        self.mime_rejects.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_links_discovered(&self) {
        self.links_discovered.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_response_status(&self, status_code: u16) {
        *self.response_status_counts.entry(status_code).or_insert(0) += 1;
    }

    pub(crate) fn add_bytes_downloaded(&self, bytes: usize) {
        self.total_bytes_downloaded
            .fetch_add(bytes, Ordering::SeqCst);
    }

    /// Serializes the counters as a JSON string.
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Default for StatCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StatCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot();

        writeln!(f, "\nCrawl Statistics")?;
        writeln!(f, "----------------")?;
        writeln!(f, "  duration : {:?}", snapshot.elapsed)?;
        writeln!(
            f,
            "  admission: enqueued: {}, admitted: {}, dup: {}, depth: {}, robots: {}",
            snapshot.resources_enqueued,
            snapshot.resources_admitted,
            snapshot.duplicates_dropped,
            snapshot.depth_dropped,
            snapshot.robots_denied
        )?;
        writeln!(
            f,
            "  fetches  : pages: {}, failed: {}, non-html: {}, links: {}, downloaded: {}",
            snapshot.pages_fetched,
            snapshot.fetch_failures,
            snapshot.mime_rejects,
            snapshot.links_discovered,
            snapshot.formatted_bytes()
        )?;

        let status_string = if snapshot.response_status_counts.is_empty() {
            "none".to_string()
        } else {
            snapshot
                .response_status_counts
                .iter()
                .map(|(code, count)| format!("{}: {}", code, count))
                .collect::<Vec<String>>()
                .join(", ")
        };

        writeln!(f, "  status   : {}", status_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_and_render() {
        let stats = StatCollector::new();
        stats.increment_resources_enqueued();
        stats.increment_resources_admitted();
        stats.increment_pages_fetched();
        stats.record_response_status(200);
        stats.record_response_status(200);
        stats.add_bytes_downloaded(2048);

        let rendered = stats.to_string();
        assert!(rendered.contains("enqueued: 1"));
        assert!(rendered.contains("200: 2"));
        assert!(rendered.contains("2.00 KB"));

        let json = stats.to_json_string().unwrap();
        assert!(json.contains("\"pages_fetched\":1"));
    }
}
