//! # Worker Module
//!
//! Per-seed crawl state: the visited-URL tracker, depth bound, robots
//! policy, result tree, and the counters that drive completion detection.
//!
//! ## Overview
//!
//! A `Worker` is created by [`Crawler::crawl`](crate::Crawler::crawl) after
//! a successful robots.txt retrieval and lives for the remainder of the
//! process. Fetch tasks mutate it concurrently: the tracker is guarded by a
//! mutex, the tree by its own mutex, and the status by an atomic so the
//! HTTP layer can read it without locking. The in-flight fetch counter
//! follows the same idle-detection pattern the dispatch loop relies on
//! during shutdown.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::trace;
use url::Url;

use crate::resource::Resource;
use crate::robots::RobotsPolicy;

/// Lifecycle state of a worker's crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerStatus {
    /// Registered, nothing fetched yet.
    Initialised = 0,
    /// At least one fetch has entered the GET phase.
    InProgress = 1,
    /// No tree update within the quiescence window.
    Complete = 2,
    /// Reserved; not set by the fetch path.
    Error = 3,
}

impl WorkerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerStatus::Initialised => "initialised",
            WorkerStatus::InProgress => "in-progress",
            WorkerStatus::Complete => "complete",
            WorkerStatus::Error => "error",
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => WorkerStatus::InProgress,
            2 => WorkerStatus::Complete,
            3 => WorkerStatus::Error,
            _ => WorkerStatus::Initialised,
        }
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for WorkerStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Per-seed crawl state.
pub struct Worker {
    seed: Url,
    crawl_depth: usize,
    robots: RobotsPolicy,
    tracker: Mutex<HashSet<String>>,
    status: AtomicU8,
    tree: Mutex<Option<Resource>>,
    last_updated: Mutex<Instant>,
    in_flight: AtomicUsize,
}

impl Worker {
    pub(crate) fn new(seed: Url, crawl_depth: usize, robots: RobotsPolicy) -> Self {
        Worker {
            seed,
            crawl_depth,
            robots,
            tracker: Mutex::new(HashSet::new()),
            status: AtomicU8::new(WorkerStatus::Initialised as u8),
            tree: Mutex::new(None),
            last_updated: Mutex::new(Instant::now()),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// The seed URL this worker was registered under.
    pub fn seed(&self) -> &Url {
        &self.seed
    }

    /// The effective maximum traversal depth.
    pub fn crawl_depth(&self) -> usize {
        self.crawl_depth
    }

    /// Current lifecycle state. May be momentarily stale; callers in the
    /// HTTP layer tolerate that.
    pub fn status(&self) -> WorkerStatus {
        WorkerStatus::from_u8(self.status.load(Ordering::SeqCst))
    }

    pub(crate) fn set_status(&self, status: WorkerStatus) {
        self.status.store(status as u8, Ordering::SeqCst);
    }

    /// Records `url` as admitted, reporting whether it had been seen before.
    ///
    /// Check-and-insert under the tracker mutex; the full URL string is the
    /// identity, so fragment or trailing-slash variants count as distinct.
    pub(crate) fn visited(&self, url: &str) -> bool {
        let mut tracker = self.tracker.lock();
        if tracker.contains(url) {
            return true;
        }
        tracker.insert(url.to_string());
        false
    }

    /// Whether the robots policy permits fetching `url`.
    pub(crate) fn allows(&self, url: &Url) -> bool {
        self.robots.allows(url)
    }

    /// Attaches a fetched resource at the correct leaf of the tree.
    ///
    /// The first attachment becomes the root. Later attachments walk the
    /// ancestry path from the root, scanning children in insertion order;
    /// a resource whose ancestor chain cannot be resolved is dropped.
    pub(crate) fn attach(&self, resource: Resource) {
        let mut tree = self.tree.lock();
        *self.last_updated.lock() = Instant::now();

        let Some(root) = tree.as_mut() else {
            *tree = Some(resource);
            return;
        };

        if resource.parent.len() == 1 && resource.parent[0] == root.url_string {
            root.nodes.push(resource);
            return;
        }

        let mut node = root;
        for ancestor in resource.parent.iter().skip(1) {
            match node.nodes.iter_mut().find(|n| n.url_string == *ancestor) {
                Some(next) => node = next,
                None => {
                    trace!(url = %resource.url_string, "no leaf found for resource, dropping");
                    return;
                }
            }
        }
        node.nodes.push(resource);
    }

    /// Serializes the tree for the control plane, or `None` before the seed
    /// fetch has landed.
    pub fn tree_json(&self) -> Option<serde_json::Value> {
        let tree = self.tree.lock();
        tree.as_ref().and_then(|root| serde_json::to_value(root).ok())
    }

    /// Time since the last tree insertion (or since registration).
    pub(crate) fn idle_for(&self) -> Duration {
        self.last_updated.lock().elapsed()
    }

    /// Registers an outstanding fetch; the returned guard releases it.
    pub(crate) fn track_fetch(self: Arc<Self>) -> FetchGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        FetchGuard { worker: self }
    }

    /// Whether no fetch tasks are outstanding for this worker.
    pub fn is_idle(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) == 0
    }
}

/// Guard tying a fetch task's lifetime to its worker's in-flight counter.
pub(crate) struct FetchGuard {
    worker: Arc<Worker>,
}

impl Drop for FetchGuard {
    fn drop(&mut self) {
        self.worker.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_worker(depth: usize) -> Arc<Worker> {
        let seed = Url::parse("https://example.com").unwrap();
        Arc::new(Worker::new(seed, depth, RobotsPolicy::allow_all()))
    }

    fn page(url: &str, parent: Vec<&str>, root: &Url) -> Resource {
        let depth = parent.len() + 1;
        Resource::child(
            Url::parse(url).unwrap(),
            root.clone(),
            parent.into_iter().map(String::from).collect(),
            depth,
        )
    }

    #[test]
    fn tracker_reports_first_sighting_only() {
        let worker = test_worker(5);
        assert!(!worker.visited("https://example.com/"));
        assert!(worker.visited("https://example.com/"));
        // fragment variants are distinct identities
        assert!(!worker.visited("https://example.com/#top"));
    }

    #[test]
    fn first_attachment_becomes_the_root() {
        let worker = test_worker(5);
        let root = Url::parse("https://example.com").unwrap();
        worker.attach(Resource::seed(root));

        let tree = worker.tree_json().unwrap();
        assert_eq!(tree["url"], "https://example.com/");
        assert!(tree["nodes"].as_array().unwrap().is_empty());
    }

    #[test]
    fn children_attach_under_their_ancestors_in_order() {
        let worker = test_worker(5);
        let root = Url::parse("https://example.com").unwrap();
        worker.attach(Resource::seed(root.clone()));

        worker.attach(page(
            "https://example.com/a",
            vec!["https://example.com/"],
            &root,
        ));
        worker.attach(page(
            "https://example.com/b",
            vec!["https://example.com/"],
            &root,
        ));
        worker.attach(page(
            "https://example.com/a/1",
            vec!["https://example.com/", "https://example.com/a"],
            &root,
        ));

        let tree = worker.tree_json().unwrap();
        let nodes = tree["nodes"].as_array().unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0]["url"], "https://example.com/a");
        assert_eq!(nodes[1]["url"], "https://example.com/b");
        let grandchildren = nodes[0]["nodes"].as_array().unwrap();
        assert_eq!(grandchildren.len(), 1);
        assert_eq!(grandchildren[0]["url"], "https://example.com/a/1");
    }

    #[test]
    fn orphaned_resource_is_dropped() {
        let worker = test_worker(5);
        let root = Url::parse("https://example.com").unwrap();
        worker.attach(Resource::seed(root.clone()));

        worker.attach(page(
            "https://example.com/deep/leaf",
            vec!["https://example.com/", "https://example.com/missing"],
            &root,
        ));

        let tree = worker.tree_json().unwrap();
        assert!(tree["nodes"].as_array().unwrap().is_empty());
    }

    #[test]
    fn status_round_trips_through_the_atomic() {
        let worker = test_worker(5);
        assert_eq!(worker.status(), WorkerStatus::Initialised);
        worker.set_status(WorkerStatus::InProgress);
        assert_eq!(worker.status(), WorkerStatus::InProgress);
        worker.set_status(WorkerStatus::Complete);
        assert_eq!(worker.status(), WorkerStatus::Complete);
    }

    #[test]
    fn status_serializes_to_its_wire_name() {
        assert_eq!(
            serde_json::to_value(WorkerStatus::InProgress).unwrap(),
            "in-progress"
        );
        assert_eq!(
            serde_json::to_value(WorkerStatus::Initialised).unwrap(),
            "initialised"
        );
    }

    #[test]
    fn fetch_guard_releases_on_drop() {
        let worker = test_worker(5);
        assert!(worker.is_idle());
        let guard = Arc::clone(&worker).track_fetch();
        assert!(!worker.is_idle());
        drop(guard);
        assert!(worker.is_idle());
    }
}
