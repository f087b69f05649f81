//! The `Resource` record: one discovered page and its place in the tree.
//!
//! A resource is immutable once enqueued; the fetch pipeline fills in the
//! title and status code before attaching it to its worker's tree. The
//! ancestry path (`parent`) runs from the seed toward the immediate parent,
//! inclusive of the seed and exclusive of the resource itself, so its length
//! is always `depth - 1`.

use std::time::SystemTime;

use serde::Serialize;
use url::Url;

/// A single discovered page and its child nodes.
#[derive(Debug, Clone, Serialize)]
pub struct Resource {
    /// Parsed absolute URL of the page.
    #[serde(skip)]
    pub url: Url,

    /// Canonical string form of `url`.
    #[serde(rename = "url")]
    pub url_string: String,

    /// Extracted `<title>` text, possibly empty.
    pub title: String,

    /// Status code of the GET response.
    #[serde(rename = "status")]
    pub http_status_code: u16,

    /// Seed URL of the owning worker.
    #[serde(skip)]
    pub root: Url,

    /// Ancestry path from the seed toward the immediate parent.
    #[serde(skip)]
    pub parent: Vec<String>,

    /// 1 for the seed, parent depth + 1 otherwise.
    pub depth: usize,

    /// Child resources, in attachment order.
    pub nodes: Vec<Resource>,

    /// Wall-clock timestamp of enqueue.
    #[serde(skip)]
    pub last_fetched: SystemTime,
}

impl Resource {
    /// Builds the depth-1 seed resource for a crawl.
    pub fn seed(url: Url) -> Self {
        let url_string = url.to_string();
        Resource {
            root: url.clone(),
            url,
            url_string,
            title: String::new(),
            http_status_code: 0,
            parent: Vec::new(),
            depth: 1,
            nodes: Vec::new(),
            last_fetched: SystemTime::now(),
        }
    }

    /// Builds a child resource discovered under `parent` ancestry.
    pub fn child(url: Url, root: Url, parent: Vec<String>, depth: usize) -> Self {
        let url_string = url.to_string();
        Resource {
            url,
            url_string,
            title: String::new(),
            http_status_code: 0,
            root,
            parent,
            depth,
            nodes: Vec::new(),
            last_fetched: SystemTime::now(),
        }
    }
}
