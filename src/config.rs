//! # Configuration Module
//!
//! Provides `CrawlerConfig` and the fluent `CrawlerBuilder` used to
//! construct and configure [`Crawler`](crate::Crawler) instances.
//!
//! ## Overview
//!
//! The builder assembles the crawler's tunables before the dispatch loop
//! starts: the user agent presented to remote hosts, the global fetch
//! throttle, the work queue capacity, the default traversal depth, and the
//! idle window after which a crawl is declared complete. All of them have
//! conservative defaults so `Crawler::new()` works out of the box.
//!
//! ## Example
//!
//! ```rust,ignore
//! use crawld::CrawlerBuilder;
//! use std::time::Duration;
//!
//! let crawler = CrawlerBuilder::new()
//!     .throttle_capacity(8)
//!     .quiescence_window(Duration::from_secs(5))
//!     .build()?;
//! crawler.crawl("https://example.com", 3).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::crawler::Crawler;
use crate::error::{CrawlError, Result};

/// Default user agent string sent with every outbound request.
pub const DEFAULT_USER_AGENT: &str = "GoCrawler/v0.1 (+https://github.com/q/gocrawler)";

/// Default number of concurrently executing fetches, process-wide.
pub const DEFAULT_THROTTLE_CAPACITY: usize = 20;

/// Default capacity of the buffered work queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Default maximum traversal depth, substituted when a client passes 0.
pub const DEFAULT_MAX_CRAWL_DEPTH: usize = 5;

/// Default idle window after which a crawl is considered complete.
pub const DEFAULT_QUIESCENCE_WINDOW: Duration = Duration::from_secs(15);

/// Default per-request timeout for the shared HTTP client.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Construction-time settings for a [`Crawler`].
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// User agent presented to remote hosts and matched against robots.txt.
    pub user_agent: String,
    /// Upper bound on concurrently executing fetches.
    pub throttle_capacity: usize,
    /// Capacity of the buffered work queue.
    pub queue_capacity: usize,
    /// Depth substituted when a crawl is requested with depth 0.
    pub max_crawl_depth: usize,
    /// Idle window after which a worker is promoted to complete.
    pub quiescence_window: Duration,
    /// Per-request timeout for the shared HTTP client.
    pub request_timeout: Duration,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        CrawlerConfig {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            throttle_capacity: DEFAULT_THROTTLE_CAPACITY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_crawl_depth: DEFAULT_MAX_CRAWL_DEPTH,
            quiescence_window: DEFAULT_QUIESCENCE_WINDOW,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Fluent builder for [`Crawler`] instances.
pub struct CrawlerBuilder {
    config: CrawlerConfig,
    http_client: Option<reqwest::Client>,
}

impl Default for CrawlerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlerBuilder {
    /// Creates a builder initialized with the default configuration.
    pub fn new() -> Self {
        CrawlerBuilder {
            config: CrawlerConfig::default(),
            http_client: None,
        }
    }

    /// Sets the user agent sent with every outbound request.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Sets the upper bound on concurrently executing fetches.
    pub fn throttle_capacity(mut self, capacity: usize) -> Self {
        self.config.throttle_capacity = capacity;
        self
    }

    /// Sets the capacity of the buffered work queue.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Sets the depth substituted when a crawl is requested with depth 0.
    pub fn max_crawl_depth(mut self, depth: usize) -> Self {
        self.config.max_crawl_depth = depth;
        self
    }

    /// Sets the idle window after which a worker is promoted to complete.
    pub fn quiescence_window(mut self, window: Duration) -> Self {
        self.config.quiescence_window = window;
        self
    }

    /// Sets the per-request timeout for the shared HTTP client.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Supplies a pre-built HTTP client instead of the default one.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Validates the configuration and builds the `Crawler`, starting its
    /// dispatch loop. Performs no I/O.
    pub fn build(self) -> Result<Arc<Crawler>> {
        if self.config.throttle_capacity == 0 {
            return Err(CrawlError::Configuration(
                "throttle_capacity must be greater than 0".to_string(),
            ));
        }
        if self.config.queue_capacity == 0 {
            return Err(CrawlError::Configuration(
                "queue_capacity must be greater than 0".to_string(),
            ));
        }
        if self.config.max_crawl_depth == 0 {
            return Err(CrawlError::Configuration(
                "max_crawl_depth must be greater than 0".to_string(),
            ));
        }

        let http_client = match self.http_client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .user_agent(&self.config.user_agent)
                .timeout(self.config.request_timeout)
                .gzip(true)
                .build()
                .map_err(|e| CrawlError::Configuration(e.to_string()))?,
        };

        Ok(Crawler::start(self.config, http_client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = CrawlerConfig::default();
        assert_eq!(config.throttle_capacity, 20);
        assert_eq!(config.queue_capacity, 100);
        assert_eq!(config.max_crawl_depth, 5);
        assert_eq!(config.quiescence_window, Duration::from_secs(15));
        assert!(config.user_agent.starts_with("GoCrawler/"));
    }

    #[tokio::test]
    async fn zero_throttle_is_rejected() {
        let built = CrawlerBuilder::new().throttle_capacity(0).build();
        assert!(matches!(built, Err(CrawlError::Configuration(_))));
    }

    #[tokio::test]
    async fn zero_queue_capacity_is_rejected() {
        let built = CrawlerBuilder::new().queue_capacity(0).build();
        assert!(matches!(built, Err(CrawlError::Configuration(_))));
    }
}
