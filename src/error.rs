//! Unified error handling for the crawler.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Errors surfaced by the synchronous registration path.
///
/// Fetch-path failures are never represented here: a page that fails to
/// download is dropped and the crawl keeps going.
#[derive(Error, Debug)]
pub enum CrawlError {
    /// URL parsing failed
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// A crawl was requested for a seed that already has a worker
    #[error("domain is already registered/crawled")]
    DomainAlreadyRegistered,

    /// Transport failure while retrieving robots.txt
    #[error("robots.txt unavailable: {0}")]
    RobotsFetch(#[from] reqwest::Error),

    /// robots.txt endpoint answered with a server error
    #[error("robots.txt unavailable: server returned {0}")]
    RobotsStatus(StatusCode),

    /// The work queue has been closed by a shutdown
    #[error("work queue is closed")]
    QueueClosed,

    /// Invalid construction-time configuration
    #[error("invalid configuration: {0}")]
    Configuration(String),
}
