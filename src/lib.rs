//! # crawld
//!
//! A concurrent, same-domain web crawler behind a small HTTP control plane.
//!
//! Given a seed URL and a maximum traversal depth, the crawler fetches the
//! seed, discovers embedded links, restricts exploration to the seed's
//! host, honors the host's robot exclusion policy, rate-limits outbound
//! fetches globally, and builds a tree of discovered resources that the
//! control plane serves back as JSON.
//!
//! ## Example
//!
//! ```rust,ignore
//! use crawld::{api, Crawler};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let crawler = Crawler::new();
//!     crawler.crawl("https://example.com", 3).await?;
//!
//!     let app = api::router(crawler.clone());
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!
//!     crawler.close().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
mod config;
mod crawler;
mod error;
mod html;
mod queue;
mod resource;
mod robots;
mod stats;
mod throttle;
mod worker;

pub use config::{CrawlerBuilder, CrawlerConfig};
pub use crawler::Crawler;
pub use error::{CrawlError, Result};
pub use resource::Resource;
pub use stats::StatCollector;
pub use worker::{Worker, WorkerStatus};
