//! # Crawler Module
//!
//! Implements the crawling engine that orchestrates the per-domain workers.
//!
//! ## Overview
//!
//! The crawler owns the worker registry, the bounded work queue, and the
//! global fetch throttle. A single dispatch loop drains the queue and runs
//! the admission gates; admitted resources are handed to fetch tasks that
//! run concurrently under the throttle. One quiescence detector per worker
//! decides when a crawl has finished.
//!
//! ## Key Components
//!
//! - **Crawler**: registry, dispatch loop, and the `crawl`/`worker`/`close`
//!   public surface
//! - **Fetch task**: content-type probe, GET, title and link extraction,
//!   tree attachment, child fan-out
//! - **Quiescence detector**: per-worker ticker promoting an idle crawl to
//!   complete

mod core;
mod detector;
mod fetch;

pub use self::core::Crawler;
