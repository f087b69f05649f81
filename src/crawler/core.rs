//! The central `Crawler`: worker registry, dispatch loop, and shutdown.
//!
//! The crawler ties the queue, throttle, and workers together. Seeding a
//! crawl is the only synchronous, fallible path; everything downstream of
//! admission absorbs its own failures so one flaky page never fails the
//! whole traversal.
//!
//! The dispatch loop is the sole consumer of the work queue. Keeping
//! admission on one task means the visited-set check needs no coordination
//! beyond each worker's own check-and-insert.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use kanal::{bounded_async, AsyncReceiver, AsyncSender};
use reqwest::header::USER_AGENT;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, error, info, trace};
use url::Url;

use crate::config::CrawlerConfig;
use crate::error::{CrawlError, Result};
use crate::queue::Queue;
use crate::resource::Resource;
use crate::robots::RobotsPolicy;
use crate::stats::StatCollector;
use crate::throttle::Throttle;
use crate::worker::Worker;

use super::{detector, fetch};

/// A collection of workers that crawl their respective domains.
pub struct Crawler {
    pub(crate) config: CrawlerConfig,
    pub(crate) http: reqwest::Client,
    pub(crate) queue: Queue,
    pub(crate) throttle: Throttle,
    pub(crate) stats: Arc<StatCollector>,
    workers: DashMap<String, Arc<Worker>>,
    register_lock: Mutex<()>,
    stop_tx: AsyncSender<oneshot::Sender<()>>,
}

impl Crawler {
    /// Creates a crawler with the default configuration and starts its
    /// dispatch loop. Performs no I/O.
    pub fn new() -> Arc<Self> {
        crate::CrawlerBuilder::new()
            .build()
            .expect("default configuration is valid")
    }

    pub(crate) fn start(config: CrawlerConfig, http: reqwest::Client) -> Arc<Self> {
        let (stop_tx, stop_rx) = bounded_async(1);

        let crawler = Arc::new(Crawler {
            queue: Queue::new(config.queue_capacity),
            throttle: Throttle::new(config.throttle_capacity),
            stats: Arc::new(StatCollector::new()),
            workers: DashMap::new(),
            register_lock: Mutex::new(()),
            stop_tx,
            config,
            http,
        });

        let dispatcher = Arc::clone(&crawler);
        tokio::spawn(dispatcher.dispatch_loop(stop_rx));

        crawler
    }

    /// Registers a crawl for `raw_url`, bounded by `depth` levels.
    ///
    /// Looks up the seed's robots.txt, registers a worker under the seed's
    /// canonical string form, starts its quiescence detector, and enqueues
    /// the depth-1 seed resource. A `depth` of 0 selects the configured
    /// default. Registrations are serialized; a second crawl for the same
    /// seed fails with [`CrawlError::DomainAlreadyRegistered`]. A parsed
    /// robots.txt that declares no group for the configured agent abandons
    /// the registration silently: the call succeeds but no worker exists.
    pub async fn crawl(&self, raw_url: &str, depth: usize) -> Result<()> {
        let _registration = self.register_lock.lock().await;

        let seed = Url::parse(raw_url)?;
        let key = seed.to_string();

        if self.workers.contains_key(&key) {
            return Err(CrawlError::DomainAlreadyRegistered);
        }

        let robots_url = seed.join("/robots.txt")?;
        debug!(%robots_url, "retrieving robot exclusion policy");
        let response = self
            .http
            .get(robots_url)
            .header(USER_AGENT, &self.config.user_agent)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        let Some(robots) = RobotsPolicy::from_response(status, body, &self.config.user_agent)?
        else {
            // No group applies to our agent: abandon the registration
            // without surfacing an error, leaving no worker behind.
            debug!(seed = %key, "robots.txt defines no group for the configured agent, skipping");
            return Ok(());
        };

        let depth = if depth == 0 {
            self.config.max_crawl_depth
        } else {
            depth
        };

        let worker = Arc::new(Worker::new(seed.clone(), depth, robots));
        self.workers.insert(key.clone(), Arc::clone(&worker));
        detector::spawn(worker, self.config.quiescence_window);
        info!(seed = %key, depth, "registered domain for crawling");

        self.stats.increment_resources_enqueued();
        self.queue.push(Resource::seed(seed)).await?;
        Ok(())
    }

    /// Looks up the worker registered under `domain`, the exact canonical
    /// string form used at registration.
    pub fn worker(&self, domain: &str) -> Option<Arc<Worker>> {
        self.workers.get(domain).map(|entry| Arc::clone(entry.value()))
    }

    /// The crawler's lifetime statistics.
    pub fn stats(&self) -> Arc<StatCollector> {
        Arc::clone(&self.stats)
    }

    /// Stops the dispatch loop, closes the queue, and waits for in-flight
    /// fetches to drain.
    pub async fn close(&self) -> Result<()> {
        info!("close requested, stopping dispatch loop");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.stop_tx
            .send(reply_tx)
            .await
            .map_err(|_| CrawlError::QueueClosed)?;
        let _ = reply_rx.await;

        info!("dispatch loop stopped, waiting for crawlers to drain");
        let workers: Vec<Arc<Worker>> = self
            .workers
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for worker in workers {
            while !worker.is_idle() {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }

        info!("shut down complete");
        info!("{}", self.stats);
        Ok(())
    }

    /// Drains the work queue and runs admission for each resource until a
    /// stop signal arrives. Single consumer of the queue channel.
    async fn dispatch_loop(self: Arc<Self>, stop_rx: AsyncReceiver<oneshot::Sender<()>>) {
        trace!("dispatch loop started");
        loop {
            tokio::select! {
                received = self.queue.pop() => match received {
                    Ok(resource) => self.admit(resource),
                    Err(_) => {
                        trace!("work channel closed, exiting dispatch loop");
                        break;
                    }
                },
                stopped = stop_rx.recv() => {
                    if let Ok(reply) = stopped {
                        self.queue.close();
                        let _ = reply.send(());
                    }
                    break;
                }
            }
        }
        trace!("dispatch loop finished");
    }

    /// Admission: gates a dequeued resource and spawns its fetch task.
    ///
    /// Rejections are silent except for robots denials. The visited check
    /// runs before the robots gate, so a denied URL stays recorded and
    /// later sightings drop without re-logging.
    fn admit(self: &Arc<Self>, resource: Resource) {
        if self.queue.is_closed() {
            return;
        }

        let Some(worker) = self.worker(&resource.root.to_string()) else {
            trace!(url = %resource.url_string, "no worker registered for resource root, dropping");
            return;
        };

        if worker.visited(&resource.url_string) {
            self.stats.increment_duplicates_dropped();
            return;
        }

        if resource.depth > worker.crawl_depth() {
            self.stats.increment_depth_dropped();
            return;
        }

        if !worker.allows(&resource.url) {
            error!(
                "robots.txt policy does not allow path to be crawled: {}",
                resource.url_string
            );
            self.stats.increment_robots_denied();
            return;
        }

        trace!(url = %resource.url_string, depth = resource.depth, "resource admitted");
        self.stats.increment_resources_admitted();
        let guard = Arc::clone(&worker).track_fetch();
        tokio::spawn(fetch::fetch(Arc::clone(self), worker, resource, guard));
    }
}
