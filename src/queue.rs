//! Bounded, closeable work queue carrying resources from discovery to fetch.
//!
//! Wraps a bounded `kanal` channel plus an atomic `closed` flag. The
//! dispatch loop is the only consumer; producers (the seeding path and
//! fetch tasks enqueuing children) observe the flag before sending so a
//! shutdown never races a send into a closed channel.

use std::sync::atomic::{AtomicBool, Ordering};

use kanal::{bounded_async, AsyncReceiver, AsyncSender, ReceiveError};

use crate::error::{CrawlError, Result};
use crate::resource::Resource;

pub(crate) struct Queue {
    tx: AsyncSender<Resource>,
    rx: AsyncReceiver<Resource>,
    closed: AtomicBool,
}

impl Queue {
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded_async(capacity);
        Queue {
            tx,
            rx,
            closed: AtomicBool::new(false),
        }
    }

    /// Whether the queue has been closed by a shutdown.
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Sends a resource to the dispatch loop, blocking while the buffer is
    /// full.
    pub(crate) async fn push(&self, resource: Resource) -> Result<()> {
        if self.is_closed() {
            return Err(CrawlError::QueueClosed);
        }
        self.tx
            .send(resource)
            .await
            .map_err(|_| CrawlError::QueueClosed)
    }

    /// Receives the next resource. Single-consumer: only the dispatch loop
    /// calls this.
    pub(crate) async fn pop(&self) -> std::result::Result<Resource, ReceiveError> {
        self.rx.recv().await
    }

    /// Marks the queue closed and closes the underlying channel. Later
    /// sends fail; the flag is observed by producers before they try.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let _ = self.tx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[tokio::test]
    async fn push_then_pop_round_trips() {
        let queue = Queue::new(4);
        let seed = Resource::seed(Url::parse("https://example.com").unwrap());
        queue.push(seed).await.unwrap();
        let received = queue.pop().await.unwrap();
        assert_eq!(received.url_string, "https://example.com/");
    }

    #[tokio::test]
    async fn push_after_close_is_rejected() {
        let queue = Queue::new(4);
        queue.close();
        assert!(queue.is_closed());
        let seed = Resource::seed(Url::parse("https://example.com").unwrap());
        assert!(matches!(
            queue.push(seed).await,
            Err(CrawlError::QueueClosed)
        ));
    }
}
