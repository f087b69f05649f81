//! Global fetch throttle: a counting semaphore of fixed capacity.
//!
//! One throttle bounds in-flight fetches process-wide, independent of which
//! worker a fetch belongs to. Permits are owned so they release on every
//! exit path of a fetch task.

use std::sync::Arc;

use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

pub(crate) struct Throttle {
    semaphore: Arc<Semaphore>,
}

impl Throttle {
    pub(crate) fn new(capacity: usize) -> Self {
        Throttle {
            semaphore: Arc::new(Semaphore::new(capacity)),
        }
    }

    /// Waits for a free slot. The permit releases the slot when dropped.
    pub(crate) async fn acquire(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        Arc::clone(&self.semaphore).acquire_owned().await
    }

    /// Number of slots currently free.
    #[cfg(test)]
    pub(crate) fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn permits_bound_concurrency_and_release_on_drop() {
        let throttle = Throttle::new(2);
        let first = throttle.acquire().await.unwrap();
        let _second = throttle.acquire().await.unwrap();
        assert_eq!(throttle.available(), 0);

        drop(first);
        assert_eq!(throttle.available(), 1);
        let _third = throttle.acquire().await.unwrap();
        assert_eq!(throttle.available(), 0);
    }
}
