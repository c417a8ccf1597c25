//! Control loop admitting queued requests into the worker pool.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::domain::ports::ImageDecoder;

use super::delivery::DeliveryChannel;
use super::memory_cache::ResultCache;
use super::request_queue::RequestQueue;
use super::worker_pool::{DecodeTask, WorkerPool};

/// Sole consumer of the request queue.
///
/// Each turn waits for work, claims a budget unit, then takes the next request
/// in queue order. Taking the request only after a slot is free means the
/// discipline decides among everything queued at the moment a worker frees up.
pub struct Dispatcher {
    queue: Arc<RequestQueue>,
    pool: Arc<WorkerPool>,
    decoder: Arc<dyn ImageDecoder>,
    cache: Arc<ResultCache>,
    delivery: DeliveryChannel,
}

impl Dispatcher {
    /// Creates a dispatcher over shared engine state.
    #[must_use]
    pub fn new(
        queue: Arc<RequestQueue>,
        pool: Arc<WorkerPool>,
        decoder: Arc<dyn ImageDecoder>,
        cache: Arc<ResultCache>,
        delivery: DeliveryChannel,
    ) -> Self {
        Self {
            queue,
            pool,
            decoder,
            cache,
            delivery,
        }
    }

    /// Starts the loop on the current tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs until the worker pool is closed.
    pub async fn run(self) {
        debug!(
            workers = self.pool.size(),
            discipline = %self.queue.discipline(),
            "Dispatcher started"
        );

        loop {
            self.queue.wait_non_empty().await;

            let Some(permit) = self.pool.acquire().await else {
                break;
            };

            let Some(request) = self.queue.try_pop_next() else {
                continue;
            };

            trace!(
                key = %request.key,
                target = %request.target,
                queued = self.queue.len(),
                "Admitting request"
            );

            let task = DecodeTask {
                request,
                decoder: Arc::clone(&self.decoder),
                cache: Arc::clone(&self.cache),
                delivery: self.delivery.clone(),
            };
            drop(self.pool.submit(permit, task));
        }

        debug!("Dispatcher stopped");
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("queue", &self.queue)
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::domain::entities::{ContentKey, Dimensions, LoadRequest};
    use crate::domain::ports::SinkHandle;
    use crate::domain::ports::mocks::MockDecoder;
    use crate::infrastructure::image::delivery::delivery_channel;
    use crate::infrastructure::image::request_queue::QueueDiscipline;

    async fn eventually(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition reached in time");
    }

    fn request(key: &str) -> LoadRequest {
        LoadRequest::new(
            ContentKey::from(key),
            Dimensions::new(10, 10),
            SinkHandle::detached(),
        )
    }

    /// Runs one blocking request, queues a, b, c behind it, then releases
    /// the worker and returns the order decodes started in.
    async fn admission_order(discipline: QueueDiscipline) -> Vec<String> {
        let queue = Arc::new(RequestQueue::new(discipline));
        let pool = Arc::new(WorkerPool::new(1));
        let decoder = Arc::new(MockDecoder::new(4, 4).gated());
        let cache = Arc::new(ResultCache::new(1 << 20));
        let (delivery, _rx) = delivery_channel();

        let handle = Dispatcher::new(
            Arc::clone(&queue),
            Arc::clone(&pool),
            decoder.clone(),
            cache,
            delivery,
        )
        .spawn();

        queue.push(request("busy"));
        eventually(|| decoder.started() == 1).await;

        for key in ["a", "b", "c"] {
            queue.push(request(key));
        }
        decoder.open_gate();
        eventually(|| decoder.started() == 4 && pool.is_idle()).await;

        pool.close();
        handle.abort();
        decoder.decoded().iter().map(ToString::to_string).collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_lifo_admits_newest_when_slot_frees() {
        assert_eq!(
            admission_order(QueueDiscipline::Lifo).await,
            ["busy", "c", "b", "a"]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_fifo_admits_oldest_when_slot_frees() {
        assert_eq!(
            admission_order(QueueDiscipline::Fifo).await,
            ["busy", "a", "b", "c"]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_never_exceeds_worker_budget() {
        let queue = Arc::new(RequestQueue::new(QueueDiscipline::Lifo));
        let pool = Arc::new(WorkerPool::new(2));
        let decoder = Arc::new(MockDecoder::new(4, 4).gated());
        let (delivery, _rx) = delivery_channel();

        let handle = Dispatcher::new(
            Arc::clone(&queue),
            Arc::clone(&pool),
            decoder.clone(),
            Arc::new(ResultCache::new(1 << 20)),
            delivery,
        )
        .spawn();

        for i in 0..6 {
            queue.push(request(&format!("k{i}")));
        }
        eventually(|| decoder.started() == 2).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(decoder.started(), 2);
        assert_eq!(queue.len(), 4);

        decoder.open_gate();
        eventually(|| decoder.started() == 6 && pool.is_idle()).await;
        assert!(queue.is_empty());

        pool.close();
        handle.abort();
    }

    #[tokio::test]
    async fn test_stops_when_pool_closed() {
        let queue = Arc::new(RequestQueue::new(QueueDiscipline::Fifo));
        let pool = Arc::new(WorkerPool::new(1));
        let (delivery, _rx) = delivery_channel();
        pool.close();

        let handle = Dispatcher::new(
            Arc::clone(&queue),
            pool,
            Arc::new(MockDecoder::new(1, 1)),
            Arc::new(ResultCache::new(0)),
            delivery,
        )
        .spawn();
        queue.push(request("never"));

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("dispatcher exited")
            .expect("dispatcher joined");
        assert_eq!(queue.len(), 1);
    }
}
