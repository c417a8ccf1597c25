//! Async image loading service.
//!
//! Ties together the result cache, the request queue, the dispatcher and the
//! worker pool. Results come back through a [`DeliveryReceiver`] owned by the
//! caller's context.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use crate::domain::entities::{ContentKey, DecodedImage, Dimensions, LoadRequest};
use crate::domain::errors::LoaderError;
use crate::domain::ports::{ImageDecoder, ImageSink, SinkHandle, ViewSizeResolver};

use super::delivery::{DeliveryChannel, DeliveryReceiver, delivery_channel};
use super::dispatcher::Dispatcher;
use super::downsampler::Downsampler;
use super::memory_cache::{CacheStats, DEFAULT_MEMORY_BUDGET, ResultCache, capacity_for_budget};
use super::request_queue::{QueueDiscipline, RequestQueue};
use super::view_size::FallbackSizeResolver;
use super::worker_pool::WorkerPool;

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Configuration for the image loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Maximum concurrent decodes.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Order queued requests are admitted in.
    #[serde(default)]
    pub queue_discipline: QueueDiscipline,
    /// Maximum bytes of decoded pixels kept in memory.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity_bytes: usize,
}

fn default_worker_count() -> usize {
    3
}

fn default_cache_capacity() -> usize {
    capacity_for_budget(DEFAULT_MEMORY_BUDGET)
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            queue_discipline: QueueDiscipline::default(),
            cache_capacity_bytes: default_cache_capacity(),
        }
    }
}

impl LoaderConfig {
    /// Sizes the cache as a fixed fraction of `memory_budget` bytes.
    #[must_use]
    pub const fn with_memory_budget(mut self, memory_budget: usize) -> Self {
        self.cache_capacity_bytes = capacity_for_budget(memory_budget);
        self
    }

    /// Checks the configuration is usable.
    ///
    /// # Errors
    /// Returns [`LoaderError::InvalidConfig`] if `worker_count` is zero.
    pub fn validate(&self) -> Result<(), LoaderError> {
        if self.worker_count == 0 {
            return Err(LoaderError::InvalidConfig(
                "worker_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// What `load` did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// The image was cached and has been posted for delivery.
    Cached,
    /// The request was queued for decoding.
    Queued,
    /// The sink was already gone; nothing happened.
    SinkDropped,
}

/// Explicitly owned image loading service.
///
/// Owns one cache and one worker pool. Construct it once per application
/// inside a tokio runtime and share it by reference.
pub struct ImageLoader {
    cache: Arc<ResultCache>,
    queue: Arc<RequestQueue>,
    pool: Arc<WorkerPool>,
    delivery: DeliveryChannel,
    resolver: Arc<dyn ViewSizeResolver>,
    dispatcher: JoinHandle<()>,
    config: LoaderConfig,
}

impl std::fmt::Debug for ImageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageLoader")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ImageLoader {
    /// Creates a loader decoding local files, with the default size resolver.
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or no tokio runtime is
    /// running.
    pub fn new(config: LoaderConfig) -> Result<(Self, DeliveryReceiver), LoaderError> {
        Self::with_parts(
            config,
            Arc::new(Downsampler::new()),
            Arc::new(FallbackSizeResolver::default()),
        )
    }

    /// Creates a loader with a custom decoder and size resolver.
    ///
    /// # Errors
    /// Returns error if the configuration is invalid or no tokio runtime is
    /// running.
    pub fn with_parts(
        config: LoaderConfig,
        decoder: Arc<dyn ImageDecoder>,
        resolver: Arc<dyn ViewSizeResolver>,
    ) -> Result<(Self, DeliveryReceiver), LoaderError> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current()?;

        let cache = Arc::new(ResultCache::new(config.cache_capacity_bytes));
        let queue = Arc::new(RequestQueue::new(config.queue_discipline));
        let pool = Arc::new(WorkerPool::new(config.worker_count));
        let (delivery, receiver) = delivery_channel();

        let dispatcher = Dispatcher::new(
            Arc::clone(&queue),
            Arc::clone(&pool),
            decoder,
            Arc::clone(&cache),
            delivery.clone(),
        );
        let dispatcher = runtime.spawn(dispatcher.run());

        info!(
            workers = config.worker_count,
            discipline = %config.queue_discipline,
            cache_bytes = config.cache_capacity_bytes,
            "Image loader started"
        );

        Ok((
            Self {
                cache,
                queue,
                pool,
                delivery,
                resolver,
                dispatcher,
                config,
            },
            receiver,
        ))
    }

    /// Binds `sink` to `key` and gets the image to it.
    ///
    /// A cached image is posted for delivery right away; otherwise a decode
    /// bounded by `target` is queued. Either way the sink only receives the
    /// image if it is still bound to `key` when the delivery is consumed.
    pub fn load<S: ImageSink + 'static>(
        &self,
        key: impl Into<ContentKey>,
        target: Dimensions,
        sink: &Arc<S>,
    ) -> LoadStatus {
        self.load_handle(key.into(), target, SinkHandle::new(sink))
    }

    /// Like [`Self::load`], with the target size taken from the size resolver.
    pub fn load_resolved<S: ImageSink + 'static>(
        &self,
        key: impl Into<ContentKey>,
        sink: &Arc<S>,
    ) -> LoadStatus {
        let target = self.resolver.resolve(sink.as_ref());
        self.load(key, target, sink)
    }

    /// Like [`Self::load`], for an existing handle.
    pub fn load_handle(&self, key: ContentKey, target: Dimensions, sink: SinkHandle) -> LoadStatus {
        let Some(strong) = sink.upgrade() else {
            trace!(key = %key, "Sink dropped before load");
            return LoadStatus::SinkDropped;
        };
        strong.bind(&key);
        drop(strong);

        if let Some(image) = self.cache.get(&key) {
            trace!(key = %key, "Serving image from cache");
            self.delivery.post(key, image, sink);
            return LoadStatus::Cached;
        }

        debug!(key = %key, target = %target, "Queueing image load");
        self.queue.push(LoadRequest::new(key, target, sink));
        LoadStatus::Queued
    }

    /// Decodes `key` into the cache without delivering it anywhere.
    pub fn prefetch(&self, key: impl Into<ContentKey>, target: Dimensions) -> LoadStatus {
        let key = key.into();
        if self.cache.contains(&key) {
            return LoadStatus::Cached;
        }
        self.queue
            .push(LoadRequest::new(key, target, SinkHandle::detached()));
        LoadStatus::Queued
    }

    /// Prefetches several images.
    pub fn prefetch_batch(&self, items: impl IntoIterator<Item = (ContentKey, Dimensions)>) {
        for (key, target) in items {
            self.prefetch(key, target);
        }
    }

    /// Returns the cached image for `key` without affecting recency.
    pub fn cached(&self, key: &ContentKey) -> Option<DecodedImage> {
        self.cache.peek(key)
    }

    /// Number of requests waiting for a worker.
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Number of free worker slots.
    #[must_use]
    pub fn available_workers(&self) -> usize {
        self.pool.available()
    }

    /// Returns true if no decode is running and nothing queued can still run.
    ///
    /// After [`Self::shutdown`] queued requests are never admitted, so only
    /// running decodes count.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pool.is_idle() && (self.queue.is_empty() || self.pool.is_closed())
    }

    /// Waits until [`Self::is_idle`] holds.
    ///
    /// Every delivery from the finished work has been posted by then.
    pub async fn wait_idle(&self) {
        while !self.is_idle() {
            tokio::time::sleep(IDLE_POLL_INTERVAL).await;
        }
    }

    /// Returns cache statistics.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drops every cached image.
    pub fn clear_cache(&self) {
        self.cache.clear();
        info!("Cleared image cache");
    }

    /// The configuration this loader was built with.
    #[must_use]
    pub const fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Stops admitting queued work. Decodes already running still finish and
    /// deliver.
    pub fn shutdown(&self) {
        self.pool.close();
        self.dispatcher.abort();
        debug!(pending = self.queue.len(), "Image loader shut down");
    }
}

impl Drop for ImageLoader {
    fn drop(&mut self) {
        self.dispatcher.abort();
    }
}
