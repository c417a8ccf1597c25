//! Fixed set of decode slots guarded by a concurrency budget.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::domain::entities::{ContentKey, DecodedImage, Dimensions, LoadRequest};
use crate::domain::errors::DecodeError;
use crate::domain::ports::ImageDecoder;

use super::delivery::DeliveryChannel;
use super::memory_cache::ResultCache;

/// One admitted request plus everything needed to finish it.
pub(crate) struct DecodeTask {
    pub(crate) request: LoadRequest,
    pub(crate) decoder: Arc<dyn ImageDecoder>,
    pub(crate) cache: Arc<ResultCache>,
    pub(crate) delivery: DeliveryChannel,
}

impl DecodeTask {
    /// Decodes, caches and posts the result. Failures are logged and absorbed.
    fn run(self) {
        let Self {
            request: LoadRequest { key, target, sink },
            decoder,
            cache,
            delivery,
        } = self;

        // An earlier duplicate request may already have produced this key.
        if let Some(image) = cache.get(&key) {
            trace!(key = %key, "Served queued request from cache");
            delivery.post(key, image, sink);
            return;
        }

        match decode_contained(decoder.as_ref(), &key, target) {
            Ok(image) => {
                cache.put(key.clone(), image.clone());
                delivery.post(key, image, sink);
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to decode image");
            }
        }
    }
}

/// Runs `decoder`, turning a panic into [`DecodeError::Worker`].
fn decode_contained(
    decoder: &dyn ImageDecoder,
    key: &ContentKey,
    target: Dimensions,
) -> Result<DecodedImage, DecodeError> {
    panic::catch_unwind(AssertUnwindSafe(|| decoder.decode(key, target))).unwrap_or_else(|payload| {
        Err(DecodeError::Worker {
            key: key.clone(),
            reason: panic_message(payload.as_ref()),
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "decoder panicked".to_string())
}

/// Execution slots for decode tasks.
///
/// At most `size` tasks run at once. A slot is claimed by acquiring a unit of
/// the budget and is released when its task finishes, whether it succeeded,
/// failed or panicked.
#[derive(Debug)]
pub struct WorkerPool {
    size: usize,
    budget: Arc<Semaphore>,
}

impl WorkerPool {
    /// Creates a pool with `size` slots, all free.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            size,
            budget: Arc::new(Semaphore::new(size)),
        }
    }

    /// Number of slots.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Budget units currently free.
    #[must_use]
    pub fn available(&self) -> usize {
        self.budget.available_permits()
    }

    /// Returns true if no task is running.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.available() == self.size
    }

    /// Claims one unit of the budget, waiting while every slot is busy.
    ///
    /// Returns `None` once the pool has been closed.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.budget).acquire_owned().await.ok()
    }

    /// Runs `task` on a blocking thread, holding `permit` until it ends.
    pub(crate) fn submit(&self, permit: OwnedSemaphorePermit, task: DecodeTask) -> JoinHandle<()> {
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            task.run();
        })
    }

    /// Returns true once [`Self::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.budget.is_closed()
    }

    /// Stops admitting new tasks. Running tasks finish normally.
    pub fn close(&self) {
        debug!("Closing worker pool");
        self.budget.close();
    }
}
