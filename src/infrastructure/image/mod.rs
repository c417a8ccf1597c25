//! Image loading engine.
//!
//! This module provides:
//! - Byte-accounted LRU caching of decoded images
//! - Memory-bounded decoding with integer downsampling
//! - An ordered request queue drained by a single dispatcher
//! - A fixed worker pool guarded by a concurrency budget
//! - Staleness-checked delivery back to display targets

pub mod delivery;
pub mod dispatcher;
pub mod downsampler;
pub mod loader;
pub mod memory_cache;
pub mod request_queue;
pub mod view_size;
pub mod worker_pool;

pub use delivery::{Delivery, DeliveryChannel, DeliveryOutcome, DeliveryReceiver, delivery_channel};
pub use dispatcher::Dispatcher;
pub use downsampler::{Downsampler, sample_factor, scaled_dimensions};
pub use loader::{ImageLoader, LoadStatus, LoaderConfig};
pub use memory_cache::{CacheStats, ResultCache, capacity_for_budget};
pub use request_queue::{QueueDiscipline, RequestQueue};
pub use view_size::{DEFAULT_SCREEN, FallbackSizeResolver};
pub use worker_pool::WorkerPool;
