//! Infrastructure layer with concrete adapters.

/// Application configuration.
pub mod config;
/// Image decoding, caching and loading.
pub mod image;

pub use self::config::{AppConfig, CliArgs, ConfigStore, DisplayConfig, LogLevel};
pub use self::image::{
    CacheStats, DeliveryOutcome, DeliveryReceiver, Downsampler, FallbackSizeResolver, ImageLoader,
    LoadStatus, LoaderConfig, QueueDiscipline, ResultCache,
};
