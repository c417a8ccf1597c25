//! Domain layer with core entities, error types and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{ContentKey, DecodedImage, Dimensions, LoadRequest};
pub use errors::{DecodeError, LoaderError, ScanError};
pub use ports::{ImageDecoder, ImageSink, SinkHandle, SizeHints, ViewSizeResolver};
