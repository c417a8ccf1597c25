//! Port for turning source content into a bounded decoded image.

use crate::domain::entities::{ContentKey, DecodedImage, Dimensions};
use crate::domain::errors::DecodeError;

/// Decodes content identified by a key into an image no larger than needed
/// for `target`.
///
/// Decoding is blocking, CPU-bound work; callers run it off the async runtime.
pub trait ImageDecoder: Send + Sync {
    /// Decodes `key` for display at `target`.
    ///
    /// # Errors
    /// Returns [`DecodeError`] if the content is missing, unreadable or corrupt.
    fn decode(&self, key: &ContentKey, target: Dimensions) -> Result<DecodedImage, DecodeError>;
}
