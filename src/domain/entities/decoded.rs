//! Domain types for decoded images and load requests.

use std::fmt;
use std::sync::Arc;

use super::content_key::{ContentKey, Dimensions};
use crate::domain::ports::SinkHandle;

/// An immutable decoded pixel buffer together with its byte footprint.
///
/// Cloning is cheap: the pixels are shared, never copied or mutated.
#[derive(Clone)]
pub struct DecodedImage {
    pixels: Arc<image::DynamicImage>,
    byte_size: usize,
}

impl DecodedImage {
    /// Wraps a decoded image, measuring its footprint as row bytes times height.
    #[must_use]
    pub fn new(pixels: image::DynamicImage) -> Self {
        let byte_size = pixels.as_bytes().len();
        Self {
            pixels: Arc::new(pixels),
            byte_size,
        }
    }

    /// Returns the decoded pixels.
    #[must_use]
    pub fn pixels(&self) -> &image::DynamicImage {
        &self.pixels
    }

    /// Returns the shared pixel buffer.
    #[must_use]
    pub fn shared_pixels(&self) -> Arc<image::DynamicImage> {
        Arc::clone(&self.pixels)
    }

    /// Bytes held by the pixel buffer.
    #[must_use]
    pub const fn byte_size(&self) -> usize {
        self.byte_size
    }

    /// Decoded width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Decoded height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Decoded size.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width(), self.height())
    }

    /// Bytes used per pixel by the decoded color type.
    #[must_use]
    pub fn bytes_per_pixel(&self) -> usize {
        usize::from(self.pixels.color().bytes_per_pixel())
    }

    /// Returns true if both handles point at the same pixel buffer.
    #[must_use]
    pub fn same_pixels(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("byte_size", &self.byte_size)
            .finish()
    }
}

/// Display state of a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageStatus {
    /// Nothing has been requested yet.
    #[default]
    Empty,
    /// A key is bound and its image has not arrived.
    Pending,
    /// The image for the bound key is displayed.
    Ready,
}

impl ImageStatus {
    /// Returns true if the image is ready for rendering.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns true if the sink is waiting for its image.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// A pending request to decode `key` for `sink` at roughly `target` size.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    /// Content to decode.
    pub key: ContentKey,
    /// Display size the decode is bounded by.
    pub target: Dimensions,
    /// Where the result should go, if still wanted.
    pub sink: SinkHandle,
}

impl LoadRequest {
    /// Creates a new request.
    #[must_use]
    pub const fn new(key: ContentKey, target: Dimensions, sink: SinkHandle) -> Self {
        Self { key, target, sink }
    }
}
