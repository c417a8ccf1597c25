//! Port for resolving the size a sink wants its image decoded at.

use crate::domain::entities::Dimensions;

use super::image_sink_port::ImageSink;

/// Resolves target decode dimensions for a display target.
///
/// The engine treats this as a black box and only consumes the result.
pub trait ViewSizeResolver: Send + Sync {
    /// Returns the dimensions `sink` should be decoded for.
    fn resolve(&self, sink: &dyn ImageSink) -> Dimensions;
}

/// Always resolves to the same dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSize(pub Dimensions);

impl ViewSizeResolver for FixedSize {
    fn resolve(&self, _sink: &dyn ImageSink) -> Dimensions {
        self.0
    }
}
