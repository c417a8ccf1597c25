//! Port definitions implemented by collaborators and adapters.

mod image_decoder_port;
mod image_sink_port;
mod view_size_port;

pub use image_decoder_port::ImageDecoder;
pub use image_sink_port::{ImageSink, SinkHandle, SizeHints};
pub use view_size_port::{FixedSize, ViewSizeResolver};
