//! Domain entity definitions.

mod content_key;
mod decoded;

pub use content_key::{ContentKey, Dimensions};
pub use decoded::{DecodedImage, ImageStatus, LoadRequest};
