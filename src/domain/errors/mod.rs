//! Domain error types.

mod decode_error;
mod loader_error;
mod scan_error;

pub use decode_error::DecodeError;
pub use loader_error::LoaderError;
pub use scan_error::ScanError;
