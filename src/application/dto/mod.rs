//! Data transfer objects for the application layer.

mod preview_dto;

pub use preview_dto::{PreviewEntry, PreviewReport};
