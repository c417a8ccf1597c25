//! Presentation layer with display targets.

/// Display slots that receive decoded images.
pub mod widgets;

pub use widgets::ImageSlot;
