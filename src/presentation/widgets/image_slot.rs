//! Display slot that holds one decoded image at a time.

use parking_lot::Mutex;

use crate::domain::entities::{ContentKey, DecodedImage, Dimensions, ImageStatus};
use crate::domain::ports::{ImageSink, SizeHints};

#[derive(Debug, Default)]
struct SlotState {
    key: Option<ContentKey>,
    image: Option<DecodedImage>,
    status: ImageStatus,
    applied: u64,
}

/// A reusable display target, such as a grid cell or list row.
///
/// Rebinding the slot to new content clears the previous image, so a slot
/// never shows pixels for a key other than the one it is bound to.
#[derive(Debug, Default)]
pub struct ImageSlot {
    state: Mutex<SlotState>,
    hints: Mutex<SizeHints>,
}

impl ImageSlot {
    /// Creates an unbound slot with no size hints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a slot whose layout declares `size`.
    #[must_use]
    pub fn with_declared_size(size: Dimensions) -> Self {
        let slot = Self::new();
        slot.hints.lock().declared = size;
        slot
    }

    /// Records the size the slot was last rendered at.
    pub fn set_rendered_size(&self, size: Dimensions) {
        self.hints.lock().rendered = size;
    }

    /// Caps the size the slot will ever be drawn at.
    pub fn set_max_size(&self, size: Dimensions) {
        self.hints.lock().max = size;
    }

    /// Key the slot is currently bound to.
    #[must_use]
    pub fn key(&self) -> Option<ContentKey> {
        self.state.lock().key.clone()
    }

    /// Image currently shown, if one has been applied since the last bind.
    #[must_use]
    pub fn image(&self) -> Option<DecodedImage> {
        self.state.lock().image.clone()
    }

    /// Load state of the bound content.
    #[must_use]
    pub fn status(&self) -> ImageStatus {
        self.state.lock().status
    }

    /// Returns true once an image for the bound key has been applied.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.status().is_ready()
    }

    /// Number of images this slot has been given.
    #[must_use]
    pub fn applied_count(&self) -> u64 {
        self.state.lock().applied
    }

    /// Unbinds the slot and drops its image.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.key = None;
        state.image = None;
        state.status = ImageStatus::Empty;
    }
}

impl ImageSink for ImageSlot {
    fn bind(&self, key: &ContentKey) {
        let mut state = self.state.lock();
        if state.key.as_ref() == Some(key) && state.status.is_ready() {
            return;
        }
        state.key = Some(key.clone());
        state.image = None;
        state.status = ImageStatus::Pending;
    }

    fn current_key(&self) -> Option<ContentKey> {
        self.key()
    }

    fn apply(&self, image: DecodedImage) {
        let mut state = self.state.lock();
        state.image = Some(image);
        state.status = ImageStatus::Ready;
        state.applied += 1;
    }

    fn size_hints(&self) -> SizeHints {
        *self.hints.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thumb() -> DecodedImage {
        DecodedImage::new(image::DynamicImage::new_rgb8(3, 3))
    }

    #[test]
    fn test_new_slot_is_empty() {
        let slot = ImageSlot::new();
        assert_eq!(slot.status(), ImageStatus::Empty);
        assert!(slot.key().is_none());
        assert!(slot.image().is_none());
    }

    #[test]
    fn test_bind_then_apply() {
        let slot = ImageSlot::new();
        slot.bind(&ContentKey::from("a.png"));
        assert!(slot.status().is_pending());

        slot.apply(thumb());
        assert!(slot.is_ready());
        assert_eq!(slot.applied_count(), 1);
        assert_eq!(slot.current_key(), Some(ContentKey::from("a.png")));
    }

    #[test]
    fn test_rebind_clears_previous_image() {
        let slot = ImageSlot::new();
        slot.bind(&ContentKey::from("a.png"));
        slot.apply(thumb());

        slot.bind(&ContentKey::from("b.png"));
        assert!(slot.image().is_none());
        assert!(slot.status().is_pending());
    }

    #[test]
    fn test_rebinding_same_key_keeps_image() {
        let slot = ImageSlot::new();
        let key = ContentKey::from("a.png");
        slot.bind(&key);
        slot.apply(thumb());

        slot.bind(&key);
        assert!(slot.is_ready());
    }

    #[test]
    fn test_size_hints_track_layout() {
        let slot = ImageSlot::with_declared_size(Dimensions::new(200, 150));
        slot.set_rendered_size(Dimensions::new(180, 0));

        let hints = slot.size_hints();
        assert_eq!(hints.declared, Dimensions::new(200, 150));
        assert_eq!(hints.rendered, Dimensions::new(180, 0));
        assert_eq!(hints.max, Dimensions::default());
    }

    #[test]
    fn test_clear_unbinds() {
        let slot = ImageSlot::new();
        slot.bind(&ContentKey::from("a.png"));
        slot.clear();
        assert_eq!(slot.status(), ImageStatus::Empty);
        assert!(slot.current_key().is_none());
    }
}
