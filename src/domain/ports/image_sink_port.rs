//! Port for display targets that receive decoded images.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::domain::entities::{ContentKey, DecodedImage, Dimensions};

/// Size information a display target knows about itself.
///
/// A zero axis means the value is unknown at that level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeHints {
    /// Size the target was actually rendered at.
    pub rendered: Dimensions,
    /// Size declared by its layout.
    pub declared: Dimensions,
    /// Upper bound configured on the target.
    pub max: Dimensions,
}

/// A display target that shows one image at a time.
///
/// Implementations are shared between the caller and the delivery consumer,
/// so they must be thread-safe. The engine only ever holds them weakly.
#[cfg_attr(test, mockall::automock)]
pub trait ImageSink: Send + Sync {
    /// Records `key` as the content this target now expects.
    fn bind(&self, key: &ContentKey);

    /// Returns the key this target was most recently bound to.
    fn current_key(&self) -> Option<ContentKey>;

    /// Displays a decoded image.
    fn apply(&self, image: DecodedImage);

    /// Returns what the target knows about its own size.
    fn size_hints(&self) -> SizeHints {
        SizeHints::default()
    }
}

/// Weak back-reference to an [`ImageSink`].
///
/// Used only to ask "is this result still wanted"; never keeps the sink alive.
#[derive(Clone)]
pub struct SinkHandle(Weak<dyn ImageSink>);

impl SinkHandle {
    /// Creates a handle to a concrete sink.
    #[must_use]
    pub fn new<S: ImageSink + 'static>(sink: &Arc<S>) -> Self {
        let weak: Weak<S> = Arc::downgrade(sink);
        Self(weak)
    }

    /// Creates a handle from a type-erased sink.
    #[must_use]
    pub fn from_dyn(sink: &Arc<dyn ImageSink>) -> Self {
        Self(Arc::downgrade(sink))
    }

    /// A handle that never resolves to a sink.
    #[must_use]
    pub fn detached() -> Self {
        let weak: Weak<dyn ImageSink> = Weak::<DetachedSink>::new();
        Self(weak)
    }

    /// Returns the sink if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Arc<dyn ImageSink>> {
        self.0.upgrade()
    }

    /// Returns true if the sink is still alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl fmt::Debug for SinkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}

struct DetachedSink;

impl ImageSink for DetachedSink {
    fn bind(&self, _key: &ContentKey) {}

    fn current_key(&self) -> Option<ContentKey> {
        None
    }

    fn apply(&self, _image: DecodedImage) {}
}
