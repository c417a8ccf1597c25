//! Size resolution for display targets that may not know their size yet.

use crate::domain::entities::Dimensions;
use crate::domain::ports::{ImageSink, ViewSizeResolver};

/// Screen extent assumed when nothing else is configured.
pub const DEFAULT_SCREEN: Dimensions = Dimensions::new(1920, 1080);

/// Resolves each axis independently through a fallback chain:
/// rendered size, declared layout size, configured maximum, then the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackSizeResolver {
    screen: Dimensions,
}

impl FallbackSizeResolver {
    /// Creates a resolver falling back to `screen`.
    #[must_use]
    pub const fn new(screen: Dimensions) -> Self {
        Self { screen }
    }

    /// The last-resort extent.
    #[must_use]
    pub const fn screen(&self) -> Dimensions {
        self.screen
    }
}

impl Default for FallbackSizeResolver {
    fn default() -> Self {
        Self::new(DEFAULT_SCREEN)
    }
}

fn first_positive(candidates: [u32; 4]) -> u32 {
    candidates.into_iter().find(|&v| v > 0).unwrap_or(0)
}

impl ViewSizeResolver for FallbackSizeResolver {
    fn resolve(&self, sink: &dyn ImageSink) -> Dimensions {
        let hints = sink.size_hints();
        Dimensions::new(
            first_positive([
                hints.rendered.width,
                hints.declared.width,
                hints.max.width,
                self.screen.width,
            ]),
            first_positive([
                hints.rendered.height,
                hints.declared.height,
                hints.max.height,
                self.screen.height,
            ]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::SizeHints;
    use crate::domain::ports::mocks::MockImageSink;

    fn sink_with(hints: SizeHints) -> MockImageSink {
        let mut sink = MockImageSink::new();
        sink.expect_size_hints().return_const(hints);
        sink
    }

    #[test]
    fn test_rendered_size_wins() {
        let sink = sink_with(SizeHints {
            rendered: Dimensions::new(120, 80),
            declared: Dimensions::new(300, 300),
            max: Dimensions::new(500, 500),
        });
        let size = FallbackSizeResolver::default().resolve(&sink);
        assert_eq!(size, Dimensions::new(120, 80));
    }

    #[test]
    fn test_axes_fall_back_independently() {
        let sink = sink_with(SizeHints {
            rendered: Dimensions::new(0, 0),
            declared: Dimensions::new(200, 0),
            max: Dimensions::new(0, 640),
        });
        let size = FallbackSizeResolver::default().resolve(&sink);
        assert_eq!(size, Dimensions::new(200, 640));
    }

    #[test]
    fn test_unknown_sink_gets_screen_extent() {
        let sink = sink_with(SizeHints::default());
        let resolver = FallbackSizeResolver::new(Dimensions::new(1080, 2340));
        assert_eq!(resolver.resolve(&sink), Dimensions::new(1080, 2340));
    }
}
