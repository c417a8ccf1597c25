//! Content keys and pixel dimensions.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Identifies a piece of source content (a local file path).
///
/// Keys are compared verbatim: `./a.png` and `a.png` are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentKey(String);

impl ContentKey {
    /// Creates a new `ContentKey` from any string-like input.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Creates a key from a filesystem path.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }

    /// Returns the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the key interpreted as a filesystem path.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ContentKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&Path> for ContentKey {
    fn from(path: &Path) -> Self {
        Self::from_path(path)
    }
}

/// Width and height in pixels. A zero axis means "unconstrained".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// No constraint on either axis.
    pub const UNCONSTRAINED: Self = Self::new(0, 0);

    /// Creates new dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns true if neither axis constrains decoding.
    #[must_use]
    pub const fn is_unconstrained(&self) -> bool {
        self.width == 0 && self.height == 0
    }

    /// Returns true if both axes are resolved to a positive size.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Number of pixels covered.
    #[must_use]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width, height)
    }
}
