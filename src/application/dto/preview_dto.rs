//! Folder preview DTOs.

use std::fmt;
use std::path::PathBuf;

use crate::domain::entities::{ContentKey, Dimensions};
use crate::infrastructure::image::CacheStats;

/// Outcome for one file in a previewed folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewEntry {
    /// File the slot was bound to.
    pub key: ContentKey,
    /// Decoded size, if the image arrived.
    pub dimensions: Option<Dimensions>,
    /// Decoded pixel bytes, zero if the image did not arrive.
    pub byte_size: usize,
}

impl PreviewEntry {
    /// Returns true if the slot received its image.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.dimensions.is_some()
    }
}

/// Summary of previewing one folder.
#[derive(Debug, Clone)]
pub struct PreviewReport {
    /// Folder that was scanned.
    pub dir: PathBuf,
    /// One entry per image file, in name order.
    pub entries: Vec<PreviewEntry>,
    /// Loads answered straight from the cache.
    pub from_cache: usize,
    /// Cache state after the run.
    pub cache: CacheStats,
}

impl PreviewReport {
    /// Number of slots showing their image.
    #[must_use]
    pub fn ready(&self) -> usize {
        self.entries.iter().filter(|e| e.is_ready()).count()
    }

    /// Files that could not be decoded.
    pub fn failed(&self) -> impl Iterator<Item = &ContentKey> {
        self.entries
            .iter()
            .filter(|e| !e.is_ready())
            .map(|e| &e.key)
    }

    /// Total decoded bytes held by the slots.
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.entries.iter().map(|e| e.byte_size).sum()
    }
}

impl fmt::Display for PreviewReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.dir.display())?;
        for entry in &self.entries {
            match entry.dimensions {
                Some(dims) => writeln!(
                    f,
                    "  {:>11}  {:>9} B  {}",
                    dims.to_string(),
                    entry.byte_size,
                    entry.key
                )?,
                None => writeln!(f, "  {:>11}  {:>11}  {}", "failed", "-", entry.key)?,
            }
        }
        writeln!(
            f,
            "{} of {} ready ({} from cache), {} bytes",
            self.ready(),
            self.entries.len(),
            self.from_cache,
            self.total_bytes()
        )?;
        write!(f, "{}", self.cache)
    }
}
