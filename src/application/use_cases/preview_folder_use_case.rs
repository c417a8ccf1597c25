//! Folder preview use case implementation.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::dto::{PreviewEntry, PreviewReport};
use crate::domain::entities::{ContentKey, Dimensions};
use crate::domain::errors::ScanError;
use crate::infrastructure::image::{DeliveryReceiver, ImageLoader, LoadStatus};
use crate::presentation::widgets::ImageSlot;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Loads every image in one folder into its own display slot.
#[derive(Debug, Clone)]
pub struct PreviewFolderUseCase {
    loader: Arc<ImageLoader>,
    thumbnail: Dimensions,
}

impl PreviewFolderUseCase {
    /// Creates a use case filling slots laid out at `thumbnail` size.
    #[must_use]
    pub const fn new(loader: Arc<ImageLoader>, thumbnail: Dimensions) -> Self {
        Self { loader, thumbnail }
    }

    /// Lists image files directly inside `dir`, sorted by path.
    ///
    /// # Errors
    /// Returns error if `dir` is not a readable directory.
    pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
        if !dir.is_dir() {
            return Err(ScanError::NotADirectory(dir.to_path_buf()));
        }

        let read_dir = |source| ScanError::ReadDir {
            path: dir.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(read_dir)? {
            let path = entry.map_err(read_dir)?.path();
            if path.is_file() && is_image_file(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Binds a slot per image in `dir`, loads them all and waits for the
    /// results to be applied through `receiver`.
    ///
    /// # Errors
    /// Returns error if the folder cannot be listed.
    pub async fn execute(
        &self,
        dir: &Path,
        receiver: &mut DeliveryReceiver,
    ) -> Result<PreviewReport, ScanError> {
        let files = Self::list_images(dir)?;
        info!(dir = %dir.display(), files = files.len(), "Previewing folder");

        let slots: Vec<(ContentKey, Arc<ImageSlot>)> = files
            .iter()
            .map(|path| {
                (
                    ContentKey::from_path(path),
                    Arc::new(ImageSlot::with_declared_size(self.thumbnail)),
                )
            })
            .collect();

        let mut from_cache = 0;
        for (key, slot) in &slots {
            if self.loader.load_resolved(key.clone(), slot) == LoadStatus::Cached {
                from_cache += 1;
            }
        }

        self.loader.wait_idle().await;
        let delivered = receiver.drain();
        debug!(delivered, discarded = receiver.discarded(), "Deliveries consumed");

        let entries: Vec<PreviewEntry> = slots
            .into_iter()
            .map(|(key, slot)| {
                let image = slot.image();
                if image.is_none() {
                    warn!(key = %key, "No image delivered");
                }
                PreviewEntry {
                    key,
                    dimensions: image.as_ref().map(|i| i.dimensions()),
                    byte_size: image.map_or(0, |i| i.byte_size()),
                }
            })
            .collect();

        Ok(PreviewReport {
            dir: dir.to_path_buf(),
            entries,
            from_cache,
            cache: self.loader.cache_stats(),
        })
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::image::LoaderConfig;
    use tempfile::TempDir;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) {
        image::DynamicImage::new_rgba8(width, height)
            .save(dir.join(name))
            .unwrap();
    }

    fn folder() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "b.png", 800, 600);
        write_png(dir.path(), "a.PNG", 64, 64);
        write_png(dir.path(), "c.png", 300, 1200);
        std::fs::write(dir.path().join("notes.txt"), "not an image").unwrap();
        std::fs::write(dir.path().join("broken.jpg"), b"garbage").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        write_png(&dir.path().join("nested"), "d.png", 10, 10);
        dir
    }

    #[test]
    fn test_lists_images_sorted_without_recursing() {
        let dir = folder();
        let names: Vec<String> = PreviewFolderUseCase::list_images(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.PNG", "b.png", "broken.jpg", "c.png"]);
    }

    #[test]
    fn test_rejects_non_directory() {
        let dir = folder();
        let result = PreviewFolderUseCase::list_images(&dir.path().join("b.png"));
        assert!(matches!(result, Err(ScanError::NotADirectory(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_previews_folder_then_serves_from_cache() {
        let dir = folder();
        let (loader, mut receiver) = ImageLoader::new(LoaderConfig::default()).unwrap();
        let use_case = PreviewFolderUseCase::new(Arc::new(loader), Dimensions::new(100, 100));

        let report = use_case.execute(dir.path(), &mut receiver).await.unwrap();
        assert_eq!(report.entries.len(), 4);
        assert_eq!(report.ready(), 3);
        assert_eq!(report.from_cache, 0);
        assert_eq!(
            report.failed().map(ToString::to_string).collect::<Vec<_>>(),
            [dir.path().join("broken.jpg").to_string_lossy().into_owned()]
        );

        // 800x600 against 100x100 samples by 8.
        let b = &report.entries[1];
        assert_eq!(b.dimensions, Some(Dimensions::new(100, 75)));
        // Already within the target, decoded as is.
        assert_eq!(report.entries[0].dimensions, Some(Dimensions::new(64, 64)));

        let again = use_case.execute(dir.path(), &mut receiver).await.unwrap();
        assert_eq!(again.from_cache, 3);
        assert_eq!(again.ready(), 3);
        assert_eq!(again.cache.entries, 3);
    }
}
