//! Memory-bounded decoding of local image files.
//!
//! The intrinsic size is read from the header first. The content is then
//! decoded and reduced by an integer sample factor so the result is roughly the
//! target display size.
//! JPEG sources are decoded directly at a reduced DCT scale; other formats are
//! decoded in full under allocation limits and then reduced.

use std::fs::File;
use std::io::BufReader;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, ImageReader, Limits, RgbImage};
use jpeg_decoder::PixelFormat;
use tracing::{debug, trace};

use crate::domain::entities::{ContentKey, DecodedImage, Dimensions};
use crate::domain::errors::DecodeError;
use crate::domain::ports::ImageDecoder;

/// Rounds `intrinsic / target` half up. A zero target never constrains.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn axis_ratio(intrinsic: u32, target: u32) -> u32 {
    if target == 0 {
        return 1;
    }
    (f64::from(intrinsic) / f64::from(target) + 0.5).floor() as u32
}

/// Computes the integer factor both axes are divided by when decoding.
///
/// When either constrained axis is larger than its target, the factor is the
/// larger of the two rounded axis ratios; otherwise it is 1. A zero target
/// axis places no constraint on that axis. The result is never below 1.
#[must_use]
pub fn sample_factor(intrinsic: Dimensions, target: Dimensions) -> u32 {
    let wide = target.width > 0 && intrinsic.width > target.width;
    let tall = target.height > 0 && intrinsic.height > target.height;
    if !(wide || tall) {
        return 1;
    }

    axis_ratio(intrinsic.width, target.width)
        .max(axis_ratio(intrinsic.height, target.height))
        .max(1)
}

/// Size of an image with `intrinsic` dimensions decoded at 1/`factor` scale.
#[must_use]
pub fn scaled_dimensions(intrinsic: Dimensions, factor: u32) -> Dimensions {
    let factor = factor.max(1);
    Dimensions::new(
        (intrinsic.width / factor).max(1),
        (intrinsic.height / factor).max(1),
    )
}

/// Longest edge accepted for decoding.
pub const DEFAULT_MAX_DIMENSION: u32 = 16_384;

/// Largest allocation a full-resolution decode may make (256 MiB).
pub const DEFAULT_MAX_ALLOC: u64 = 256 * 1024 * 1024;

/// Decodes image files from disk at a bounded resolution.
#[derive(Debug, Clone, Copy)]
pub struct Downsampler {
    filter: FilterType,
    max_dimension: u32,
    max_alloc: u64,
}

impl Downsampler {
    /// Creates a downsampler using a triangle (bilinear) reduction filter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            filter: FilterType::Triangle,
            max_dimension: DEFAULT_MAX_DIMENSION,
            max_alloc: DEFAULT_MAX_ALLOC,
        }
    }

    /// Uses `filter` when reducing decoded pixels.
    #[must_use]
    pub const fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Rejects sources with an edge longer than `max_dimension` and caps
    /// decoder allocations at `max_alloc` bytes.
    #[must_use]
    pub const fn with_limits(mut self, max_dimension: u32, max_alloc: u64) -> Self {
        self.max_dimension = max_dimension;
        self.max_alloc = max_alloc;
        self
    }

    /// Reads the intrinsic size of `key` from its header only.
    ///
    /// # Errors
    /// Returns [`DecodeError`] if the file cannot be opened or its format is
    /// not recognised.
    pub fn read_dimensions(&self, key: &ContentKey) -> Result<Dimensions, DecodeError> {
        self.inspect(key).map(|(size, _)| size)
    }

    fn inspect(&self, key: &ContentKey) -> Result<(Dimensions, Option<ImageFormat>), DecodeError> {
        let reader = open_reader(key)?;
        let format = reader.format();
        let (width, height) = reader
            .into_dimensions()
            .map_err(|source| DecodeError::Image {
                key: key.clone(),
                source,
            })?;
        Ok((Dimensions::new(width, height), format))
    }

    fn limits(&self) -> Limits {
        let mut limits = Limits::default();
        limits.max_image_width = Some(self.max_dimension);
        limits.max_image_height = Some(self.max_dimension);
        limits.max_alloc = Some(self.max_alloc);
        limits
    }

    fn enforce_limits(&self, key: &ContentKey, intrinsic: Dimensions) -> Result<(), DecodeError> {
        if intrinsic.width > self.max_dimension || intrinsic.height > self.max_dimension {
            return Err(DecodeError::TooLarge {
                key: key.clone(),
                size: intrinsic,
                limit: self.max_dimension,
            });
        }
        Ok(())
    }

    /// Decodes at full resolution under the configured limits.
    fn decode_full(&self, key: &ContentKey) -> Result<DynamicImage, DecodeError> {
        let mut reader = open_reader(key)?;
        reader.limits(self.limits());
        reader.decode().map_err(|source| DecodeError::Image {
            key: key.clone(),
            source,
        })
    }
}

impl Default for Downsampler {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageDecoder for Downsampler {
    fn decode(&self, key: &ContentKey, target: Dimensions) -> Result<DecodedImage, DecodeError> {
        let (intrinsic, format) = self.inspect(key)?;
        if intrinsic.area() == 0 {
            return Err(DecodeError::EmptyImage { key: key.clone() });
        }
        self.enforce_limits(key, intrinsic)?;

        let factor = sample_factor(intrinsic, target);
        let scaled = scaled_dimensions(intrinsic, factor);
        trace!(key = %key, intrinsic = %intrinsic, target = %target, factor, "Decoding image");

        let decoded = match format {
            Some(ImageFormat::Jpeg) if factor > 1 => match decode_jpeg_scaled(key, scaled)? {
                Some(image) => image,
                None => self.decode_full(key)?,
            },
            _ => self.decode_full(key)?,
        };

        let pixels = if decoded.width() == scaled.width && decoded.height() == scaled.height {
            decoded
        } else {
            decoded.resize_exact(scaled.width, scaled.height, self.filter)
        };

        let image = DecodedImage::new(pixels);
        debug!(
            key = %key,
            size = %image.dimensions(),
            bytes = image.byte_size(),
            "Image decoded"
        );
        Ok(image)
    }
}

/// Decodes a JPEG at the smallest DCT scale (1/8, 1/4, 1/2 or 1) that
/// still covers `scaled`.
///
/// Returns `None` for pixel formats that need a full decode instead.
fn decode_jpeg_scaled(
    key: &ContentKey,
    scaled: Dimensions,
) -> Result<Option<DynamicImage>, DecodeError> {
    let (Ok(width), Ok(height)) = (u16::try_from(scaled.width), u16::try_from(scaled.height))
    else {
        return Ok(None);
    };

    let file = File::open(key.as_path()).map_err(|source| DecodeError::Io {
        key: key.clone(),
        source,
    })?;
    let jpeg_error = |source| DecodeError::Jpeg {
        key: key.clone(),
        source,
    };

    let mut decoder = jpeg_decoder::Decoder::new(BufReader::new(file));
    let (out_width, out_height) = decoder.scale(width, height).map_err(jpeg_error)?;
    let data = decoder.decode().map_err(jpeg_error)?;
    let (out_width, out_height) = (u32::from(out_width), u32::from(out_height));

    let image = match decoder.info().map(|info| info.pixel_format) {
        Some(PixelFormat::L8) => {
            GrayImage::from_raw(out_width, out_height, data).map(DynamicImage::ImageLuma8)
        }
        Some(PixelFormat::RGB24) => {
            RgbImage::from_raw(out_width, out_height, data).map(DynamicImage::ImageRgb8)
        }
        _ => None,
    };

    trace!(
        key = %key,
        scaled = %Dimensions::new(out_width, out_height),
        used = image.is_some(),
        "Scaled JPEG decode"
    );
    Ok(image)
}

fn open_reader(key: &ContentKey) -> Result<ImageReader<BufReader<File>>, DecodeError> {
    let io_error = |source| DecodeError::Io {
        key: key.clone(),
        source,
    };
    ImageReader::open(key.as_path())
        .map_err(io_error)?
        .with_guessed_format()
        .map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case((4000, 3000), (1000, 500), 6 ; "max_of_ratios")]
    #[test_case((800, 600), (1000, 1000), 1 ; "smaller_than_target")]
    #[test_case((1000, 1000), (1000, 1000), 1 ; "exact_fit")]
    #[test_case((1100, 900), (1000, 1000), 1 ; "slightly_wider_rounds_down")]
    #[test_case((1500, 100), (1000, 1000), 2 ; "half_rounds_up")]
    #[test_case((4000, 3000), (0, 0), 1 ; "unconstrained")]
    #[test_case((4000, 3000), (0, 1000), 3 ; "height_only")]
    #[test_case((4000, 3000), (500, 0), 8 ; "width_only")]
    #[test_case((100, 5000), (200, 200), 25 ; "tall_strip")]
    fn test_sample_factor(intrinsic: (u32, u32), target: (u32, u32), expected: u32) {
        assert_eq!(
            sample_factor(Dimensions::from(intrinsic), Dimensions::from(target)),
            expected
        );
    }

    #[test]
    fn test_scaled_dimensions_never_collapse() {
        let scaled = scaled_dimensions(Dimensions::new(4000, 3000), 6);
        assert_eq!(scaled, Dimensions::new(666, 500));
        assert_eq!(
            scaled_dimensions(Dimensions::new(3, 1), 10),
            Dimensions::new(1, 1)
        );
    }

    fn write_png(dir: &tempfile::TempDir, name: &str, width: u32, height: u32) -> ContentKey {
        let path = dir.path().join(name);
        image::DynamicImage::new_rgb8(width, height)
            .save(&path)
            .expect("write fixture");
        ContentKey::from_path(&path)
    }

    #[test]
    fn test_decode_downsamples_large_image() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::TempDir::new()?;
        let key = write_png(&dir, "large.png", 400, 300);

        let image = Downsampler::new().decode(&key, Dimensions::new(100, 50))?;

        assert_eq!(image.dimensions(), Dimensions::new(66, 50));
        assert_eq!(image.byte_size(), 66 * 50 * image.bytes_per_pixel());
        Ok(())
    }

    fn write_jpeg(dir: &tempfile::TempDir, name: &str, image: &image::DynamicImage) -> ContentKey {
        let path = dir.path().join(name);
        image.save(&path).expect("write fixture");
        ContentKey::from_path(&path)
    }

    #[test]
    fn test_decode_bounds_camera_sized_image() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::TempDir::new()?;
        let key = write_png(&dir, "camera.png", 4000, 3000);

        let image = Downsampler::new().decode(&key, Dimensions::new(1000, 500))?;

        assert_eq!(image.dimensions(), Dimensions::new(666, 500));
        Ok(())
    }

    #[test]
    fn test_jpeg_decodes_at_reduced_scale() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::TempDir::new()?;
        let key = write_jpeg(&dir, "photo.jpg", &image::DynamicImage::new_rgb8(1600, 1200));

        let image = Downsampler::new().decode(&key, Dimensions::new(200, 150))?;

        assert_eq!(image.dimensions(), Dimensions::new(200, 150));
        assert_eq!(image.byte_size(), 200 * 150 * 3);
        Ok(())
    }

    #[test]
    fn test_jpeg_between_scales_is_resized() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::TempDir::new()?;
        let key = write_jpeg(&dir, "gray.jpg", &image::DynamicImage::new_luma8(1000, 800));

        let image = Downsampler::new().decode(&key, Dimensions::new(300, 300))?;

        assert_eq!(image.dimensions(), Dimensions::new(333, 266));
        assert_eq!(image.bytes_per_pixel(), 1);
        Ok(())
    }

    #[test]
    fn test_oversized_source_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::TempDir::new()?;
        let key = write_png(&dir, "wide.png", 400, 300);

        let result = Downsampler::new()
            .with_limits(256, DEFAULT_MAX_ALLOC)
            .decode(&key, Dimensions::new(100, 100));

        match result {
            Err(DecodeError::TooLarge { size, limit, .. }) => {
                assert_eq!(size, Dimensions::new(400, 300));
                assert_eq!(limit, 256);
            }
            other => panic!("expected TooLarge, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_decode_keeps_small_image() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::TempDir::new()?;
        let key = write_png(&dir, "small.png", 40, 30);

        let image = Downsampler::new().decode(&key, Dimensions::new(100, 100))?;

        assert_eq!(image.dimensions(), Dimensions::new(40, 30));
        Ok(())
    }

    #[test]
    fn test_read_dimensions_from_header() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::TempDir::new()?;
        let key = write_png(&dir, "header.png", 12, 34);

        assert_eq!(Downsampler::new().read_dimensions(&key)?, Dimensions::new(12, 34));
        Ok(())
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let key = ContentKey::from("/definitely/not/here.png");
        let result = Downsampler::new().decode(&key, Dimensions::new(10, 10));
        assert!(matches!(result, Err(DecodeError::Io { .. })));
    }

    #[test]
    fn test_corrupt_file_is_image_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("corrupt.png");
        std::fs::write(&path, b"not an image at all")?;

        let key = ContentKey::from_path(&path);
        let result = Downsampler::new().decode(&key, Dimensions::new(10, 10));
        match result {
            Err(err) => assert_eq!(err.key(), &key),
            Ok(image) => panic!("decoded garbage into {image:?}"),
        }
        Ok(())
    }
}
