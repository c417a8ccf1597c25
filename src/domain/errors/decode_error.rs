//! Decode error types.

use thiserror::Error;

use crate::domain::entities::{ContentKey, Dimensions};

/// Reasons a piece of content could not be turned into an image.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The content could not be opened or read.
    #[error("failed to read {key}: {source}")]
    Io {
        /// Content that failed.
        key: ContentKey,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The bytes were read but are not a supported, well-formed image.
    #[error("failed to decode {key}: {source}")]
    Image {
        /// Content that failed.
        key: ContentKey,
        /// Error reported by the image codec.
        #[source]
        source: image::ImageError,
    },

    /// A reduced-scale JPEG decode failed.
    #[error("failed to decode JPEG {key}: {source}")]
    Jpeg {
        /// Content that failed.
        key: ContentKey,
        /// Error reported by the JPEG decoder.
        #[source]
        source: jpeg_decoder::Error,
    },

    /// The header reports a zero-area image.
    #[error("{key} has no pixels")]
    EmptyImage {
        /// Content that failed.
        key: ContentKey,
    },

    /// The header reports an edge longer than the decoder accepts.
    #[error("{key} is {size}, over the {limit}px decode limit")]
    TooLarge {
        /// Content that failed.
        key: ContentKey,
        /// Intrinsic size read from the header.
        size: Dimensions,
        /// Longest edge the decoder accepts.
        limit: u32,
    },

    /// The decode task panicked.
    #[error("decode worker for {key} failed: {reason}")]
    Worker {
        /// Content that failed.
        key: ContentKey,
        /// Panic message, when one was available.
        reason: String,
    },
}

impl DecodeError {
    /// Returns the key of the content that failed.
    #[must_use]
    pub const fn key(&self) -> &ContentKey {
        match self {
            Self::Io { key, .. }
            | Self::Image { key, .. }
            | Self::Jpeg { key, .. }
            | Self::EmptyImage { key }
            | Self::TooLarge { key, .. }
            | Self::Worker { key, .. } => key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_large_reports_key_and_limit() {
        let key = ContentKey::from("huge.png");
        let err = DecodeError::TooLarge {
            key: key.clone(),
            size: Dimensions::new(20_000, 10),
            limit: 16_384,
        };

        assert_eq!(err.key(), &key);
        assert_eq!(err.to_string(), "huge.png is 20000x10, over the 16384px decode limit");
    }
}
