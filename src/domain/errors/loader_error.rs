//! Loader construction error types.

use thiserror::Error;

/// Errors raised while building an image loader.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// A configuration value is out of range, such as zero workers.
    #[error("invalid loader configuration: {0}")]
    InvalidConfig(String),

    /// No tokio runtime was active when the loader was built.
    #[error("image loader must be created inside a tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}
