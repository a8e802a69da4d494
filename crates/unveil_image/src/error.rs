//! Error types for image loading

use thiserror::Error;

/// Errors that can occur while setting up image loading
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image source is empty")]
    EmptySource,

    #[error("failed to start fetch runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Result type for image operations
pub type Result<T> = std::result::Result<T, ImageError>;
