//! Error types

use crate::stage::ElementId;
use thiserror::Error;

/// Errors raised by the stage and observer APIs
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("threshold must be within 0.0..=1.0, got {0}")]
    InvalidThreshold(f32),

    #[error("element {0:?} is not mounted")]
    UnknownElement(ElementId),
}

/// Why a background fetch did not complete
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request for {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("network error while fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("fetch of {0} was aborted")]
    Aborted(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
