//! Error types for page composition

use thiserror::Error;
use unveil_core::CoreError;
use unveil_image::ImageError;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("failed to parse page config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize page config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("page config has no sections")]
    NoSections,

    #[error("section id `{0}` is used more than once")]
    DuplicateSection(String),

    #[error("`{0}` is used more than once")]
    DuplicateLabel(String),

    #[error("level of `{path}` must be at most 100, got {level}")]
    InvalidLevel { path: String, level: u8 },

    #[error("no section with id `{0}`")]
    UnknownSection(String),

    #[error("{field} must be positive, got {value}")]
    InvalidSize { field: String, value: f32 },

    #[error("invalid reveal threshold: {0}")]
    Threshold(#[from] CoreError),

    #[error("image in `{path}`: {source}")]
    Image {
        path: String,
        #[source]
        source: ImageError,
    },
}

pub type Result<T> = std::result::Result<T, PageError>;
