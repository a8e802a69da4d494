//! Image source types

use crate::error::{ImageError, Result};
use std::path::PathBuf;

/// Placeholder shown before an image is requested: a solid light-grey 400x300 SVG
pub const PLACEHOLDER: &str = "data:image/svg+xml,%3Csvg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 400 300\"%3E%3Crect fill=\"%23E5E7EB\" width=\"400\" height=\"300\"/%3E%3C/svg%3E";

/// Where an image's bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Remote resource (`http://` or `https://`)
    Url(String),

    /// Inline `data:` URI; nothing to download
    Data(String),

    /// Path on the local filesystem, relative paths resolved against the site root
    File(PathBuf),
}

impl ImageSource {
    /// Parse a resource URI string into an ImageSource
    ///
    /// Supported formats:
    /// - `http://...` or `https://...` - URL
    /// - `data:...` - inline data URI
    /// - `file:///path/to/image.png` - File path
    /// - `img/photo.png` - Treated as file path
    pub fn from_uri(uri: &str) -> Self {
        if uri.starts_with("data:") {
            Self::Data(uri.to_string())
        } else if uri.starts_with("http://") || uri.starts_with("https://") {
            Self::Url(uri.to_string())
        } else if let Some(path) = uri.strip_prefix("file://") {
            Self::File(PathBuf::from(path))
        } else {
            Self::File(PathBuf::from(uri))
        }
    }

    /// Like [`from_uri`](Self::from_uri) but rejects blank input
    pub fn parse(uri: &str) -> Result<Self> {
        if uri.trim().is_empty() {
            return Err(ImageError::EmptySource);
        }
        Ok(Self::from_uri(uri))
    }

    /// Whether loading this source needs network access
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Url(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Url(_) => "url",
            Self::Data(_) => "data",
            Self::File(_) => "file",
        }
    }
}

impl From<&str> for ImageSource {
    fn from(s: &str) -> Self {
        Self::from_uri(s)
    }
}

impl From<String> for ImageSource {
    fn from(s: String) -> Self {
        Self::from_uri(&s)
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_uri() {
        assert_eq!(
            ImageSource::from_uri("https://cdn.example.com/a.png"),
            ImageSource::Url("https://cdn.example.com/a.png".into())
        );
        assert_eq!(ImageSource::from_uri("img/a.png"), ImageSource::File("img/a.png".into()));
        assert_eq!(
            ImageSource::from_uri("file:///srv/site/a.png"),
            ImageSource::File("/srv/site/a.png".into())
        );
        assert_eq!(ImageSource::from_uri(PLACEHOLDER).kind(), "data");
    }

    #[test]
    fn test_parse_rejects_blank() {
        assert!(matches!(ImageSource::parse("  "), Err(ImageError::EmptySource)));
        assert!(ImageSource::parse("http://x/y.jpg").is_ok_and(|s| s.is_remote()));
    }

    #[test]
    fn test_placeholder_is_grey_svg() {
        assert!(PLACEHOLDER.starts_with("data:image/svg+xml,"));
        assert!(PLACEHOLDER.contains("%23E5E7EB"));
        assert!(PLACEHOLDER.contains("viewBox=\"0 0 400 300\""));
    }
}
