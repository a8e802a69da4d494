//! Color schemes and scheme-dependent assets

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Environment variable that forces the initial scheme (`light` or `dark`)
pub const SCHEME_ENV: &str = "UNVEIL_COLOR_SCHEME";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown color scheme `{0}`, expected `light` or `dark`")]
pub struct UnknownScheme(pub String);

/// Light or dark appearance
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

impl ColorScheme {
    pub fn toggle(self) -> Self {
        match self {
            ColorScheme::Light => ColorScheme::Dark,
            ColorScheme::Dark => ColorScheme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColorScheme::Light => "light",
            ColorScheme::Dark => "dark",
        }
    }
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorScheme {
    type Err = UnknownScheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(ColorScheme::Light),
            "dark" => Ok(ColorScheme::Dark),
            other => Err(UnknownScheme(other.to_string())),
        }
    }
}

/// Detect the preferred scheme from environment-style lookups
///
/// Checks [`SCHEME_ENV`] first, then the terminal's `COLORFGBG` background
/// color. Falls back to light.
pub fn detect_color_scheme<F>(lookup: F) -> ColorScheme
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(SCHEME_ENV) {
        match value.parse() {
            Ok(scheme) => return scheme,
            Err(e) => tracing::warn!("ignoring {}: {}", SCHEME_ENV, e),
        }
    }

    // "fg;bg" or "fg;extra;bg"; ANSI backgrounds 0-6 and 8 are dark
    if let Some(bg) = lookup("COLORFGBG")
        .as_deref()
        .and_then(|value| value.rsplit(';').next())
        .and_then(|bg| bg.parse::<u8>().ok())
    {
        return if bg <= 6 || bg == 8 {
            ColorScheme::Dark
        } else {
            ColorScheme::Light
        };
    }

    ColorScheme::Light
}

/// An asset with an optional dark-scheme variant
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemedAsset {
    pub light: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark: Option<String>,
}

impl ThemedAsset {
    pub fn new(light: impl Into<String>) -> Self {
        Self {
            light: light.into(),
            dark: None,
        }
    }

    pub fn with_dark(mut self, dark: impl Into<String>) -> Self {
        self.dark = Some(dark.into());
        self
    }

    /// The URL to load under `scheme`
    pub fn select(&self, scheme: ColorScheme) -> &str {
        match (scheme, &self.dark) {
            (ColorScheme::Dark, Some(dark)) => dark,
            _ => &self.light,
        }
    }

    pub fn is_themed(&self) -> bool {
        self.dark.is_some()
    }
}
