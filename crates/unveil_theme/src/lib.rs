//! Unveil Theme
//!
//! Light/dark scheme state for a page, and assets that change with it.
//!
//! ```
//! use unveil_theme::{ColorScheme, ThemeState, ThemedAsset};
//!
//! let theme = ThemeState::new(ColorScheme::Light);
//! let logo = ThemedAsset::new("img/logo.svg").with_dark("img/logo-dark.svg");
//!
//! theme.toggle();
//! assert_eq!(logo.select(theme.scheme()), "img/logo-dark.svg");
//! ```

mod scheme;
mod state;

pub use scheme::{detect_color_scheme, ColorScheme, ThemedAsset, UnknownScheme, SCHEME_ENV};
pub use state::{ThemeState, ThemeSubscription};
