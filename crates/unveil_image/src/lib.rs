//! Unveil Image
//!
//! Placeholder-first image loading for long pages.
//!
//! # Features
//!
//! - Render a tiny inline placeholder until the image is first visible
//! - Request the real source once, on first entry, through the stage
//! - Track Idle, Fetching and Ready for renderers
//! - Real network and filesystem fetching behind the "network" feature
//!
//! # Example
//!
//! ```
//! use unveil_core::{Rect, Stage};
//! use unveil_image::{LoadState, ProgressiveImageLoader, PLACEHOLDER};
//!
//! let stage = Stage::new(Rect::from_size(800.0, 600.0));
//! let card = stage.mount(Rect::new(0.0, 1500.0, 400.0, 300.0));
//! let loader = ProgressiveImageLoader::create(&stage.handle(), Some(card), "img/a.png");
//! assert_eq!(loader.current_render_source(), PLACEHOLDER);
//!
//! stage.scroll_to(1200.0);
//! assert_eq!(loader.state(), LoadState::Fetching);
//!
//! stage.complete_fetch("img/a.png", Ok(()));
//! assert!(loader.is_ready());
//! ```

mod error;
mod loader;
#[cfg(feature = "network")]
mod network;
mod source;

pub use error::{ImageError, Result};
pub use loader::{LoadState, ProgressiveImageLoader};
#[cfg(feature = "network")]
pub use network::NetworkFetcher;
pub use source::{ImageSource, PLACEHOLDER};
