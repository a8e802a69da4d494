//! Unveil Page
//!
//! Composes the reveal engine into a long single page: sections stacked
//! vertically, headings and blocks revealed once on entry, grid items staggered,
//! images loaded only when first visible.
//!
//! # Example
//!
//! ```
//! use unveil_core::Stage;
//! use unveil_page::{Page, PageConfig};
//! use unveil_theme::ThemeState;
//!
//! let theme = ThemeState::default();
//! let mut page = Page::mount(Stage::default(), PageConfig::portfolio(), &theme).unwrap();
//!
//! page.scroll_to_section("projects").unwrap();
//! page.advance(1000);
//!
//! let snapshot = page.snapshot(page.now_ms());
//! assert!(snapshot.entry("projects").unwrap().revealed);
//! ```

pub mod config;
pub mod contact;
pub mod error;
pub mod layout;
pub mod page;
pub mod scroll;

pub use config::{
    BlockConfig, ImageConfig, ItemConfig, LayoutConfig, Motion, PageConfig, RevealSettings,
    ScrollConfig, SectionConfig,
};
pub use contact::{
    submit, ContactError, ContactForm, ContactMessage, DeliveryError, Field, MessageDelivery,
    RecordingDelivery, SubmitConfirmation, ValidationErrors,
};
pub use error::{PageError, Result};
pub use layout::PageLayout;
pub use page::{EntryKind, EntrySnapshot, ImageSnapshot, Page, PageSnapshot};
pub use scroll::ScrollToTop;
