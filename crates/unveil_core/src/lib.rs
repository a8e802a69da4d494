//! Unveil Core Runtime
//!
//! Foundational primitives for viewport-driven progressive rendering:
//!
//! - **Geometry**: rectangles and intersection ratios
//! - **Stage**: a single-threaded host runtime with a virtual clock, one-shot
//!   timers and fetch-completion listeners
//! - **Viewport observers**: one-shot "entered viewport" subscriptions
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use unveil_core::{Rect, Stage, Threshold, ViewportObserver};
//!
//! let stage = Stage::new(Rect::from_size(1280.0, 720.0));
//! let footer = stage.mount(Rect::new(0.0, 2400.0, 1280.0, 200.0));
//!
//! let seen = Rc::new(Cell::new(false));
//! let mut observer = ViewportObserver::attach(&stage.handle(), Some(footer), Threshold::default());
//! let seen_clone = seen.clone();
//! observer.on_enter(move |_| seen_clone.set(true));
//!
//! stage.scroll_to(2000.0);
//! assert!(seen.get());
//! ```

pub mod error;
pub mod fetch;
pub mod geometry;
pub mod observer;
pub mod stage;

pub use error::{CoreError, FetchError, Result};
pub use fetch::{FetchBackend, FetchCompletion, FetchOutcome};
pub use geometry::{intersection_ratio, Rect};
pub use observer::{Threshold, ViewportObserver};
pub use stage::{
    ElementId, FetchListenerId, IntersectionEntry, Stage, StageHandle, SubscriptionId, TimerId,
};
