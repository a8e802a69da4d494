//! Unveil Animation System
//!
//! One-shot entrance animations driven by viewport entry.
//!
//! # Features
//!
//! - **Reveal**: apply a revealed state exactly once after entry plus a delay
//! - **Stagger**: cascade sibling reveals with increasing delays
//! - **Visual states**: pre-reveal presets sampled over time for renderers
//! - **Easing**: standard curves and CSS cubic-bezier

pub mod easing;
pub mod reveal;
pub mod stagger;
pub mod visual;

pub use easing::Easing;
pub use reveal::{RevealAnimator, RevealConfig, RevealListener};
pub use stagger::{compute_delays, StaggerDirection, StaggerGroup};
pub use visual::{reveal_phase, RevealPhase, RevealPreset, RevealTransition, VisualState};
