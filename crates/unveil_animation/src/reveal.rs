//! One-shot entrance animation gated by viewport entry
//!
//! A [`RevealAnimator`] wraps a subtree's root element. When the element first
//! enters the viewport it schedules the reveal after its delay; when the delay
//! elapses the revealed state is applied exactly once.
//!
//! ```
//! use unveil_animation::{RevealAnimator, VisualState};
//! use unveil_core::{Rect, Stage};
//!
//! let stage = Stage::new(Rect::from_size(800.0, 600.0));
//! let heading = stage.mount(Rect::new(0.0, 100.0, 800.0, 80.0));
//!
//! let reveal = RevealAnimator::wrap(&stage.handle(), Some(heading), 100);
//! stage.flush();
//! assert!(!reveal.is_revealed());
//!
//! stage.advance(100);
//! assert!(reveal.is_revealed());
//! assert_eq!(reveal.visual_at(stage.now_ms() + 500), VisualState::RESTING);
//! ```

use crate::easing::Easing;
use crate::visual::{reveal_phase, RevealPhase, RevealPreset, RevealTransition, VisualState};
use smallvec::SmallVec;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use unveil_core::{ElementId, StageHandle, Threshold, TimerId, ViewportObserver};

/// Callback invoked with the stage time at which the reveal was applied
pub type RevealListener = Box<dyn FnOnce(u64)>;

/// Configuration for a reveal animator
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RevealConfig {
    pub threshold: Threshold,
    pub delay_ms: u64,
    pub transition: RevealTransition,
}

impl RevealConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn threshold(mut self, threshold: Threshold) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn duration(mut self, duration_ms: u32) -> Self {
        self.transition.duration_ms = duration_ms;
        self
    }

    pub fn preset(mut self, preset: RevealPreset) -> Self {
        self.transition.preset = preset;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.transition.easing = easing;
        self
    }

    /// Wrap `target` with this configuration
    pub fn build(self, stage: &StageHandle, target: Option<ElementId>) -> RevealAnimator {
        RevealAnimator::with_config(stage, target, self)
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            threshold: Threshold::default(),
            delay_ms: 0,
            transition: RevealTransition::default(),
        }
    }
}

/// State shared with the observer and timer callbacks
///
/// Callbacks only ever hold a `Weak` to this, and check `disposed` before
/// touching anything.
#[derive(Default)]
struct RevealShared {
    has_revealed: Cell<bool>,
    revealed_at: Cell<Option<u64>>,
    pending: Cell<Option<TimerId>>,
    disposed: Cell<bool>,
    listeners: RefCell<SmallVec<[RevealListener; 1]>>,
}

impl RevealShared {
    fn apply(&self, now_ms: u64) {
        self.pending.set(None);
        if self.disposed.get() || self.has_revealed.replace(true) {
            return;
        }
        self.revealed_at.set(Some(now_ms));
        tracing::debug!(at_ms = now_ms, "reveal applied");

        let listeners = std::mem::take(&mut *self.listeners.borrow_mut());
        for listener in listeners {
            listener(now_ms);
        }
    }
}

/// Schedule the reveal unless it is done, pending, or disposed
fn schedule_reveal(stage: &StageHandle, shared: &Rc<RevealShared>, delay_ms: u64) -> bool {
    if shared.disposed.get() || shared.has_revealed.get() || shared.pending.get().is_some() {
        return false;
    }

    let weak: Weak<RevealShared> = Rc::downgrade(shared);
    let clock = stage.clone();
    let timer = stage.schedule(delay_ms, move || {
        if let Some(shared) = weak.upgrade() {
            shared.apply(clock.now_ms().unwrap_or_default());
        }
    });

    shared.pending.set(timer);
    timer.is_some()
}

/// Applies an entrance animation to a subtree exactly once
pub struct RevealAnimator {
    stage: StageHandle,
    observer: ViewportObserver,
    shared: Rc<RevealShared>,
    config: RevealConfig,
}

impl RevealAnimator {
    pub fn builder() -> RevealConfig {
        RevealConfig::default()
    }

    /// Wrap `target` with the default fade-up reveal after `delay_ms`
    pub fn wrap(stage: &StageHandle, target: Option<ElementId>, delay_ms: u64) -> Self {
        Self::with_config(stage, target, RevealConfig::default().delay(delay_ms))
    }

    pub fn with_config(stage: &StageHandle, target: Option<ElementId>, config: RevealConfig) -> Self {
        let shared = Rc::new(RevealShared::default());
        let mut observer = ViewportObserver::attach(stage, target, config.threshold);

        let weak = Rc::downgrade(&shared);
        let handle = stage.clone();
        let delay_ms = config.delay_ms;
        observer.on_enter(move |entry| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            tracing::trace!(element = ?entry.element, delay_ms, "reveal scheduled");
            schedule_reveal(&handle, &shared, delay_ms);
        });

        Self {
            stage: stage.clone(),
            observer,
            shared,
            config,
        }
    }

    /// Re-run the reveal trigger
    ///
    /// Only schedules if the element has entered the viewport and no reveal is
    /// pending or applied; otherwise a no-op. Returns whether it scheduled.
    pub fn trigger(&self) -> bool {
        if !self.observer.has_fired() {
            return false;
        }
        schedule_reveal(&self.stage, &self.shared, self.config.delay_ms)
    }

    /// Call `listener` once when the reveal is applied
    ///
    /// Dropped without being called if the animator is disposed first. If the
    /// reveal already happened it is called immediately.
    pub fn on_reveal<F>(&self, listener: F)
    where
        F: FnOnce(u64) + 'static,
    {
        if self.shared.disposed.get() {
            return;
        }
        match self.shared.revealed_at.get() {
            Some(at) => listener(at),
            None => self.shared.listeners.borrow_mut().push(Box::new(listener)),
        }
    }

    /// Whether the viewport signal has fired for this animator
    pub fn has_entered(&self) -> bool {
        self.observer.has_fired()
    }

    pub fn is_pending(&self) -> bool {
        self.shared.pending.get().is_some()
    }

    pub fn is_revealed(&self) -> bool {
        self.shared.has_revealed.get()
    }

    pub fn revealed_at(&self) -> Option<u64> {
        self.shared.revealed_at.get()
    }

    pub fn phase(&self) -> RevealPhase {
        reveal_phase(self.has_entered(), self.is_revealed())
    }

    pub fn delay_ms(&self) -> u64 {
        self.config.delay_ms
    }

    pub fn config(&self) -> &RevealConfig {
        &self.config
    }

    /// Visual state for a renderer at stage time `now_ms`
    pub fn visual_at(&self, now_ms: u64) -> VisualState {
        let elapsed = self
            .shared
            .revealed_at
            .get()
            .map(|at| now_ms.saturating_sub(at));
        self.config.transition.sample(elapsed)
    }

    /// Eased transition progress at stage time `now_ms`, for renderers that
    /// animate something other than the visual state (a bar width, a counter)
    pub fn progress_at(&self, now_ms: u64) -> f32 {
        let elapsed = self
            .shared
            .revealed_at
            .get()
            .map(|at| now_ms.saturating_sub(at));
        self.config.transition.progress(elapsed)
    }

    /// Cancel any pending reveal and stop observing. Idempotent.
    pub fn dispose(&mut self) {
        if self.shared.disposed.replace(true) {
            return;
        }
        self.observer.detach();
        if let Some(timer) = self.shared.pending.take() {
            self.stage.cancel_timer(timer);
            tracing::trace!("pending reveal cancelled");
        }
        self.shared.listeners.borrow_mut().clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.get()
    }
}

impl Drop for RevealAnimator {
    fn drop(&mut self) {
        self.dispose();
    }
}
