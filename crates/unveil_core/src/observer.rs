//! One-shot viewport observation
//!
//! A [`ViewportObserver`] watches a single element and reports the first time
//! its visible fraction reaches the threshold. The subscription is released at
//! the moment it fires, so an element that scrolls out and back in is never
//! reported twice.

use crate::error::{CoreError, Result};
use crate::stage::{ElementId, IntersectionEntry, StageHandle, SubscriptionId};
use std::cell::Cell;
use std::rc::Rc;

/// Fraction of an element's area that must be visible, in `0.0..=1.0`
///
/// A threshold of `0.0` means "any visible area at all".
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Threshold(f32);

impl Threshold {
    pub const ANY: Self = Self(0.0);
    pub const FULL: Self = Self(1.0);

    pub fn new(value: f32) -> Result<Self> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(CoreError::InvalidThreshold(value))
        }
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Whether a visible ratio satisfies this threshold
    pub fn is_met(self, ratio: f32) -> bool {
        if self.0 <= 0.0 {
            ratio > 0.0
        } else {
            ratio >= self.0
        }
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(0.1)
    }
}

/// A one-shot "entered viewport" subscription for one element
///
/// The observer is released when it fires, when [`detach`](Self::detach) is
/// called, or when it is dropped, whichever comes first.
///
/// An observer created without a target never fires; that is not an error.
pub struct ViewportObserver {
    stage: StageHandle,
    target: Option<ElementId>,
    threshold: Threshold,
    subscription: Option<SubscriptionId>,
    fired: Rc<Cell<bool>>,
}

impl ViewportObserver {
    /// Start observing `target`
    ///
    /// The first evaluation happens at the end of the current turn, so a
    /// callback registered right after attaching is not missed.
    pub fn attach(stage: &StageHandle, target: Option<ElementId>, threshold: Threshold) -> Self {
        let fired = Rc::new(Cell::new(false));
        let subscription =
            target.and_then(|element| stage.subscribe(element, threshold, fired.clone()));

        if target.is_none() {
            tracing::trace!("observer attached without a target");
        }

        Self {
            stage: stage.clone(),
            target,
            threshold,
            subscription,
            fired,
        }
    }

    /// Register the callback for the enter signal, replacing any earlier one
    ///
    /// Returns `false` if the observer can no longer fire (inert, detached or
    /// already fired), in which case the callback is dropped.
    pub fn on_enter<F>(&mut self, callback: F) -> bool
    where
        F: FnOnce(IntersectionEntry) + 'static,
    {
        match self.subscription {
            Some(id) if !self.fired.get() => self.stage.set_enter_callback(id, Box::new(callback)),
            _ => false,
        }
    }

    /// Release the observation. Safe to call repeatedly or after firing.
    pub fn detach(&mut self) {
        if let Some(id) = self.subscription.take() {
            if self.stage.unsubscribe(id) {
                tracing::trace!(target = ?self.target, "observer detached");
            }
        }
    }

    pub fn has_fired(&self) -> bool {
        self.fired.get()
    }

    /// Whether the observation is still live on the stage
    pub fn is_attached(&self) -> bool {
        self.subscription
            .is_some_and(|id| !self.fired.get() && self.stage.is_subscribed(id))
    }

    pub fn target(&self) -> Option<ElementId> {
        self.target
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }
}

impl Drop for ViewportObserver {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::stage::Stage;

    /// 100px tall element starting at y = 1000 in an 800x600 viewport
    fn setup() -> (Stage, ElementId) {
        let stage = Stage::new(Rect::from_size(800.0, 600.0));
        let element = stage.mount(Rect::new(0.0, 1000.0, 400.0, 100.0));
        (stage, element)
    }

    /// Scroll so that `fraction` of the element is visible from the top edge
    fn reveal_fraction(stage: &Stage, fraction: f32) {
        // Element top is 1000; viewport bottom is scroll + 600
        stage.scroll_to(1000.0 + 100.0 * fraction - 600.0);
    }

    #[test]
    fn test_threshold_validation() {
        assert!(Threshold::new(0.5).is_ok());
        assert!(Threshold::new(0.0).is_ok());
        assert!(Threshold::new(1.0).is_ok());
        assert_eq!(Threshold::new(1.5), Err(CoreError::InvalidThreshold(1.5)));
        assert!(Threshold::new(-0.1).is_err());
        assert!(Threshold::new(f32::NAN).is_err());
    }

    #[test]
    fn test_zero_threshold_needs_some_area() {
        assert!(!Threshold::ANY.is_met(0.0));
        assert!(Threshold::ANY.is_met(0.01));
    }

    #[test]
    fn test_enter_exit_reenter_fires_once() {
        let (stage, element) = setup();
        let calls = Rc::new(Cell::new(0));

        let mut observer =
            ViewportObserver::attach(&stage.handle(), Some(element), Threshold::default());
        let calls_clone = calls.clone();
        assert!(observer.on_enter(move |_| calls_clone.set(calls_clone.get() + 1)));

        reveal_fraction(&stage, 0.05);
        assert_eq!(calls.get(), 0);
        assert!(!observer.has_fired());

        reveal_fraction(&stage, 0.15);
        assert_eq!(calls.get(), 1);
        assert!(observer.has_fired());
        assert!(!observer.is_attached());

        stage.scroll_to(0.0);
        reveal_fraction(&stage, 0.5);
        assert_eq!(calls.get(), 1);
        assert_eq!(stage.active_subscriptions(), 0);
    }

    #[test]
    fn test_entry_reports_ratio() {
        let (stage, element) = setup();
        let seen = Rc::new(Cell::new(0.0f32));

        let mut observer =
            ViewportObserver::attach(&stage.handle(), Some(element), Threshold::default());
        let seen_clone = seen.clone();
        observer.on_enter(move |entry| seen_clone.set(entry.ratio));

        reveal_fraction(&stage, 0.5);
        assert!((seen.get() - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_already_visible_element_fires_on_flush() {
        let stage = Stage::new(Rect::from_size(800.0, 600.0));
        let element = stage.mount(Rect::new(0.0, 0.0, 100.0, 100.0));
        let hit = Rc::new(Cell::new(false));

        let mut observer =
            ViewportObserver::attach(&stage.handle(), Some(element), Threshold::default());
        let hit_clone = hit.clone();
        observer.on_enter(move |_| hit_clone.set(true));
        assert!(!hit.get());

        stage.flush();
        assert!(hit.get());
    }

    #[test]
    fn test_missing_target_never_fires() {
        let (stage, _) = setup();
        let mut observer = ViewportObserver::attach(&stage.handle(), None, Threshold::default());

        assert!(!observer.on_enter(|_| panic!("inert observer fired")));
        reveal_fraction(&stage, 1.0);
        assert!(!observer.has_fired());
        assert!(!observer.is_attached());
        observer.detach();
    }

    #[test]
    fn test_detach_is_idempotent_and_prevents_firing() {
        let (stage, element) = setup();
        let hit = Rc::new(Cell::new(false));

        let mut observer =
            ViewportObserver::attach(&stage.handle(), Some(element), Threshold::default());
        let hit_clone = hit.clone();
        observer.on_enter(move |_| hit_clone.set(true));

        observer.detach();
        observer.detach();
        reveal_fraction(&stage, 1.0);

        assert!(!hit.get());
        assert!(!observer.has_fired());
        assert_eq!(stage.active_subscriptions(), 0);
    }

    #[test]
    fn test_drop_releases_subscription() {
        let (stage, element) = setup();
        {
            let _observer =
                ViewportObserver::attach(&stage.handle(), Some(element), Threshold::default());
            assert_eq!(stage.active_subscriptions(), 1);
        }
        assert_eq!(stage.active_subscriptions(), 0);
    }

    #[test]
    fn test_detach_after_fire_is_safe() {
        let (stage, element) = setup();
        let mut observer =
            ViewportObserver::attach(&stage.handle(), Some(element), Threshold::default());

        reveal_fraction(&stage, 1.0);
        assert!(observer.has_fired());
        observer.detach();
        assert!(observer.has_fired());
    }

    #[test]
    fn test_unmounted_element_stops_observation() {
        let (stage, element) = setup();
        let hit = Rc::new(Cell::new(false));

        let mut observer =
            ViewportObserver::attach(&stage.handle(), Some(element), Threshold::default());
        let hit_clone = hit.clone();
        observer.on_enter(move |_| hit_clone.set(true));

        stage.unmount(element);
        reveal_fraction(&stage, 1.0);
        assert!(!hit.get());
        assert!(!observer.is_attached());
    }

    #[test]
    fn test_late_callback_rejected_after_fire() {
        let (stage, element) = setup();
        let mut observer =
            ViewportObserver::attach(&stage.handle(), Some(element), Threshold::default());
        reveal_fraction(&stage, 1.0);

        assert!(!observer.on_enter(|_| {}));
    }
}
