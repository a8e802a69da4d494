//! Theme state
//!
//! Holds the active [`ColorScheme`] and notifies subscribers when it changes.
//! The state is an ordinary value owned by the page and passed by reference;
//! there is no global instance.

use crate::scheme::{detect_color_scheme, ColorScheme};
use slotmap::{new_key_type, SlotMap};
use std::cell::{Cell, RefCell};

new_key_type! {
    /// Handle for removing a scheme subscriber
    pub struct ThemeSubscription;
}

type SchemeListener = Box<dyn FnMut(ColorScheme)>;

pub struct ThemeState {
    scheme: Cell<ColorScheme>,
    /// `None` while the listener is being called
    subscribers: RefCell<SlotMap<ThemeSubscription, Option<SchemeListener>>>,
}

impl ThemeState {
    pub fn new(scheme: ColorScheme) -> Self {
        Self {
            scheme: Cell::new(scheme),
            subscribers: RefCell::new(SlotMap::with_key()),
        }
    }

    /// Initialize from the system preference, falling back to light
    pub fn from_system() -> Self {
        let scheme = detect_color_scheme(|key| std::env::var(key).ok());
        tracing::debug!("ThemeState::from_system - detected {:?}", scheme);
        Self::new(scheme)
    }

    /// Get the current color scheme
    pub fn scheme(&self) -> ColorScheme {
        self.scheme.get()
    }

    /// Set the color scheme, notifying subscribers if it changed
    pub fn set_scheme(&self, scheme: ColorScheme) {
        let current = self.scheme.get();
        if current == scheme {
            return;
        }
        tracing::debug!(
            "ThemeState::set_scheme - switching from {:?} to {:?}",
            current,
            scheme
        );
        self.scheme.set(scheme);
        self.notify(scheme);
    }

    /// Toggle between light and dark mode
    pub fn toggle(&self) -> ColorScheme {
        let next = self.scheme().toggle();
        self.set_scheme(next);
        next
    }

    pub fn subscribe<F>(&self, listener: F) -> ThemeSubscription
    where
        F: FnMut(ColorScheme) + 'static,
    {
        self.subscribers
            .borrow_mut()
            .insert(Some(Box::new(listener)))
    }

    pub fn unsubscribe(&self, id: ThemeSubscription) -> bool {
        self.subscribers.borrow_mut().remove(id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    fn notify(&self, scheme: ColorScheme) {
        let ids: Vec<ThemeSubscription> = self.subscribers.borrow().keys().collect();
        for id in ids {
            let taken = self
                .subscribers
                .borrow_mut()
                .get_mut(id)
                .and_then(Option::take);
            let Some(mut listener) = taken else {
                continue;
            };

            listener(scheme);

            // Put it back unless it unsubscribed itself
            if let Some(slot) = self.subscribers.borrow_mut().get_mut(id) {
                *slot = Some(listener);
            }
        }
    }
}

impl Default for ThemeState {
    fn default() -> Self {
        Self::new(ColorScheme::default())
    }
}

impl std::fmt::Debug for ThemeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeState")
            .field("scheme", &self.scheme())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_toggle_notifies_subscribers() {
        let theme = ThemeState::new(ColorScheme::Light);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let seen_clone = seen.clone();
        theme.subscribe(move |scheme| seen_clone.borrow_mut().push(scheme));

        assert_eq!(theme.toggle(), ColorScheme::Dark);
        assert_eq!(theme.toggle(), ColorScheme::Light);
        assert_eq!(*seen.borrow(), vec![ColorScheme::Dark, ColorScheme::Light]);
    }

    #[test]
    fn test_setting_same_scheme_is_silent() {
        let theme = ThemeState::new(ColorScheme::Dark);
        let calls = Rc::new(Cell::new(0));

        let calls_clone = calls.clone();
        theme.subscribe(move |_| calls_clone.set(calls_clone.get() + 1));

        theme.set_scheme(ColorScheme::Dark);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_unsubscribe() {
        let theme = ThemeState::default();
        let calls = Rc::new(Cell::new(0));

        let calls_clone = calls.clone();
        let id = theme.subscribe(move |_| calls_clone.set(calls_clone.get() + 1));
        assert!(theme.unsubscribe(id));
        assert!(!theme.unsubscribe(id));

        theme.toggle();
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_subscriber_may_read_state_during_notify() {
        let theme = Rc::new(ThemeState::default());
        let seen = Rc::new(Cell::new(None));

        let weak = Rc::downgrade(&theme);
        let seen_clone = seen.clone();
        theme.subscribe(move |_| {
            if let Some(theme) = weak.upgrade() {
                seen_clone.set(Some(theme.scheme()));
                theme.subscribe(|_| {});
            }
        });

        theme.toggle();
        assert_eq!(seen.get(), Some(ColorScheme::Dark));
        assert_eq!(theme.subscriber_count(), 2);
    }
}
