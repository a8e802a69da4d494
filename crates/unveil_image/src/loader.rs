//! Placeholder-first progressive image loading
//!
//! A [`ProgressiveImageLoader`] renders a lightweight placeholder until its
//! element enters the viewport, then switches to the real source and waits for
//! the stage to report that the fetch finished.
//!
//! ```text
//! Idle ──(enter)──▶ Fetching ──(fetch ok)──▶ Ready
//!                      │
//!                      └──(fetch failed)──▶ stays Fetching
//! ```

use crate::source::PLACEHOLDER;
use smallvec::SmallVec;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use unveil_core::{ElementId, FetchListenerId, FetchOutcome, StageHandle, Threshold, ViewportObserver};

/// Loading state of a progressive image
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LoadState {
    /// Never visible; showing the placeholder, nothing requested
    #[default]
    Idle,
    /// Visible; the real source is requested but has not finished
    Fetching,
    /// The real source finished loading
    Ready,
}

impl LoadState {
    pub fn as_str(self) -> &'static str {
        match self {
            LoadState::Idle => "idle",
            LoadState::Fetching => "fetching",
            LoadState::Ready => "ready",
        }
    }
}

type ChangeListener = Box<dyn FnMut(LoadState)>;

struct LoaderShared {
    state: Cell<LoadState>,
    listener: Cell<Option<FetchListenerId>>,
    disposed: Cell<bool>,
    on_change: RefCell<SmallVec<[ChangeListener; 1]>>,
}

impl LoaderShared {
    fn new() -> Self {
        Self {
            state: Cell::new(LoadState::Idle),
            listener: Cell::new(None),
            disposed: Cell::new(false),
            on_change: RefCell::new(SmallVec::new()),
        }
    }

    /// Move forward to `next`; states never go backwards
    fn transition(&self, next: LoadState) {
        if self.disposed.get() || next <= self.state.get() {
            return;
        }
        let previous = self.state.replace(next);
        tracing::debug!(from = ?previous, to = ?next, "image load state changed");

        // Listeners may register more listeners while running
        let mut running = std::mem::take(&mut *self.on_change.borrow_mut());
        for listener in running.iter_mut() {
            if self.disposed.get() {
                return;
            }
            listener(next);
        }
        if !self.disposed.get() {
            let mut slot = self.on_change.borrow_mut();
            let added = std::mem::take(&mut *slot);
            *slot = running;
            slot.extend(added);
        }
    }
}

fn fetch_finished(shared: &LoaderShared, url: &str, outcome: &FetchOutcome) {
    shared.listener.set(None);
    match outcome {
        Ok(()) => shared.transition(LoadState::Ready),
        Err(error) => {
            tracing::warn!(url, %error, "image fetch failed; keeping the loading state");
        }
    }
}

/// Shows a placeholder until first visible, then loads the real source
pub struct ProgressiveImageLoader {
    stage: StageHandle,
    observer: ViewportObserver,
    source_url: String,
    shared: Rc<LoaderShared>,
}

impl ProgressiveImageLoader {
    /// Create a loader for `source_url` watching `target` at the default threshold
    pub fn create(stage: &StageHandle, target: Option<ElementId>, source_url: impl Into<String>) -> Self {
        Self::with_threshold(stage, target, source_url, Threshold::default())
    }

    pub fn with_threshold(
        stage: &StageHandle,
        target: Option<ElementId>,
        source_url: impl Into<String>,
        threshold: Threshold,
    ) -> Self {
        let source_url = source_url.into();
        let shared = Rc::new(LoaderShared::new());
        let mut observer = ViewportObserver::attach(stage, target, threshold);

        // Nothing to fetch: stay on the placeholder for good
        if source_url.trim().is_empty() {
            tracing::warn!(?target, "image loader created without a source; showing the placeholder");
            observer.detach();
            return Self {
                stage: stage.clone(),
                observer,
                source_url,
                shared,
            };
        }

        let weak = Rc::downgrade(&shared);
        let handle = stage.clone();
        let url = source_url.clone();
        observer.on_enter(move |_| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            if shared.disposed.get() {
                return;
            }
            shared.transition(LoadState::Fetching);
            Self::request(&handle, &shared, &url);
        });

        Self {
            stage: stage.clone(),
            observer,
            source_url,
            shared,
        }
    }

    fn request(stage: &StageHandle, shared: &Rc<LoaderShared>, url: &str) {
        let weak: Weak<LoaderShared> = Rc::downgrade(shared);
        let owned_url = url.to_string();
        let listener = stage.listen_fetch(url, move |outcome| {
            if let Some(shared) = weak.upgrade() {
                fetch_finished(&shared, &owned_url, outcome);
            }
        });
        shared.listener.set(listener);
    }

    /// The source a renderer should display right now. Never empty.
    pub fn current_render_source(&self) -> &str {
        match self.state() {
            LoadState::Fetching | LoadState::Ready if !self.source_url.trim().is_empty() => &self.source_url,
            _ => PLACEHOLDER,
        }
    }

    pub fn state(&self) -> LoadState {
        self.shared.state.get()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == LoadState::Ready
    }

    /// Whether a renderer should show the image softened while it streams in
    pub fn is_blurred(&self) -> bool {
        self.state() == LoadState::Fetching
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn target(&self) -> Option<ElementId> {
        self.observer.target()
    }

    /// Be told about every state transition
    ///
    /// Never called after the loader is disposed.
    pub fn on_change<F>(&self, listener: F)
    where
        F: FnMut(LoadState) + 'static,
    {
        if !self.shared.disposed.get() {
            self.shared.on_change.borrow_mut().push(Box::new(listener));
        }
    }

    /// Stop observing and ignore any fetch still in flight. Idempotent.
    pub fn dispose(&mut self) {
        if self.shared.disposed.replace(true) {
            return;
        }
        self.observer.detach();
        if let Some(listener) = self.shared.listener.take() {
            self.stage.cancel_fetch(listener);
        }
        self.shared.on_change.borrow_mut().clear();
        tracing::trace!(url = %self.source_url, state = ?self.state(), "image loader disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.get()
    }
}

impl Drop for ProgressiveImageLoader {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unveil_core::{FetchError, Rect, Stage};

    fn setup() -> (Stage, ElementId) {
        let stage = Stage::new(Rect::from_size(800.0, 600.0));
        let element = stage.mount(Rect::new(0.0, 1000.0, 400.0, 300.0));
        (stage, element)
    }

    fn record(loader: &ProgressiveImageLoader) -> Rc<RefCell<Vec<LoadState>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = log.clone();
        loader.on_change(move |state| log_clone.borrow_mut().push(state));
        log
    }

    #[test]
    fn test_enter_then_success() {
        let (stage, element) = setup();
        let loader = ProgressiveImageLoader::create(&stage.handle(), Some(element), "img/a.png");
        let log = record(&loader);

        assert_eq!(loader.state(), LoadState::Idle);
        assert_eq!(loader.current_render_source(), PLACEHOLDER);

        stage.scroll_to(600.0);
        assert_eq!(loader.state(), LoadState::Fetching);
        assert_eq!(loader.current_render_source(), "img/a.png");
        assert!(loader.is_blurred());
        assert_eq!(stage.requested_urls(), vec!["img/a.png".to_string()]);

        stage.complete_fetch("img/a.png", Ok(()));
        assert!(loader.is_ready());
        assert!(!loader.is_blurred());
        assert_eq!(loader.current_render_source(), "img/a.png");
        assert_eq!(*log.borrow(), vec![LoadState::Fetching, LoadState::Ready]);
    }

    #[test]
    fn test_blank_source_keeps_placeholder() {
        let stage = Stage::new(Rect::from_size(800.0, 600.0));
        let visible = stage.mount(Rect::new(0.0, 0.0, 400.0, 300.0));

        for blank in ["", "   "] {
            let loader = ProgressiveImageLoader::create(&stage.handle(), Some(visible), blank);
            stage.flush();

            assert_eq!(loader.state(), LoadState::Idle);
            assert!(!loader.current_render_source().is_empty());
            assert_eq!(loader.current_render_source(), PLACEHOLDER);
            assert_eq!(loader.target(), Some(visible));
        }
        assert!(stage.requested_urls().is_empty());
        assert_eq!(stage.active_subscriptions(), 0);
        assert_eq!(stage.pending_fetch_listeners(), 0);
    }

    #[test]
    fn test_never_visible_never_fetches() {
        let (stage, element) = setup();
        let loader = ProgressiveImageLoader::create(&stage.handle(), Some(element), "img/a.png");

        stage.scroll_to(100.0);
        stage.advance(60_000);
        assert_eq!(loader.state(), LoadState::Idle);
        assert!(stage.requested_urls().is_empty());
    }

    #[test]
    fn test_failure_stays_fetching() {
        let (stage, element) = setup();
        let loader = ProgressiveImageLoader::create(&stage.handle(), Some(element), "img/a.png");
        let log = record(&loader);

        stage.scroll_to(600.0);
        stage.complete_fetch(
            "img/a.png",
            Err(FetchError::Status {
                url: "img/a.png".into(),
                status: 404,
            }),
        );

        assert_eq!(loader.state(), LoadState::Fetching);
        assert_eq!(loader.current_render_source(), "img/a.png");
        assert_eq!(*log.borrow(), vec![LoadState::Fetching]);
    }

    #[test]
    fn test_completion_for_other_url_is_ignored() {
        let (stage, element) = setup();
        let loader = ProgressiveImageLoader::create(&stage.handle(), Some(element), "img/a.png");

        stage.scroll_to(600.0);
        stage.complete_fetch("img/b.png", Ok(()));
        assert_eq!(loader.state(), LoadState::Fetching);
    }

    #[test]
    fn test_dispose_mid_fetch_blocks_late_completion() {
        let (stage, element) = setup();
        let mut loader = ProgressiveImageLoader::create(&stage.handle(), Some(element), "img/a.png");
        let log = record(&loader);

        stage.scroll_to(600.0);
        assert_eq!(stage.pending_fetch_listeners(), 1);

        loader.dispose();
        loader.dispose();
        assert_eq!(stage.pending_fetch_listeners(), 0);

        stage.complete_fetch("img/a.png", Ok(()));
        assert_eq!(loader.state(), LoadState::Fetching);
        assert_eq!(*log.borrow(), vec![LoadState::Fetching]);
    }

    #[test]
    fn test_dispose_before_entry_prevents_request() {
        let (stage, element) = setup();
        let loader = ProgressiveImageLoader::create(&stage.handle(), Some(element), "img/a.png");
        drop(loader);

        stage.scroll_to(600.0);
        assert!(stage.requested_urls().is_empty());
        assert_eq!(stage.active_subscriptions(), 0);
    }

    #[test]
    fn test_shared_source_requested_once() {
        let stage = Stage::new(Rect::from_size(800.0, 600.0));
        let first = stage.mount(Rect::new(0.0, 0.0, 200.0, 200.0));
        let second = stage.mount(Rect::new(300.0, 0.0, 200.0, 200.0));

        let a = ProgressiveImageLoader::create(&stage.handle(), Some(first), "img/logo.svg");
        let b = ProgressiveImageLoader::create(&stage.handle(), Some(second), "img/logo.svg");
        stage.flush();

        assert_eq!(stage.requested_urls().len(), 1);
        stage.complete_fetch("img/logo.svg", Ok(()));
        assert!(a.is_ready());
        assert!(b.is_ready());
    }

    #[test]
    fn test_cached_source_ready_without_request() {
        let stage = Stage::new(Rect::from_size(800.0, 600.0));
        let top = stage.mount(Rect::new(0.0, 0.0, 200.0, 200.0));
        let below = stage.mount(Rect::new(0.0, 2000.0, 200.0, 200.0));

        let first = ProgressiveImageLoader::create(&stage.handle(), Some(top), "img/a.png");
        stage.flush();
        stage.complete_fetch("img/a.png", Ok(()));
        assert!(first.is_ready());

        let second = ProgressiveImageLoader::create(&stage.handle(), Some(below), "img/a.png");
        stage.scroll_to(1800.0);
        assert!(second.is_ready());
        assert_eq!(stage.requested_urls().len(), 1);
    }

    #[test]
    fn test_missing_target_keeps_placeholder() {
        let (stage, _) = setup();
        let loader = ProgressiveImageLoader::create(&stage.handle(), None, "img/a.png");

        stage.scroll_to(600.0);
        assert_eq!(loader.current_render_source(), PLACEHOLDER);
        assert!(stage.requested_urls().is_empty());
    }

    #[test]
    fn test_listener_added_during_change_is_kept() {
        let (stage, element) = setup();
        let loader = Rc::new(ProgressiveImageLoader::create(
            &stage.handle(),
            Some(element),
            "img/a.png",
        ));
        let late = Rc::new(Cell::new(0));

        let weak = Rc::downgrade(&loader);
        let late_clone = late.clone();
        let mut armed = true;
        loader.on_change(move |_| {
            if std::mem::take(&mut armed) {
                if let Some(loader) = weak.upgrade() {
                    let late = late_clone.clone();
                    loader.on_change(move |_| late.set(late.get() + 1));
                }
            }
        });

        stage.scroll_to(600.0);
        stage.complete_fetch("img/a.png", Ok(()));
        assert_eq!(late.get(), 1);
    }
}
