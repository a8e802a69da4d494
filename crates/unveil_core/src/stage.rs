//! Host runtime
//!
//! The stage stands in for the environment the engine runs inside: it owns
//! element geometry and the viewport, a virtual millisecond clock, one-shot
//! timers and fetch-completion listeners. Components never hold the stage
//! itself, only a [`StageHandle`] (a weak reference), mirroring how animated
//! values hold a scheduler handle.
//!
//! Every suspension point is a generational `slotmap` key. Cancelling removes
//! the entry, so a stale key can never be delivered.
//!
//! # Turns
//!
//! Host operations ([`Stage::scroll_to`], [`Stage::advance`],
//! [`Stage::complete_fetch`], ...) end with a [`Stage::flush`], which delivers
//! work one callback at a time until the stage is quiescent:
//!
//! 1. viewport crossings (re-evaluated whenever geometry or subscriptions change)
//! 2. due timers, earliest deadline first, ties in scheduling order
//! 3. fetch completions, per listener
//!
//! Each callback is removed from its table right before it runs and no borrow
//! of the stage is held while it runs, so callbacks may freely schedule,
//! cancel or subscribe.

use crate::error::{CoreError, Result};
use crate::fetch::{FetchBackend, FetchCompletion, FetchOutcome};
use crate::geometry::{intersection_ratio, Rect};
use crate::observer::Threshold;
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

new_key_type! {
    /// A mounted element
    pub struct ElementId;
    /// A live viewport subscription
    pub struct SubscriptionId;
    /// A scheduled one-shot timer
    pub struct TimerId;
    /// A registered fetch-completion listener
    pub struct FetchListenerId;
}

/// Callback invoked when an observed element enters the viewport
pub type EnterCallback = Box<dyn FnOnce(IntersectionEntry)>;

/// Callback invoked when a timer elapses
pub type TimerCallback = Box<dyn FnOnce()>;

/// Callback invoked when a fetch for a URL completes
pub type FetchCallback = Box<dyn FnOnce(&FetchOutcome)>;

/// Snapshot delivered with a viewport-entered signal
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntersectionEntry {
    pub element: ElementId,
    /// Visible fraction of the element at the moment of crossing
    pub ratio: f32,
    /// Stage time of the crossing
    pub time_ms: u64,
}

struct Subscription {
    element: ElementId,
    threshold: Threshold,
    fired: Rc<Cell<bool>>,
    callback: Option<EnterCallback>,
}

struct Timer {
    deadline_ms: u64,
    seq: u64,
    callback: TimerCallback,
}

struct FetchListener {
    url: String,
    callback: FetchCallback,
}

enum Dispatch {
    Enter(Option<EnterCallback>, IntersectionEntry),
    Timer(TimerCallback),
    Fetch(FetchCallback, FetchOutcome),
}

impl Dispatch {
    fn run(self) {
        match self {
            Dispatch::Enter(callback, entry) => {
                if let Some(callback) = callback {
                    callback(entry);
                }
            }
            Dispatch::Timer(callback) => callback(),
            Dispatch::Fetch(callback, outcome) => callback(&outcome),
        }
    }
}

/// Internal state of the stage
struct StageInner {
    now_ms: u64,
    viewport: Rect,
    elements: SlotMap<ElementId, Rect>,

    subscriptions: SlotMap<SubscriptionId, Subscription>,
    /// Crossings found by the last evaluation, not yet delivered
    pending_enters: VecDeque<(SubscriptionId, f32)>,
    geometry_dirty: bool,

    timers: SlotMap<TimerId, Timer>,
    next_timer_seq: u64,

    listeners: SlotMap<FetchListenerId, FetchListener>,
    listeners_by_url: FxHashMap<String, SmallVec<[FetchListenerId; 2]>>,
    pending_fetch: VecDeque<(FetchListenerId, FetchOutcome)>,
    completions: VecDeque<FetchCompletion>,
    in_flight: FxHashSet<String>,
    loaded: FxHashSet<String>,
    /// Every network request issued, in order
    requested: Vec<String>,
    backend: Option<Box<dyn FetchBackend>>,
}

impl StageInner {
    fn new(viewport: Rect) -> Self {
        Self {
            now_ms: 0,
            viewport,
            elements: SlotMap::with_key(),
            subscriptions: SlotMap::with_key(),
            pending_enters: VecDeque::new(),
            geometry_dirty: false,
            timers: SlotMap::with_key(),
            next_timer_seq: 0,
            listeners: SlotMap::with_key(),
            listeners_by_url: FxHashMap::default(),
            pending_fetch: VecDeque::new(),
            completions: VecDeque::new(),
            in_flight: FxHashSet::default(),
            loaded: FxHashSet::default(),
            requested: Vec::new(),
            backend: None,
        }
    }

    fn subscribe(
        &mut self,
        element: ElementId,
        threshold: Threshold,
        fired: Rc<Cell<bool>>,
    ) -> Option<SubscriptionId> {
        if !self.elements.contains_key(element) {
            tracing::debug!(?element, "observe on unmounted element ignored");
            return None;
        }

        if self.subscriptions.values().any(|s| s.element == element) {
            tracing::warn!(?element, "element is already observed by another instance");
        }

        let id = self.subscriptions.insert(Subscription {
            element,
            threshold,
            fired,
            callback: None,
        });
        self.geometry_dirty = true;
        Some(id)
    }

    fn schedule(&mut self, delay_ms: u64, callback: TimerCallback) -> TimerId {
        let seq = self.next_timer_seq;
        self.next_timer_seq += 1;
        self.timers.insert(Timer {
            deadline_ms: self.now_ms.saturating_add(delay_ms),
            seq,
            callback,
        })
    }

    fn listen(&mut self, url: &str, callback: FetchCallback) -> FetchListenerId {
        let id = self.listeners.insert(FetchListener {
            url: url.to_string(),
            callback,
        });
        self.listeners_by_url
            .entry(url.to_string())
            .or_default()
            .push(id);

        if self.loaded.contains(url) {
            // Already in the cache: completes on the next turn without a request
            self.completions.push_back(FetchCompletion::success(url));
        } else if self.in_flight.insert(url.to_string()) {
            tracing::debug!(url, "issuing fetch");
            self.requested.push(url.to_string());
            if let Some(backend) = self.backend.as_mut() {
                backend.request(url);
            }
        }

        id
    }

    /// Drop a listener and its entry in the per-url index
    fn cancel_listener(&mut self, id: FetchListenerId) -> bool {
        let Some(listener) = self.listeners.remove(id) else {
            return false;
        };
        if let Some(waiting) = self.listeners_by_url.get_mut(&listener.url) {
            waiting.retain(|w| *w != id);
            if waiting.is_empty() {
                self.listeners_by_url.remove(&listener.url);
            }
        }
        true
    }

    fn next_deadline(&self) -> Option<u64> {
        self.timers.values().map(|t| t.deadline_ms).min()
    }

    fn earliest_due_timer(&self) -> Option<TimerId> {
        self.timers
            .iter()
            .filter(|(_, t)| t.deadline_ms <= self.now_ms)
            .min_by_key(|(_, t)| (t.deadline_ms, t.seq))
            .map(|(id, _)| id)
    }

    fn evaluate_intersections(&mut self) {
        let viewport = self.viewport;
        let elements = &self.elements;

        self.pending_enters = self
            .subscriptions
            .iter()
            .filter_map(|(id, sub)| {
                let rect = elements.get(sub.element)?;
                let ratio = intersection_ratio(rect, &viewport);
                sub.threshold.is_met(ratio).then_some((id, ratio))
            })
            .collect();
    }

    fn accept_completion(&mut self, completion: FetchCompletion) {
        let FetchCompletion { url, outcome } = completion;
        self.in_flight.remove(&url);

        match &outcome {
            Ok(()) => {
                self.loaded.insert(url.clone());
            }
            Err(err) => tracing::debug!(url = %url, %err, "fetch failed"),
        }

        let waiting = self.listeners_by_url.remove(&url).unwrap_or_default();
        if waiting.is_empty() {
            tracing::trace!(url = %url, "completion with no listeners");
        }
        self.pending_fetch
            .extend(waiting.into_iter().map(|id| (id, outcome.clone())));
    }

    /// Take the next piece of ready work out of the tables
    fn next_dispatch(&mut self) -> Option<Dispatch> {
        loop {
            if self.geometry_dirty {
                self.geometry_dirty = false;
                self.evaluate_intersections();
            }

            if let Some((id, ratio)) = self.pending_enters.pop_front() {
                let Some(sub) = self.subscriptions.remove(id) else {
                    continue;
                };
                sub.fired.set(true);
                tracing::trace!(element = ?sub.element, ratio, "viewport entered");
                let entry = IntersectionEntry {
                    element: sub.element,
                    ratio,
                    time_ms: self.now_ms,
                };
                return Some(Dispatch::Enter(sub.callback, entry));
            }

            if let Some(id) = self.earliest_due_timer() {
                if let Some(timer) = self.timers.remove(id) {
                    return Some(Dispatch::Timer(timer.callback));
                }
            }

            if let Some((id, outcome)) = self.pending_fetch.pop_front() {
                let Some(listener) = self.listeners.remove(id) else {
                    continue;
                };
                return Some(Dispatch::Fetch(listener.callback, outcome));
            }

            let completion = self.completions.pop_front()?;
            self.accept_completion(completion);
        }
    }
}

/// The host runtime that owns geometry, time and pending work
///
/// ```
/// use unveil_core::{Rect, Stage, Threshold, ViewportObserver};
///
/// let stage = Stage::new(Rect::from_size(800.0, 600.0));
/// let card = stage.mount(Rect::new(0.0, 1200.0, 400.0, 300.0));
///
/// let mut observer = ViewportObserver::attach(&stage.handle(), Some(card), Threshold::default());
/// observer.on_enter(|entry| assert!(entry.ratio >= 0.1));
///
/// stage.scroll_to(1000.0);
/// assert!(observer.has_fired());
/// ```
pub struct Stage {
    inner: Rc<RefCell<StageInner>>,
}

impl Stage {
    pub fn new(viewport: Rect) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StageInner::new(viewport))),
        }
    }

    /// Get a weak handle for components
    pub fn handle(&self) -> StageHandle {
        StageHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Install the backend that performs network requests
    pub fn set_backend(&self, backend: impl FetchBackend + 'static) {
        self.inner.borrow_mut().backend = Some(Box::new(backend));
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// Mount an element at the given document rectangle
    ///
    /// Mounting does not flush; observers attached to the new element are
    /// evaluated on the next turn.
    pub fn mount(&self, rect: Rect) -> ElementId {
        let mut inner = self.inner.borrow_mut();
        inner.geometry_dirty = true;
        inner.elements.insert(rect)
    }

    /// Unmount an element. Observations of it end without firing.
    pub fn unmount(&self, id: ElementId) -> bool {
        let (existed, released) = {
            let mut inner = self.inner.borrow_mut();
            let existed = inner.elements.remove(id).is_some();
            let doomed: Vec<SubscriptionId> = inner
                .subscriptions
                .iter()
                .filter(|(_, s)| s.element == id)
                .map(|(sid, _)| sid)
                .collect();
            let released: Vec<Subscription> = doomed
                .into_iter()
                .filter_map(|sid| inner.subscriptions.remove(sid))
                .collect();
            (existed, released)
        };

        if !released.is_empty() {
            tracing::debug!(element = ?id, count = released.len(), "released observations on unmount");
        }
        existed
    }

    /// Move or resize a mounted element
    pub fn move_element(&self, id: ElementId, rect: Rect) -> Result<()> {
        {
            let mut inner = self.inner.borrow_mut();
            let slot = inner
                .elements
                .get_mut(id)
                .ok_or(CoreError::UnknownElement(id))?;
            *slot = rect;
            inner.geometry_dirty = true;
        }
        self.flush();
        Ok(())
    }

    pub fn element_rect(&self, id: ElementId) -> Option<Rect> {
        self.inner.borrow().elements.get(id).copied()
    }

    /// Current visible fraction of an element
    pub fn ratio_of(&self, id: ElementId) -> Option<f32> {
        let inner = self.inner.borrow();
        inner
            .elements
            .get(id)
            .map(|rect| intersection_ratio(rect, &inner.viewport))
    }

    pub fn viewport(&self) -> Rect {
        self.inner.borrow().viewport
    }

    /// Replace the viewport rectangle (resize or jump)
    pub fn set_viewport(&self, viewport: Rect) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.viewport = viewport;
            inner.geometry_dirty = true;
        }
        self.flush();
    }

    /// Scroll the viewport to a vertical offset
    pub fn scroll_to(&self, y: f32) {
        let viewport = self.viewport().with_y(y.max(0.0));
        self.set_viewport(viewport);
    }

    pub fn scroll_by(&self, dy: f32) {
        self.scroll_to(self.scroll_y() + dy);
    }

    pub fn scroll_y(&self) -> f32 {
        self.inner.borrow().viewport.y
    }

    // =========================================================================
    // Time
    // =========================================================================

    pub fn now_ms(&self) -> u64 {
        self.inner.borrow().now_ms
    }

    /// Advance the clock, firing timers at their own deadlines
    pub fn advance(&self, ms: u64) {
        let target = self.now_ms().saturating_add(ms);
        self.flush();

        loop {
            let stepped = {
                let mut inner = self.inner.borrow_mut();
                match inner.next_deadline() {
                    Some(deadline) if deadline <= target => {
                        inner.now_ms = inner.now_ms.max(deadline);
                        true
                    }
                    _ => {
                        inner.now_ms = target;
                        false
                    }
                }
            };
            self.flush();
            if !stepped {
                break;
            }
        }
    }

    // =========================================================================
    // Fetches
    // =========================================================================

    /// Deliver a completion signal for `url`
    pub fn complete_fetch(&self, url: &str, outcome: FetchOutcome) {
        self.inner.borrow_mut().completions.push_back(FetchCompletion {
            url: url.to_string(),
            outcome,
        });
        self.flush();
    }

    /// Drain the backend's completions and deliver them
    pub fn pump_backend(&self) -> usize {
        let arrived = {
            let mut inner = self.inner.borrow_mut();
            let arrived = inner
                .backend
                .as_mut()
                .map(|backend| backend.poll())
                .unwrap_or_default();
            let count = arrived.len();
            inner.completions.extend(arrived);
            count
        };
        self.flush();
        arrived
    }

    /// URLs requested so far, in request order
    pub fn requested_urls(&self) -> Vec<String> {
        self.inner.borrow().requested.clone()
    }

    pub fn was_requested(&self, url: &str) -> bool {
        self.inner.borrow().requested.iter().any(|u| u == url)
    }

    // =========================================================================
    // Turn processing
    // =========================================================================

    /// Deliver all ready work
    pub fn flush(&self) {
        loop {
            let next = self.inner.borrow_mut().next_dispatch();
            match next {
                Some(dispatch) => dispatch.run(),
                None => break,
            }
        }
    }

    pub fn active_subscriptions(&self) -> usize {
        self.inner.borrow().subscriptions.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    pub fn pending_fetch_listeners(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Listeners still waiting on `url`
    pub fn listeners_for(&self, url: &str) -> usize {
        self.inner
            .borrow()
            .listeners_by_url
            .get(url)
            .map_or(0, |waiting| waiting.len())
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new(Rect::from_size(1280.0, 720.0))
    }
}

/// A weak handle to the stage
///
/// All operations are no-ops (or return `None`) once the stage is dropped.
#[derive(Clone)]
pub struct StageHandle {
    inner: Weak<RefCell<StageInner>>,
}

impl StageHandle {
    /// A handle that is not connected to any stage
    pub fn detached() -> Self {
        Self { inner: Weak::new() }
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    pub fn now_ms(&self) -> Option<u64> {
        self.inner.upgrade().map(|inner| inner.borrow().now_ms)
    }

    pub fn element_rect(&self, id: ElementId) -> Option<Rect> {
        self.inner
            .upgrade()
            .and_then(|inner| inner.borrow().elements.get(id).copied())
    }

    // =========================================================================
    // Subscriptions (driven by ViewportObserver)
    // =========================================================================

    pub(crate) fn subscribe(
        &self,
        element: ElementId,
        threshold: Threshold,
        fired: Rc<Cell<bool>>,
    ) -> Option<SubscriptionId> {
        self.inner
            .upgrade()
            .and_then(|inner| inner.borrow_mut().subscribe(element, threshold, fired))
    }

    pub(crate) fn set_enter_callback(&self, id: SubscriptionId, callback: EnterCallback) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };
        let previous = {
            let mut inner = inner.borrow_mut();
            match inner.subscriptions.get_mut(id) {
                Some(sub) => sub.callback.replace(callback),
                None => return false,
            }
        };
        if previous.is_some() {
            tracing::debug!("replaced enter callback");
        }
        true
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };
        let removed = inner.borrow_mut().subscriptions.remove(id);
        removed.is_some()
    }

    pub(crate) fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| inner.borrow().subscriptions.contains_key(id))
    }

    // =========================================================================
    // Timers
    // =========================================================================

    /// Schedule `callback` to run after `delay_ms` of stage time
    pub fn schedule<F>(&self, delay_ms: u64, callback: F) -> Option<TimerId>
    where
        F: FnOnce() + 'static,
    {
        self.inner
            .upgrade()
            .map(|inner| inner.borrow_mut().schedule(delay_ms, Box::new(callback)))
    }

    /// Cancel a timer. Returns `false` if it already ran or was cancelled.
    pub fn cancel_timer(&self, id: TimerId) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };
        let removed = inner.borrow_mut().timers.remove(id);
        removed.is_some()
    }

    pub fn is_timer_pending(&self, id: TimerId) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| inner.borrow().timers.contains_key(id))
    }

    // =========================================================================
    // Fetch listeners
    // =========================================================================

    /// Listen for the completion of `url`, issuing the request if needed
    pub fn listen_fetch<F>(&self, url: &str, callback: F) -> Option<FetchListenerId>
    where
        F: FnOnce(&FetchOutcome) + 'static,
    {
        self.inner
            .upgrade()
            .map(|inner| inner.borrow_mut().listen(url, Box::new(callback)))
    }

    /// Cancel a fetch listener. The request itself is left alone.
    pub fn cancel_fetch(&self, id: FetchListenerId) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };
        let removed = inner.borrow_mut().cancel_listener(id);
        removed
    }
}
