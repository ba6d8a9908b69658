//! Event-emitting surfaces
//!
//! The host toolkit exposes every interactive element (and the document) as
//! an [`EventSource`]. Recognition only ever subscribes and unsubscribes; it
//! never emits. [`EventTarget`] is a small in-memory implementation that
//! hosts can drive from their own event loop.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use super::event::{InputEvent, RawEventKind};

/// Identity of a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u64);

impl SurfaceId {
    /// Allocate a process-unique id
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        SurfaceId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// Identity of one subscription on a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Listener registration options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListenOptions {
    /// A passive listener promises not to suppress the default action
    pub passive: bool,
}

impl ListenOptions {
    pub const ACTIVE: ListenOptions = ListenOptions { passive: false };
    pub const PASSIVE: ListenOptions = ListenOptions { passive: true };
}

pub type Listener = Rc<dyn Fn(&InputEvent)>;

/// Subscribe/unsubscribe surface exposed by the host toolkit
pub trait EventSource {
    fn surface_id(&self) -> SurfaceId;

    fn subscribe(&self, kind: RawEventKind, options: ListenOptions, listener: Listener) -> ListenerId;

    /// Unknown ids are ignored
    fn unsubscribe(&self, kind: RawEventKind, id: ListenerId);
}

struct Subscription {
    id: ListenerId,
    kind: RawEventKind,
    options: ListenOptions,
    listener: Listener,
}

/// In-memory event source
pub struct EventTarget {
    id: SurfaceId,
    subscriptions: RefCell<Vec<Subscription>>,
    next_listener: Cell<u64>,
}

impl EventTarget {
    pub fn new() -> Self {
        Self {
            id: SurfaceId::next(),
            subscriptions: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
        }
    }

    /// Deliver an event to every listener of `kind`, in subscription order.
    /// Returns true if any listener suppressed the default action.
    pub fn emit(&self, kind: RawEventKind, event: &InputEvent) -> bool {
        // Listeners may (un)subscribe while we deliver
        let listeners: Vec<Listener> = self
            .subscriptions
            .borrow()
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.listener.clone())
            .collect();

        trace!(surface = %self.id, %kind, listeners = listeners.len(), "emit");

        for listener in listeners {
            listener(event);
        }
        event.default_prevented()
    }

    /// Total number of live subscriptions
    pub fn listener_count(&self) -> usize {
        self.subscriptions.borrow().len()
    }

    /// Options of every live subscription for `kind`
    pub fn listener_options(&self, kind: RawEventKind) -> Vec<ListenOptions> {
        self.subscriptions
            .borrow()
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.options)
            .collect()
    }
}

impl Default for EventTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for EventTarget {
    fn surface_id(&self) -> SurfaceId {
        self.id
    }

    fn subscribe(&self, kind: RawEventKind, options: ListenOptions, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.subscriptions.borrow_mut().push(Subscription {
            id,
            kind,
            options,
            listener,
        });
        id
    }

    fn unsubscribe(&self, kind: RawEventKind, id: ListenerId) {
        self.subscriptions
            .borrow_mut()
            .retain(|s| !(s.id == id && s.kind == kind));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{MouseButton, PointerEvent};

    fn click_at(x: f64, y: f64) -> InputEvent {
        PointerEvent::new((x, y), MouseButton::Left).into()
    }

    #[test]
    fn test_surface_ids_are_unique() {
        let a = EventTarget::new();
        let b = EventTarget::new();
        assert_ne!(a.surface_id(), b.surface_id());
    }

    #[test]
    fn test_emit_reaches_matching_listeners_only() {
        let target = EventTarget::new();
        let hits = Rc::new(Cell::new(0));

        let h = hits.clone();
        target.subscribe(
            RawEventKind::PointerDown,
            ListenOptions::ACTIVE,
            Rc::new(move |_| h.set(h.get() + 1)),
        );

        target.emit(RawEventKind::PointerDown, &click_at(0.0, 0.0));
        target.emit(RawEventKind::PointerUp, &click_at(0.0, 0.0));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let target = EventTarget::new();
        let hits = Rc::new(Cell::new(0));

        let h = hits.clone();
        let id = target.subscribe(
            RawEventKind::PointerMove,
            ListenOptions::PASSIVE,
            Rc::new(move |_| h.set(h.get() + 1)),
        );
        assert_eq!(target.listener_options(RawEventKind::PointerMove), vec![ListenOptions::PASSIVE]);

        // Wrong kind is ignored
        target.unsubscribe(RawEventKind::PointerUp, id);
        assert_eq!(target.listener_count(), 1);

        target.unsubscribe(RawEventKind::PointerMove, id);
        assert_eq!(target.listener_count(), 0);

        target.emit(RawEventKind::PointerMove, &click_at(0.0, 0.0));
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_emit_reports_prevented_default() {
        let target = EventTarget::new();
        target.subscribe(
            RawEventKind::TouchMove,
            ListenOptions::ACTIVE,
            Rc::new(|event: &InputEvent| event.prevent_default()),
        );
        assert!(target.emit(RawEventKind::TouchMove, &click_at(0.0, 0.0)));
        assert!(!target.emit(RawEventKind::TouchEnd, &click_at(0.0, 0.0)));
    }
}
