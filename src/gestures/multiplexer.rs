//! Per-surface fan-out of raw input to recognizers

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use super::{Recognizer, RecognizerId};
use crate::input::{EventSource, InputEvent, ListenOptions, ListenerId, RawEventKind, SurfaceId};

/// Recognizers attached to one surface, in attachment order
#[derive(Default)]
pub struct Registry {
    recognizers: Vec<Rc<dyn Recognizer>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, recognizer: Rc<dyn Recognizer>) {
        self.recognizers.push(recognizer);
    }

    /// Remove a recognizer; unknown ids return None
    pub fn detach(&mut self, id: RecognizerId) -> Option<Rc<dyn Recognizer>> {
        let index = self.recognizers.iter().position(|r| r.id() == id)?;
        Some(self.recognizers.remove(index))
    }

    pub fn contains(&self, id: RecognizerId) -> bool {
        self.recognizers.iter().any(|r| r.id() == id)
    }

    pub fn get(&self, id: RecognizerId) -> Option<Rc<dyn Recognizer>> {
        self.recognizers.iter().find(|r| r.id() == id).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.recognizers.is_empty()
    }

    /// Copy of the list to dispatch over
    pub fn snapshot(&self) -> Vec<Rc<dyn Recognizer>> {
        self.recognizers.clone()
    }

    pub fn ids(&self) -> Vec<RecognizerId> {
        self.recognizers.iter().map(|r| r.id()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Surface,
    Document,
}

const SURFACE_EVENTS: [(RawEventKind, ListenOptions); 7] = [
    (RawEventKind::PointerDown, ListenOptions::ACTIVE),
    (RawEventKind::PointerMove, ListenOptions::ACTIVE),
    (RawEventKind::PointerUp, ListenOptions::ACTIVE),
    (RawEventKind::TouchStart, ListenOptions::PASSIVE),
    // Recognizers may suppress scrolling
    (RawEventKind::TouchMove, ListenOptions::ACTIVE),
    (RawEventKind::TouchEnd, ListenOptions::ACTIVE),
    (RawEventKind::TouchCancel, ListenOptions::ACTIVE),
];

const DOCUMENT_EVENTS: [(RawEventKind, ListenOptions); 4] = [
    (RawEventKind::PointerMove, ListenOptions::ACTIVE),
    (RawEventKind::PointerUp, ListenOptions::ACTIVE),
    (RawEventKind::TouchMove, ListenOptions::PASSIVE),
    (RawEventKind::TouchEnd, ListenOptions::PASSIVE),
];

/// Owns the raw subscriptions of one surface and dispatches to its registry
///
/// Created by [`GestureHost`](super::GestureHost) on the first attach and torn
/// down when the last recognizer detaches.
pub struct Multiplexer {
    surface: Rc<dyn EventSource>,
    document: Rc<dyn EventSource>,
    registry: RefCell<Registry>,
    subscriptions: RefCell<Vec<(Target, RawEventKind, ListenerId)>>,
}

impl Multiplexer {
    pub fn new(surface: Rc<dyn EventSource>, document: Rc<dyn EventSource>) -> Rc<Self> {
        Rc::new_cyclic(|weak: &Weak<Multiplexer>| {
            let mut subscriptions = Vec::with_capacity(SURFACE_EVENTS.len() + DOCUMENT_EVENTS.len());
            for (target, source, events) in [
                (Target::Surface, &surface, &SURFACE_EVENTS[..]),
                (Target::Document, &document, &DOCUMENT_EVENTS[..]),
            ] {
                for &(kind, options) in events {
                    let weak = weak.clone();
                    let id = source.subscribe(
                        kind,
                        options,
                        Rc::new(move |event: &InputEvent| {
                            if let Some(multiplexer) = weak.upgrade() {
                                multiplexer.dispatch(target, kind, event);
                            }
                        }),
                    );
                    subscriptions.push((target, kind, id));
                }
            }
            debug!(surface = %surface.surface_id(), "gesture multiplexer installed");

            Multiplexer {
                surface,
                document,
                registry: RefCell::new(Registry::new()),
                subscriptions: RefCell::new(subscriptions),
            }
        })
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.surface.surface_id()
    }

    /// Identity of the document used for drag fallback
    pub fn document_id(&self) -> SurfaceId {
        self.document.surface_id()
    }

    pub fn attach(&self, recognizer: Rc<dyn Recognizer>) {
        debug!(
            surface = %self.surface_id(),
            recognizer = %recognizer.id(),
            kind = %recognizer.kind(),
            "recognizer attached"
        );
        self.registry.borrow_mut().attach(recognizer);
    }

    pub fn detach(&self, id: RecognizerId) -> Option<Rc<dyn Recognizer>> {
        let recognizer = self.registry.borrow_mut().detach(id);
        if recognizer.is_some() {
            debug!(surface = %self.surface_id(), recognizer = %id, "recognizer detached");
        }
        recognizer
    }

    pub fn get(&self, id: RecognizerId) -> Option<Rc<dyn Recognizer>> {
        self.registry.borrow().get(id)
    }

    pub fn contains(&self, id: RecognizerId) -> bool {
        self.registry.borrow().contains(id)
    }

    pub fn recognizer_ids(&self) -> Vec<RecognizerId> {
        self.registry.borrow().ids()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.borrow().is_empty()
    }

    /// Whether the raw subscriptions are still installed
    pub fn is_live(&self) -> bool {
        !self.subscriptions.borrow().is_empty()
    }

    /// Release every raw subscription. Safe to call more than once.
    pub fn teardown(&self) {
        let subscriptions = std::mem::take(&mut *self.subscriptions.borrow_mut());
        if subscriptions.is_empty() {
            return;
        }
        for (target, kind, id) in subscriptions {
            match target {
                Target::Surface => self.surface.unsubscribe(kind, id),
                Target::Document => self.document.unsubscribe(kind, id),
            }
        }
        debug!(surface = %self.surface_id(), "gesture multiplexer removed");
    }

    fn dispatch(&self, target: Target, kind: RawEventKind, event: &InputEvent) {
        // Callbacks may detach recognizers, including ones later in the list
        let recognizers = self.registry.borrow().snapshot();
        trace!(surface = %self.surface_id(), ?target, %kind, recognizers = recognizers.len(), "dispatch");

        for recognizer in recognizers {
            if recognizer.is_paused() || !self.contains(recognizer.id()) {
                continue;
            }
            match (target, event) {
                (Target::Surface, InputEvent::Pointer(e)) => match kind {
                    RawEventKind::PointerDown => recognizer.pointer_down(e),
                    RawEventKind::PointerMove => recognizer.pointer_move(e),
                    RawEventKind::PointerUp => recognizer.pointer_up(e),
                    _ => mismatch(kind, event),
                },
                (Target::Surface, InputEvent::Touch(e)) => match kind {
                    RawEventKind::TouchStart => recognizer.touch_start(e),
                    RawEventKind::TouchMove => recognizer.touch_move(e),
                    RawEventKind::TouchEnd => recognizer.touch_end(e),
                    RawEventKind::TouchCancel => recognizer.touch_cancel(e),
                    _ => mismatch(kind, event),
                },
                (Target::Document, InputEvent::Pointer(e)) => match kind {
                    RawEventKind::PointerMove => recognizer.document_pointer_move(e),
                    RawEventKind::PointerUp => recognizer.document_pointer_up(e),
                    _ => mismatch(kind, event),
                },
                (Target::Document, InputEvent::Touch(e)) => match kind {
                    RawEventKind::TouchMove => recognizer.document_touch_move(e),
                    RawEventKind::TouchEnd => recognizer.document_touch_end(e),
                    _ => mismatch(kind, event),
                },
            }
        }
    }
}

fn mismatch(kind: RawEventKind, event: &InputEvent) {
    let payload = match event {
        InputEvent::Pointer(_) => "pointer",
        InputEvent::Touch(_) => "touch",
    };
    warn!(%kind, payload, "raw event kind does not match its payload, ignored");
}

impl Drop for Multiplexer {
    fn drop(&mut self) {
        self.teardown();
    }
}
