//! Gesture recognition on top of raw pointer and touch input
//!
//! One [`Multiplexer`] per surface subscribes to the raw events and fans them
//! out, in attachment order, to every attached recognizer. Recognizers turn
//! the raw stream into semantic gestures:
//! - Click family: clicked, double-clicked, long-clicked, click-down
//! - Swipe family: horizontal (left/right) and vertical (up/down) swipes
//!
//! Consumers go through [`GestureHost`], which keeps the surface to
//! multiplexer side table and hands out [`RecognizerHandle`]s.

mod click;
mod filter;
mod host;
mod multiplexer;
mod swipe;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::{debug, trace};

use crate::input::{InputEvent, Point, PointerEvent, TouchEvent};

pub use click::{ClickConfig, ClickRecognizer};
pub use filter::{ClickTouch, MouseFilter, SwipeTouch};
pub use host::{GestureHost, RecognizerHandle};
pub use multiplexer::{Multiplexer, Registry};
pub use swipe::{SwipeAxis, SwipeConfig, SwipeRecognizer};

/// Direction of a swipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Up,
    Down,
    Left,
    Right,
}

impl fmt::Display for SwipeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SwipeDirection::Up => "up",
            SwipeDirection::Down => "down",
            SwipeDirection::Left => "left",
            SwipeDirection::Right => "right",
        })
    }
}

/// Semantic type of a recognized gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GestureKind {
    Clicked,
    DoubleClicked,
    LongClicked,
    ClickDown,
    SwipeHorizontal,
    SwipeVertical,
}

impl GestureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GestureKind::Clicked => "clicked",
            GestureKind::DoubleClicked => "double-clicked",
            GestureKind::LongClicked => "long-clicked",
            GestureKind::ClickDown => "click-down",
            GestureKind::SwipeHorizontal => "swipe-horizontal",
            GestureKind::SwipeVertical => "swipe-vertical",
        }
    }
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a recognizer, unique within the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RecognizerId(pub(crate) u64);

impl RecognizerId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        RecognizerId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RecognizerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "recognizer#{}", self.0)
    }
}

/// Recognizer family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognizerKind {
    Click,
    Swipe,
}

impl fmt::Display for RecognizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecognizerKind::Click => "click",
            RecognizerKind::Swipe => "swipe",
        })
    }
}

/// Recognized gesture, handed to the consumer callback by reference
#[derive(Debug, Clone)]
pub struct GestureEvent {
    /// Raw event that completed the gesture
    pub event: InputEvent,
    pub kind: GestureKind,
    /// Set for swipes only
    pub direction: Option<SwipeDirection>,
    pub recognizer: RecognizerId,
}

pub type GestureCallback = Rc<dyn Fn(&GestureEvent)>;

/// State every recognizer carries next to its own state machine
pub struct RecognizerCore {
    id: RecognizerId,
    callback: GestureCallback,
    paused: Cell<bool>,
}

impl RecognizerCore {
    pub(crate) fn new(id: RecognizerId, callback: GestureCallback) -> Self {
        Self {
            id,
            callback,
            paused: Cell::new(false),
        }
    }

    pub fn id(&self) -> RecognizerId {
        self.id
    }

    pub fn is_paused(&self) -> bool {
        self.paused.get()
    }

    pub(crate) fn set_paused(&self, paused: bool) {
        self.paused.set(paused);
    }

    pub(crate) fn gesture(&self, event: InputEvent, kind: GestureKind) -> GestureEvent {
        GestureEvent {
            event,
            kind,
            direction: None,
            recognizer: self.id,
        }
    }

    /// Hand gestures to the callback. Must not be called while the
    /// recognizer's state is borrowed: callbacks may re-enter the recognizer.
    pub(crate) fn emit(&self, gestures: Vec<GestureEvent>) {
        for gesture in gestures {
            // The callback may have paused us
            if self.paused.get() {
                trace!(recognizer = %self.id, kind = %gesture.kind, "paused, gesture dropped");
                return;
            }
            debug!(
                recognizer = %self.id,
                kind = %gesture.kind,
                direction = ?gesture.direction,
                "gesture recognized"
            );
            (self.callback)(&gesture);
        }
    }
}

/// Raw-event hooks a recognizer may implement
///
/// All hooks default to no-ops. The multiplexer calls them for every
/// attached, non-paused recognizer in attachment order.
pub trait Recognizer {
    fn core(&self) -> &RecognizerCore;

    fn kind(&self) -> RecognizerKind;

    fn pointer_down(&self, _event: &PointerEvent) {}
    fn pointer_move(&self, _event: &PointerEvent) {}
    fn pointer_up(&self, _event: &PointerEvent) {}

    fn touch_start(&self, _event: &TouchEvent) {}
    fn touch_move(&self, _event: &TouchEvent) {}
    fn touch_end(&self, _event: &TouchEvent) {}
    fn touch_cancel(&self, _event: &TouchEvent) {}

    /// Pointer moved anywhere in the document, including outside the surface
    fn document_pointer_move(&self, _event: &PointerEvent) {}
    /// Pointer released anywhere in the document
    fn document_pointer_up(&self, _event: &PointerEvent) {}
    fn document_touch_move(&self, _event: &TouchEvent) {}
    fn document_touch_end(&self, _event: &TouchEvent) {}

    /// Abandon the gesture in progress and clear pending timers
    fn cancel(&self);

    fn id(&self) -> RecognizerId {
        self.core().id()
    }

    fn is_paused(&self) -> bool {
        self.core().is_paused()
    }

    /// Stop dispatch and callbacks; the gesture in progress is abandoned
    fn pause(&self) {
        self.core().set_paused(true);
        self.cancel();
    }

    fn resume(&self) {
        self.core().set_paused(false);
    }
}

/// Anchor-relative movement check, per axis
pub(crate) fn past_threshold(anchor: Point, at: Point, threshold: f64) -> bool {
    (anchor.x - at.x).abs() > threshold || (anchor.y - at.y).abs() > threshold
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for recognizer tests

    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    use super::*;
    use crate::input::{EventTarget, MouseButton, RawEventKind, TouchPoint};
    use crate::timer::ManualScheduler;

    pub struct Rig {
        pub host: GestureHost,
        pub surface: Rc<EventTarget>,
        pub document: Rc<EventTarget>,
        pub scheduler: Rc<ManualScheduler>,
        pub log: Rc<RefCell<Vec<GestureEvent>>>,
    }

    impl Rig {
        pub fn new() -> Self {
            let document = Rc::new(EventTarget::new());
            let scheduler = Rc::new(ManualScheduler::new());
            let host = GestureHost::new(document.clone(), scheduler.clone());
            Self {
                host,
                surface: Rc::new(EventTarget::new()),
                document,
                scheduler,
                log: Rc::new(RefCell::new(Vec::new())),
            }
        }

        pub fn recorder(&self) -> impl Fn(&GestureEvent) + 'static {
            let log = self.log.clone();
            move |gesture: &GestureEvent| log.borrow_mut().push(gesture.clone())
        }

        pub fn click(&self, config: ClickConfig) -> RecognizerHandle {
            self.host.recognize_click(&self.surface, self.recorder(), config)
        }

        pub fn swipe(&self, config: SwipeConfig) -> RecognizerHandle {
            self.host.recognize_swipe(&self.surface, self.recorder(), config)
        }

        pub fn kinds(&self) -> Vec<GestureKind> {
            self.log.borrow().iter().map(|g| g.kind).collect()
        }

        pub fn swipes(&self) -> Vec<(GestureKind, SwipeDirection)> {
            self.log
                .borrow()
                .iter()
                .filter_map(|g| g.direction.map(|d| (g.kind, d)))
                .collect()
        }

        pub fn wait(&self, ms: u64) {
            self.scheduler.advance(Duration::from_millis(ms));
        }

        pub fn mouse(&self, kind: RawEventKind, x: f64, y: f64) -> bool {
            self.mouse_button(kind, x, y, MouseButton::Left)
        }

        pub fn mouse_button(&self, kind: RawEventKind, x: f64, y: f64, button: MouseButton) -> bool {
            let event: InputEvent = PointerEvent::new((x, y), button).into();
            self.surface.emit(kind, &event)
        }

        pub fn document_mouse(&self, kind: RawEventKind, x: f64, y: f64) -> bool {
            let event: InputEvent = PointerEvent::new((x, y), MouseButton::Left).into();
            self.document.emit(kind, &event)
        }

        /// Touch event with `count` contacts, the first at (x, y)
        pub fn touch(&self, kind: RawEventKind, x: f64, y: f64, count: usize) -> bool {
            let primary = TouchPoint::new(0, (x, y));
            let mut touches: Vec<TouchPoint> = (0..count)
                .map(|i| TouchPoint::new(i as i32, (x + 40.0 * i as f64, y)))
                .collect();
            if kind == RawEventKind::TouchEnd || kind == RawEventKind::TouchCancel {
                touches.clear();
            }
            let event: InputEvent = TouchEvent::new(touches, vec![primary]).into();
            self.surface.emit(kind, &event)
        }

        pub fn tap(&self, x: f64, y: f64) {
            self.mouse(RawEventKind::PointerDown, x, y);
            self.mouse(RawEventKind::PointerUp, x, y);
        }
    }
}
