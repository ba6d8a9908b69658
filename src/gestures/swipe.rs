//! Swipe recognition
//!
//! A press starts tracking from an anchor point. Every move while tracking
//! measures the displacement from the anchor on each axis independently;
//! an axis past the threshold fires a swipe in the direction of its sign.
//! Single-swipe mode stops tracking after a swipe, continuous mode moves
//! that axis's anchor to the current point and keeps going.
//!
//! Moves are taken from the surface and from the document, so a drag that
//! leaves the surface keeps tracking. Seeing the same move twice is
//! harmless: after a swipe the anchor (or tracking itself) has moved on.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::filter::{MouseFilter, SwipeTouch};
use super::{
    GestureCallback, GestureEvent, GestureKind, Recognizer, RecognizerCore, RecognizerId,
    RecognizerKind, SwipeDirection,
};
use crate::input::{InputEvent, Point, PointerEvent, TouchEvent};

/// Axes a swipe recognizer listens on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwipeAxis {
    #[default]
    All,
    Horizontal,
    Vertical,
}

impl SwipeAxis {
    pub fn horizontal(&self) -> bool {
        matches!(self, SwipeAxis::All | SwipeAxis::Horizontal)
    }

    pub fn vertical(&self) -> bool {
        matches!(self, SwipeAxis::All | SwipeAxis::Vertical)
    }
}

/// Configuration for swipe recognition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwipeConfig {
    pub direction: SwipeAxis,

    /// Mouse buttons that start a swipe
    pub mouse: MouseFilter,

    /// MINIMUM number of touch points a swipe needs
    pub touch: SwipeTouch,

    /// Displacement in pixels that fires a swipe
    pub threshold: f64,

    /// One swipe per press; otherwise keep firing while the drag goes on
    pub single_swipe: bool,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            direction: SwipeAxis::All,
            mouse: MouseFilter::Any,
            touch: SwipeTouch::Any,
            threshold: 20.0,
            single_swipe: true,
        }
    }
}

#[derive(Debug, Default)]
struct SwipeState {
    tracking: bool,
    anchor: Point,
}

/// Swipe-family recognizer
pub struct SwipeRecognizer {
    core: RecognizerCore,
    config: SwipeConfig,
    state: RefCell<SwipeState>,
}

impl SwipeRecognizer {
    pub(crate) fn new(id: RecognizerId, config: SwipeConfig, callback: GestureCallback) -> Rc<Self> {
        Rc::new(Self {
            core: RecognizerCore::new(id, callback),
            config,
            state: RefCell::new(SwipeState::default()),
        })
    }

    fn is_tracking(&self) -> bool {
        self.state.borrow().tracking
    }

    fn press(&self, at: Point) {
        let mut state = self.state.borrow_mut();
        if state.tracking {
            // Duplicate pointer/touch delivery
            state.tracking = false;
            return;
        }
        state.tracking = true;
        state.anchor = at;
    }

    fn release(&self) {
        let mut state = self.state.borrow_mut();
        if state.tracking {
            debug!(recognizer = %self.core.id(), "swipe tracking ended");
        }
        state.tracking = false;
    }

    fn moved(&self, at: Point, event: InputEvent) {
        let gestures = self.displace(at, event);
        self.core.emit(gestures);
    }

    fn displace(&self, at: Point, event: InputEvent) -> Vec<GestureEvent> {
        let mut state = self.state.borrow_mut();
        let mut gestures = Vec::new();
        if !state.tracking {
            return gestures;
        }

        let threshold = self.config.threshold;
        let anchor = state.anchor;
        let horizontal = self.config.direction.horizontal() && (anchor.x - at.x).abs() > threshold;
        let vertical = self.config.direction.vertical() && (anchor.y - at.y).abs() > threshold;

        if horizontal {
            let direction = if at.x > anchor.x {
                SwipeDirection::Right
            } else {
                SwipeDirection::Left
            };
            gestures.push(self.swipe(event.clone(), GestureKind::SwipeHorizontal, direction));
            if self.config.single_swipe {
                state.tracking = false;
            } else {
                state.anchor.x = at.x;
            }
        }

        if vertical {
            let direction = if at.y > anchor.y {
                SwipeDirection::Down
            } else {
                SwipeDirection::Up
            };
            gestures.push(self.swipe(event, GestureKind::SwipeVertical, direction));
            if self.config.single_swipe {
                state.tracking = false;
            } else {
                state.anchor.y = at.y;
            }
        }

        gestures
    }

    fn swipe(&self, event: InputEvent, kind: GestureKind, direction: SwipeDirection) -> GestureEvent {
        GestureEvent {
            direction: Some(direction),
            ..self.core.gesture(event, kind)
        }
    }

    fn pointer_moved(&self, event: &PointerEvent) {
        if self.is_tracking() {
            event.prevent_default();
            self.moved(event.position, event.clone().into());
        }
    }

    fn touch_moved(&self, event: &TouchEvent) {
        if !self.is_tracking() {
            return;
        }
        let Some(point) = event.primary() else {
            warn!(recognizer = %self.core.id(), "touch-move without changed touches");
            return;
        };
        event.prevent_default();
        self.moved(point.position, event.clone().into());
    }
}

impl Recognizer for SwipeRecognizer {
    fn core(&self) -> &RecognizerCore {
        &self.core
    }

    fn kind(&self) -> RecognizerKind {
        RecognizerKind::Swipe
    }

    fn pointer_down(&self, event: &PointerEvent) {
        if self.config.mouse.accepts(event.button) {
            self.press(event.position);
        }
    }

    fn pointer_move(&self, event: &PointerEvent) {
        self.pointer_moved(event);
    }

    fn pointer_up(&self, _event: &PointerEvent) {
        self.release();
    }

    fn touch_start(&self, event: &TouchEvent) {
        if !self.config.touch.is_enabled() {
            return;
        }
        if self.is_tracking() {
            self.cancel();
            return;
        }
        if !self.config.touch.accepts(event.touches.len()) {
            return;
        }
        match event.primary() {
            Some(point) => self.press(point.position),
            None => warn!(recognizer = %self.core.id(), "touch-start without changed touches"),
        }
    }

    fn touch_move(&self, event: &TouchEvent) {
        self.touch_moved(event);
    }

    fn touch_end(&self, _event: &TouchEvent) {
        self.release();
    }

    fn touch_cancel(&self, _event: &TouchEvent) {
        self.release();
    }

    fn document_pointer_move(&self, event: &PointerEvent) {
        self.pointer_moved(event);
    }

    fn document_pointer_up(&self, _event: &PointerEvent) {
        self.release();
    }

    fn document_touch_move(&self, event: &TouchEvent) {
        self.touch_moved(event);
    }

    fn document_touch_end(&self, _event: &TouchEvent) {
        self.release();
    }

    fn cancel(&self) {
        self.state.borrow_mut().tracking = false;
    }
}
