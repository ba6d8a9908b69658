//! Click recognition - click, double-click, long-click and click-down
//!
//! State machine:
//!
//! ```text
//!            down                      up (double-click on)
//!   Idle ----------> Down ----------------------------> AwaitingDoubleClick
//!    ^                | | up (double-click off): clicked        |
//!    |                | +---------------------------------+     | down within threshold: double-clicked
//!    |                | moved / cancel / long-click timer |     | down past threshold: clicked, restart
//!    +----------------+-----------------------------------+-----+ timer: clicked
//! ```
//!
//! Every exit from `Down` or `AwaitingDoubleClick` clears both timers.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::filter::{ClickTouch, MouseFilter};
use super::{
    past_threshold, GestureCallback, GestureEvent, GestureKind, Recognizer, RecognizerCore,
    RecognizerId, RecognizerKind,
};
use crate::input::{InputEvent, Point, PointerEvent, TouchEvent};
use crate::timer::{Scheduler, TimerSlot};

/// Configuration for click recognition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickConfig {
    /// Movement in pixels, on either axis, that cancels the click
    pub threshold: f64,

    /// Report single clicks
    pub clicked: bool,

    /// Mouse buttons that start a click
    pub mouse: MouseFilter,

    /// MAXIMUM number of touch points a click may start with
    pub touch: ClickTouch,

    /// Report double clicks (single clicks are then delayed by `double_clicked_time`)
    pub double_clicked: bool,

    /// Wait for a second press
    #[serde(with = "crate::config::duration_ms")]
    pub double_clicked_time: Duration,

    /// Report presses held for `long_clicked_time`
    pub long_clicked: bool,

    #[serde(with = "crate::config::duration_ms")]
    pub long_clicked_time: Duration,

    /// Report the press itself, before it resolves
    pub click_down: bool,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            threshold: 10.0,
            clicked: true,
            mouse: MouseFilter::Any,
            touch: ClickTouch::AtMost(1),
            double_clicked: false,
            double_clicked_time: Duration::from_millis(300),
            long_clicked: false,
            long_clicked_time: Duration::from_millis(500),
            click_down: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ClickPhase {
    #[default]
    Idle,
    Down,
    AwaitingDoubleClick,
}

#[derive(Debug, Default)]
struct ClickState {
    phase: ClickPhase,
    anchor: Point,
    double_click: TimerSlot,
    long_click: TimerSlot,
}

/// Click-family recognizer
pub struct ClickRecognizer {
    core: RecognizerCore,
    config: ClickConfig,
    scheduler: Rc<dyn Scheduler>,
    state: RefCell<ClickState>,
    weak_self: Weak<ClickRecognizer>,
}

impl ClickRecognizer {
    pub(crate) fn new(
        id: RecognizerId,
        config: ClickConfig,
        scheduler: Rc<dyn Scheduler>,
        callback: GestureCallback,
    ) -> Rc<Self> {
        Rc::new_cyclic(|weak_self| Self {
            core: RecognizerCore::new(id, callback),
            config,
            scheduler,
            state: RefCell::new(ClickState::default()),
            weak_self: weak_self.clone(),
        })
    }

    /// True between a press and its resolution
    fn is_down(&self) -> bool {
        self.state.borrow().phase == ClickPhase::Down
    }

    fn reset(&self, state: &mut ClickState) {
        if state.phase != ClickPhase::Idle {
            debug!(recognizer = %self.core.id(), "click cancelled");
        }
        state.phase = ClickPhase::Idle;
        state.double_click.clear(&*self.scheduler);
        state.long_click.clear(&*self.scheduler);
    }

    fn press(&self, event: InputEvent, at: Point) {
        let gestures = self.press_transition(event, at);
        self.core.emit(gestures);
    }

    fn press_transition(&self, event: InputEvent, at: Point) -> Vec<GestureEvent> {
        let mut state = self.state.borrow_mut();
        let mut gestures = Vec::new();

        match state.phase {
            ClickPhase::Down => {
                // Duplicate pointer/touch delivery
                self.reset(&mut state);
                return gestures;
            }
            ClickPhase::AwaitingDoubleClick => {
                let far = past_threshold(state.anchor, at, self.config.threshold);
                self.reset(&mut state);
                if !far {
                    gestures.push(self.core.gesture(event, GestureKind::DoubleClicked));
                    return gestures;
                }
                // Too far for a double click: resolve the first click and
                // track this press as a new one
                if self.config.clicked {
                    gestures.push(self.core.gesture(event.clone(), GestureKind::Clicked));
                }
            }
            ClickPhase::Idle => {}
        }

        state.anchor = at;
        state.phase = ClickPhase::Down;
        if self.config.long_clicked {
            self.arm_long_click(&mut state, event.clone());
        }
        if self.config.click_down {
            gestures.push(self.core.gesture(event, GestureKind::ClickDown));
        }
        gestures
    }

    fn moved(&self, at: Point) {
        let mut state = self.state.borrow_mut();
        if state.phase == ClickPhase::Down && past_threshold(state.anchor, at, self.config.threshold) {
            self.reset(&mut state);
        }
    }

    fn release(&self, event: InputEvent) {
        let gestures = {
            let mut state = self.state.borrow_mut();
            if state.phase != ClickPhase::Down {
                return;
            }
            state.long_click.clear(&*self.scheduler);

            if self.config.double_clicked {
                state.phase = ClickPhase::AwaitingDoubleClick;
                self.arm_double_click(&mut state, event);
                Vec::new()
            } else {
                state.phase = ClickPhase::Idle;
                if self.config.clicked {
                    vec![self.core.gesture(event, GestureKind::Clicked)]
                } else {
                    Vec::new()
                }
            }
        };
        self.core.emit(gestures);
    }

    fn arm_long_click(&self, state: &mut ClickState, event: InputEvent) {
        let weak = self.weak_self.clone();
        let armed = state.long_click.arm(
            &*self.scheduler,
            self.config.long_clicked_time,
            Box::new(move || {
                if let Some(recognizer) = weak.upgrade() {
                    recognizer.long_click_elapsed(event);
                }
            }),
        );
        if let Err(e) = armed {
            error!(recognizer = %self.core.id(), "long-click detection disabled for this press: {}", e);
        }
    }

    fn arm_double_click(&self, state: &mut ClickState, event: InputEvent) {
        let weak = self.weak_self.clone();
        let armed = state.double_click.arm(
            &*self.scheduler,
            self.config.double_clicked_time,
            Box::new(move || {
                if let Some(recognizer) = weak.upgrade() {
                    recognizer.double_click_elapsed(event);
                }
            }),
        );
        if let Err(e) = armed {
            error!(recognizer = %self.core.id(), "double-click window unavailable: {}", e);
            // Without a timer nothing would ever resolve the click
            state.phase = ClickPhase::Idle;
        }
    }

    fn long_click_elapsed(&self, event: InputEvent) {
        {
            let mut state = self.state.borrow_mut();
            state.long_click.fired();
            if state.phase != ClickPhase::Down {
                return;
            }
            state.phase = ClickPhase::Idle;
        }
        self.core.emit(vec![self.core.gesture(event, GestureKind::LongClicked)]);
    }

    fn double_click_elapsed(&self, event: InputEvent) {
        {
            let mut state = self.state.borrow_mut();
            state.double_click.fired();
            if state.phase != ClickPhase::AwaitingDoubleClick {
                return;
            }
            state.phase = ClickPhase::Idle;
        }
        if self.config.clicked {
            self.core.emit(vec![self.core.gesture(event, GestureKind::Clicked)]);
        }
    }
}

impl Recognizer for ClickRecognizer {
    fn core(&self) -> &RecognizerCore {
        &self.core
    }

    fn kind(&self) -> RecognizerKind {
        RecognizerKind::Click
    }

    fn pointer_down(&self, event: &PointerEvent) {
        if self.config.mouse.accepts(event.button) {
            self.press(event.clone().into(), event.position);
        }
    }

    fn pointer_move(&self, event: &PointerEvent) {
        self.moved(event.position);
    }

    fn pointer_up(&self, event: &PointerEvent) {
        if self.is_down() {
            event.prevent_default();
            self.release(event.clone().into());
        }
    }

    fn touch_start(&self, event: &TouchEvent) {
        if !self.config.touch.is_enabled() {
            return;
        }
        if self.is_down() {
            self.cancel();
            return;
        }
        if !self.config.touch.accepts(event.touches.len()) {
            return;
        }
        let Some(point) = event.primary() else {
            warn!(recognizer = %self.core.id(), "touch-start without changed touches");
            return;
        };
        self.press(event.clone().into(), point.position);
    }

    fn touch_move(&self, event: &TouchEvent) {
        if !self.is_down() {
            return;
        }
        if event.touches.len() != 1 {
            self.cancel();
            return;
        }
        match event.primary() {
            Some(point) => self.moved(point.position),
            None => warn!(recognizer = %self.core.id(), "touch-move without changed touches"),
        }
    }

    fn touch_end(&self, event: &TouchEvent) {
        if self.is_down() {
            event.prevent_default();
            self.release(event.clone().into());
        }
    }

    fn touch_cancel(&self, _event: &TouchEvent) {
        self.cancel();
    }

    fn cancel(&self) {
        let mut state = self.state.borrow_mut();
        self.reset(&mut state);
    }
}

impl Drop for ClickRecognizer {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        state.double_click.clear(&*self.scheduler);
        state.long_click.clear(&*self.scheduler);
    }
}
