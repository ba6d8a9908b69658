//! Flick gestures - click and swipe recognition for pointer and touch surfaces
//!
//! Features:
//! - Click, double-click, long-click and click-down on one recognizer
//! - Horizontal and vertical swipes, single or continuous
//! - Any number of recognizers per surface, one set of raw subscriptions
//! - Timers on a calloop event loop or a virtual clock
//!
//! ```no_run
//! use std::rc::Rc;
//! use flick_gestures::{ClickConfig, EventTarget, GestureHost, ManualScheduler};
//!
//! let document = Rc::new(EventTarget::new());
//! let surface = Rc::new(EventTarget::new());
//! let host = GestureHost::new(document, Rc::new(ManualScheduler::new()));
//!
//! let handle = host.recognize_click(
//!     &surface,
//!     |gesture| println!("{}", gesture.kind),
//!     ClickConfig { double_clicked: true, ..Default::default() },
//! );
//! handle.remove();
//! ```

pub mod config;
pub mod error;
pub mod gestures;
pub mod input;
pub mod timer;

pub use config::GestureProfile;
pub use error::{Error, Result};
pub use gestures::{
    ClickConfig, GestureEvent, GestureHost, GestureKind, RecognizerHandle, SwipeConfig,
    SwipeDirection,
};
pub use input::{EventSource, EventTarget, InputEvent, RawEventKind};
pub use timer::{CalloopScheduler, ManualScheduler, Scheduler};
