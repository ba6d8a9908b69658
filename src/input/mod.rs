//! Raw input - pointer and touch events, event-emitting surfaces
//!
//! This module provides:
//! - Raw event payloads (pointer position and button, touch contacts)
//! - The subscribe/unsubscribe surface the host toolkit implements
//! - An in-memory surface for hosts that drive events themselves

mod event;
mod source;

pub use event::*;
pub use source::*;
