//! Single-shot timers
//!
//! Double-click and long-click detection are the only waits in the system.
//! Recognizers arm them through the [`Scheduler`] trait so the same state
//! machines run on a calloop event loop ([`CalloopScheduler`]) or on a
//! virtual clock ([`ManualScheduler`]).

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::Duration;

use calloop::timer::{TimeoutAction, Timer};
use calloop::{LoopHandle, RegistrationToken};
use tracing::trace;

use crate::error::{Error, Result};

pub type TimerCallback = Box<dyn FnOnce()>;

/// Identity of an armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

/// Set/clear primitive for single-shot timers
pub trait Scheduler {
    /// Run `callback` once after `delay`
    fn set_timeout(&self, delay: Duration, callback: TimerCallback) -> Result<TimerToken>;

    /// Drop a pending timer. Clearing a fired or unknown token is a no-op.
    fn clear_timeout(&self, token: TimerToken);
}

/// A timer owned by a recognizer: at most one pending timeout at a time
#[derive(Debug, Default)]
pub struct TimerSlot {
    token: Option<TimerToken>,
}

impl TimerSlot {
    /// Arm the slot, clearing whatever was pending before
    pub fn arm(&mut self, scheduler: &dyn Scheduler, delay: Duration, callback: TimerCallback) -> Result<()> {
        self.clear(scheduler);
        self.token = Some(scheduler.set_timeout(delay, callback)?);
        Ok(())
    }

    pub fn clear(&mut self, scheduler: &dyn Scheduler) {
        if let Some(token) = self.token.take() {
            scheduler.clear_timeout(token);
        }
    }

    /// Forget the token once its callback has run
    pub fn fired(&mut self) {
        self.token = None;
    }

    pub fn is_armed(&self) -> bool {
        self.token.is_some()
    }
}

/// Scheduler backed by a calloop event loop
pub struct CalloopScheduler<D: 'static> {
    handle: LoopHandle<'static, D>,
    pending: Rc<RefCell<HashMap<TimerToken, RegistrationToken>>>,
    next_token: Cell<u64>,
}

impl<D: 'static> CalloopScheduler<D> {
    pub fn new(handle: LoopHandle<'static, D>) -> Self {
        Self {
            handle,
            pending: Rc::new(RefCell::new(HashMap::new())),
            next_token: Cell::new(0),
        }
    }

    /// Number of timers inserted in the loop that have not fired yet
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }
}

impl<D: 'static> Scheduler for CalloopScheduler<D> {
    fn set_timeout(&self, delay: Duration, callback: TimerCallback) -> Result<TimerToken> {
        let token = TimerToken(self.next_token.get());
        self.next_token.set(token.0 + 1);

        let pending = Rc::downgrade(&self.pending);
        let mut callback = Some(callback);
        let registration = self
            .handle
            .insert_source(Timer::from_duration(delay), move |_, _, _| {
                if let Some(pending) = pending.upgrade() {
                    pending.borrow_mut().remove(&token);
                }
                if let Some(callback) = callback.take() {
                    callback();
                }
                TimeoutAction::Drop
            })
            .map_err(|e| Error::Schedule(e.error.to_string()))?;

        self.pending.borrow_mut().insert(token, registration);
        trace!(?token, ?delay, "timer inserted in event loop");
        Ok(token)
    }

    fn clear_timeout(&self, token: TimerToken) {
        let registration = self.pending.borrow_mut().remove(&token);
        if let Some(registration) = registration {
            self.handle.remove(registration);
            trace!(?token, "timer removed from event loop");
        }
    }
}

/// Scheduler driven by a virtual clock
///
/// Nothing fires until [`advance`](Self::advance) is called. Timers fire in
/// deadline order; timers sharing a deadline fire in arming order.
#[derive(Default)]
pub struct ManualScheduler {
    now: Cell<Duration>,
    next_token: Cell<u64>,
    pending: RefCell<BTreeMap<(Duration, TimerToken), TimerCallback>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since creation
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn advance(&self, by: Duration) {
        self.advance_to(self.now.get() + by);
    }

    /// Move the clock to `target`, firing every timer due on the way.
    /// Timers armed by a firing callback fire too if they fall due.
    pub fn advance_to(&self, target: Duration) {
        loop {
            let due = {
                let mut pending = self.pending.borrow_mut();
                match pending.first_key_value() {
                    Some((&key, _)) if key.0 <= target => pending.remove(&key).map(|cb| (key, cb)),
                    _ => None,
                }
            };
            let Some(((deadline, token), callback)) = due else {
                break;
            };
            if deadline > self.now.get() {
                self.now.set(deadline);
            }
            trace!(?token, ?deadline, "virtual timer fired");
            callback();
        }
        if target > self.now.get() {
            self.now.set(target);
        }
    }
}

impl Scheduler for ManualScheduler {
    fn set_timeout(&self, delay: Duration, callback: TimerCallback) -> Result<TimerToken> {
        let token = TimerToken(self.next_token.get());
        self.next_token.set(token.0 + 1);
        let deadline = self.now.get() + delay;
        self.pending.borrow_mut().insert((deadline, token), callback);
        Ok(token)
    }

    fn clear_timeout(&self, token: TimerToken) {
        self.pending.borrow_mut().retain(|(_, t), _| *t != token);
    }
}
