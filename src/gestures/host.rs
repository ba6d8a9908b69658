//! Recognizer registration and the surface side table
//!
//! The side table maps each instrumented surface to its multiplexer. It is
//! shared by every [`GestureHost`] on the thread, so a surface never carries
//! more than one set of raw subscriptions no matter how many hosts attach
//! recognizers to it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, warn};

use super::click::{ClickConfig, ClickRecognizer};
use super::multiplexer::Multiplexer;
use super::swipe::{SwipeConfig, SwipeRecognizer};
use super::{GestureEvent, Recognizer, RecognizerId, RecognizerKind};
use crate::input::{EventSource, SurfaceId};
use crate::timer::Scheduler;

thread_local! {
    static MULTIPLEXERS: RefCell<HashMap<SurfaceId, Rc<Multiplexer>>> = RefCell::new(HashMap::new());
}

fn multiplexer(surface: SurfaceId) -> Option<Rc<Multiplexer>> {
    MULTIPLEXERS.with(|table| table.borrow().get(&surface).cloned())
}

fn detach(surface: SurfaceId, id: RecognizerId) -> bool {
    let Some(multiplexer) = multiplexer(surface) else {
        return false;
    };
    let Some(recognizer) = multiplexer.detach(id) else {
        return false;
    };
    recognizer.cancel();

    if multiplexer.is_empty() {
        MULTIPLEXERS.with(|table| table.borrow_mut().remove(&surface));
        multiplexer.teardown();
    }
    true
}

/// Entry point for gesture recognition
///
/// Holds the document-level event source used for drag fallback and the
/// timer scheduler handed to new recognizers. Surfaces are instrumented
/// through the thread's side table, shared with every other host.
#[derive(Clone)]
pub struct GestureHost {
    document: Rc<dyn EventSource>,
    scheduler: Rc<dyn Scheduler>,
}

impl GestureHost {
    pub fn new(document: Rc<dyn EventSource>, scheduler: Rc<dyn Scheduler>) -> Self {
        Self { document, scheduler }
    }

    /// Start recognizing clicks on `surface`
    pub fn recognize_click<S>(
        &self,
        surface: &Rc<S>,
        callback: impl Fn(&GestureEvent) + 'static,
        config: ClickConfig,
    ) -> RecognizerHandle
    where
        S: EventSource + 'static,
    {
        let recognizer = ClickRecognizer::new(RecognizerId::next(), config, self.scheduler.clone(), Rc::new(callback));
        self.attach(surface.clone(), recognizer)
    }

    /// Start recognizing swipes on `surface`
    pub fn recognize_swipe<S>(
        &self,
        surface: &Rc<S>,
        callback: impl Fn(&GestureEvent) + 'static,
        config: SwipeConfig,
    ) -> RecognizerHandle
    where
        S: EventSource + 'static,
    {
        let recognizer = SwipeRecognizer::new(RecognizerId::next(), config, Rc::new(callback));
        self.attach(surface.clone(), recognizer)
    }

    fn attach(&self, surface: Rc<dyn EventSource>, recognizer: Rc<dyn Recognizer>) -> RecognizerHandle {
        let surface_id = surface.surface_id();
        let multiplexer = match multiplexer(surface_id) {
            Some(multiplexer) => {
                if multiplexer.document_id() != self.document.surface_id() {
                    warn!(
                        surface = %surface_id,
                        "surface already instrumented against another document, keeping its fallback"
                    );
                }
                multiplexer
            }
            None => {
                let multiplexer = Multiplexer::new(surface, self.document.clone());
                MULTIPLEXERS.with(|table| table.borrow_mut().insert(surface_id, multiplexer.clone()));
                multiplexer
            }
        };
        multiplexer.attach(recognizer.clone());

        RecognizerHandle {
            surface: surface_id,
            recognizer,
        }
    }

    /// Whether `surface` currently has a multiplexer
    pub fn is_instrumented(surface: SurfaceId) -> bool {
        MULTIPLEXERS.with(|table| table.borrow().contains_key(&surface))
    }

    /// Attached recognizers on `surface`, in dispatch order
    pub fn recognizers(surface: SurfaceId) -> Vec<RecognizerId> {
        multiplexer(surface)
            .map(|m| m.recognizer_ids())
            .unwrap_or_default()
    }

    /// Detach every recognizer from `surface`
    pub fn clear_surface(surface: SurfaceId) -> usize {
        let removed = Self::recognizers(surface)
            .into_iter()
            .filter(|&id| detach(surface, id))
            .count();
        if removed > 0 {
            debug!(%surface, removed, "surface cleared");
        }
        removed
    }

    /// Handle of an attached recognizer, found by id
    pub fn handle(id: RecognizerId) -> Option<RecognizerHandle> {
        MULTIPLEXERS.with(|table| {
            table.borrow().iter().find_map(|(&surface, multiplexer)| {
                multiplexer
                    .get(id)
                    .map(|recognizer| RecognizerHandle { surface, recognizer })
            })
        })
    }
}

impl GestureEvent {
    /// Handle of the recognizer that produced this gesture, while it is attached
    pub fn handle(&self) -> Option<RecognizerHandle> {
        GestureHost::handle(self.recognizer)
    }
}

/// Consumer-side control of one attached recognizer
///
/// Dropping the handle does not detach the recognizer; call
/// [`remove`](Self::remove).
#[derive(Clone)]
pub struct RecognizerHandle {
    surface: SurfaceId,
    recognizer: Rc<dyn Recognizer>,
}

impl RecognizerHandle {
    pub fn id(&self) -> RecognizerId {
        self.recognizer.id()
    }

    pub fn kind(&self) -> RecognizerKind {
        self.recognizer.kind()
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    /// Detach from the surface. Returns false if already detached.
    pub fn remove(&self) -> bool {
        detach(self.surface, self.id())
    }

    pub fn is_attached(&self) -> bool {
        multiplexer(self.surface).is_some_and(|m| m.contains(self.id()))
    }

    pub fn pause(&self) {
        debug!(recognizer = %self.id(), "paused");
        self.recognizer.pause();
    }

    pub fn resume(&self) {
        debug!(recognizer = %self.id(), "resumed");
        self.recognizer.resume();
    }

    pub fn is_paused(&self) -> bool {
        self.recognizer.is_paused()
    }

    /// Abandon the gesture in progress
    pub fn cancel(&self) {
        self.recognizer.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::gestures::testing::Rig;
    use crate::gestures::GestureKind;
    use crate::input::{EventTarget, RawEventKind::*};

    #[test]
    fn test_one_multiplexer_per_surface() {
        let rig = Rig::new();
        let surface = rig.surface.surface_id();
        assert!(!GestureHost::is_instrumented(surface));

        let click = rig.click(ClickConfig::default());
        let swipe = rig.swipe(SwipeConfig::default());
        assert!(GestureHost::is_instrumented(surface));
        assert_eq!(GestureHost::recognizers(surface), vec![click.id(), swipe.id()]);
        // Subscriptions are shared, not duplicated
        assert_eq!(rig.surface.listener_count(), 7);
        assert_eq!(click.kind(), RecognizerKind::Click);
        assert_eq!(swipe.kind(), RecognizerKind::Swipe);
        assert_ne!(click.id(), swipe.id());
    }

    #[test]
    fn test_both_recognizers_see_the_same_events() {
        let rig = Rig::new();
        rig.click(ClickConfig::default());
        rig.swipe(SwipeConfig::default());

        rig.mouse(PointerDown, 0.0, 0.0);
        rig.mouse(PointerMove, 30.0, 0.0);
        rig.mouse(PointerUp, 30.0, 0.0);
        // The move cancelled the click and fired the swipe
        assert_eq!(rig.kinds(), vec![GestureKind::SwipeHorizontal]);
    }

    #[test]
    fn test_removing_last_recognizer_uninstalls() {
        let rig = Rig::new();
        let surface = rig.surface.surface_id();
        let click = rig.click(ClickConfig::default());
        let swipe = rig.swipe(SwipeConfig::default());

        assert!(click.remove());
        assert!(!click.remove());
        assert!(!click.is_attached());
        assert!(swipe.is_attached());
        assert_eq!(rig.surface.listener_count(), 7);

        assert!(swipe.remove());
        assert!(!GestureHost::is_instrumented(surface));
        assert_eq!(rig.surface.listener_count(), 0);
        assert_eq!(rig.document.listener_count(), 0);

        rig.tap(0.0, 0.0);
        assert!(rig.log.borrow().is_empty());

        // Attaching again reinstalls
        rig.click(ClickConfig::default());
        rig.tap(0.0, 0.0);
        assert_eq!(rig.kinds(), vec![GestureKind::Clicked]);
    }

    #[test]
    fn test_remove_clears_pending_timers() {
        let rig = Rig::new();
        let click = rig.click(ClickConfig {
            long_clicked: true,
            ..Default::default()
        });

        rig.mouse(PointerDown, 0.0, 0.0);
        assert_eq!(rig.scheduler.pending(), 1);
        click.remove();
        assert_eq!(rig.scheduler.pending(), 0);

        rig.wait(1000);
        assert!(rig.log.borrow().is_empty());
    }

    #[test]
    fn test_remove_from_inside_callback() {
        let rig = Rig::new();
        let slot: Rc<RefCell<Option<RecognizerHandle>>> = Rc::new(RefCell::new(None));
        let count = Rc::new(Cell::new(0));

        let s = slot.clone();
        let c = count.clone();
        let handle = rig.host.recognize_click(
            &rig.surface,
            move |_: &GestureEvent| {
                c.set(c.get() + 1);
                if let Some(handle) = s.borrow().as_ref() {
                    handle.remove();
                }
            },
            ClickConfig::default(),
        );
        // Second recognizer, later in dispatch order
        let later = rig.click(ClickConfig::default());
        *slot.borrow_mut() = Some(handle);

        rig.tap(0.0, 0.0);
        rig.tap(0.0, 0.0);
        assert_eq!(count.get(), 1);
        // The later recognizer kept working through the removal
        assert_eq!(rig.kinds(), vec![GestureKind::Clicked, GestureKind::Clicked]);
        assert!(later.is_attached());
    }

    #[test]
    fn test_removed_sibling_is_skipped_in_the_same_dispatch() {
        let rig = Rig::new();
        let slot: Rc<RefCell<Option<RecognizerHandle>>> = Rc::new(RefCell::new(None));

        let s = slot.clone();
        rig.host.recognize_click(
            &rig.surface,
            move |_: &GestureEvent| {
                if let Some(handle) = s.borrow().as_ref() {
                    handle.remove();
                }
            },
            ClickConfig {
                click_down: true,
                ..Default::default()
            },
        );
        let later = rig.click(ClickConfig {
            click_down: true,
            ..Default::default()
        });
        *slot.borrow_mut() = Some(later);

        rig.mouse(PointerDown, 0.0, 0.0);
        assert!(rig.log.borrow().is_empty());
    }

    #[test]
    fn test_pause_and_resume() {
        let rig = Rig::new();
        let click = rig.click(ClickConfig {
            long_clicked: true,
            ..Default::default()
        });

        rig.mouse(PointerDown, 0.0, 0.0);
        click.pause();
        assert!(click.is_paused());
        // Pausing abandoned the press and its timer
        assert_eq!(rig.scheduler.pending(), 0);
        rig.mouse(PointerUp, 0.0, 0.0);
        rig.tap(0.0, 0.0);
        assert!(rig.log.borrow().is_empty());

        click.resume();
        rig.tap(0.0, 0.0);
        assert_eq!(rig.kinds(), vec![GestureKind::Clicked]);
    }

    #[test]
    fn test_pause_from_inside_callback_drops_remaining_gestures() {
        let rig = Rig::new();
        let slot: Rc<RefCell<Option<RecognizerHandle>>> = Rc::new(RefCell::new(None));
        let log = Rc::new(RefCell::new(Vec::new()));

        let s = slot.clone();
        let l = log.clone();
        let handle = rig.host.recognize_click(
            &rig.surface,
            move |gesture: &GestureEvent| {
                l.borrow_mut().push(gesture.kind);
                if gesture.kind != GestureKind::Clicked {
                    return;
                }
                if let Some(handle) = s.borrow().as_ref() {
                    handle.pause();
                }
            },
            ClickConfig {
                double_clicked: true,
                click_down: true,
                ..Default::default()
            },
        );
        *slot.borrow_mut() = Some(handle);

        rig.tap(0.0, 0.0);
        // Far second press yields clicked then click-down; the pause drops the latter
        rig.mouse(PointerDown, 100.0, 0.0);
        assert_eq!(*log.borrow(), vec![GestureKind::ClickDown, GestureKind::Clicked]);
        assert_eq!(rig.scheduler.pending(), 0);
    }

    #[test]
    fn test_cancel() {
        let rig = Rig::new();
        let click = rig.click(ClickConfig::default());

        rig.mouse(PointerDown, 0.0, 0.0);
        click.cancel();
        rig.mouse(PointerUp, 0.0, 0.0);
        assert!(rig.log.borrow().is_empty());
        assert!(click.is_attached());
    }

    #[test]
    fn test_surfaces_are_independent() {
        let rig = Rig::new();
        let other = Rc::new(EventTarget::new());
        rig.click(ClickConfig::default());
        let on_other = rig
            .host
            .recognize_click(&other, rig.recorder(), ClickConfig::default());

        assert!(GestureHost::is_instrumented(other.surface_id()));
        assert_eq!(on_other.surface(), other.surface_id());

        // The shared document sees both multiplexers
        assert_eq!(rig.document.listener_count(), 8);

        assert_eq!(GestureHost::clear_surface(rig.surface.surface_id()), 1);
        assert!(!GestureHost::is_instrumented(rig.surface.surface_id()));
        assert_eq!(rig.document.listener_count(), 4);
        assert!(on_other.is_attached());
    }

    #[test]
    fn test_two_hosts_share_one_multiplexer() {
        let rig = Rig::new();
        let second = GestureHost::new(rig.document.clone(), rig.scheduler.clone());

        let click = rig.click(ClickConfig::default());
        let swipe = second.recognize_swipe(&rig.surface, rig.recorder(), SwipeConfig::default());

        assert_eq!(rig.surface.listener_count(), 7);
        assert_eq!(rig.document.listener_count(), 4);
        assert_eq!(
            GestureHost::recognizers(rig.surface.surface_id()),
            vec![click.id(), swipe.id()]
        );

        rig.tap(0.0, 0.0);
        assert_eq!(rig.kinds(), vec![GestureKind::Clicked]);

        // Either host's handle releases its own recognizer only
        assert!(click.remove());
        assert_eq!(rig.surface.listener_count(), 7);
        assert!(swipe.remove());
        assert_eq!(rig.surface.listener_count(), 0);
        assert!(!GestureHost::is_instrumented(rig.surface.surface_id()));
    }

    #[test]
    fn test_handle_outlives_host() {
        let document = Rc::new(EventTarget::new());
        let surface = Rc::new(EventTarget::new());
        let scheduler = Rc::new(crate::timer::ManualScheduler::new());
        let host = GestureHost::new(document.clone(), scheduler);
        let handle = host.recognize_swipe(&surface, |_: &GestureEvent| {}, SwipeConfig::default());

        drop(host);
        assert!(handle.is_attached());
        assert!(handle.remove());
        assert!(!handle.remove());
        assert_eq!(surface.listener_count(), 0);
        assert_eq!(document.listener_count(), 0);
    }

    #[test]
    fn test_callback_controls_its_recognizer_through_the_event() {
        let rig = Rig::new();
        let seen = Rc::new(Cell::new(0));

        let s = seen.clone();
        let handle = rig.host.recognize_click(
            &rig.surface,
            move |gesture: &GestureEvent| {
                s.set(s.get() + 1);
                if let Some(handle) = gesture.handle() {
                    assert_eq!(handle.id(), gesture.recognizer);
                    handle.remove();
                }
            },
            ClickConfig::default(),
        );

        rig.tap(0.0, 0.0);
        rig.tap(0.0, 0.0);
        assert_eq!(seen.get(), 1);
        assert!(!handle.is_attached());
        assert!(GestureHost::handle(handle.id()).is_none());
    }
}
