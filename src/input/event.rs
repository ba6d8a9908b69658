//! Raw pointer and touch events delivered by the host toolkit

use std::cell::Cell;
use std::fmt;
use std::str::FromStr;

/// Screen-space position. No transform is ever applied to it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Mouse button that originated a pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    /// Any button beyond the first three (back, forward, ...)
    Other(u16),
}

impl MouseButton {
    /// Map a toolkit button index (0 = left, 1 = middle, 2 = right)
    pub fn from_index(index: u16) -> Self {
        match index {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            n => MouseButton::Other(n),
        }
    }
}

impl FromStr for MouseButton {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(MouseButton::Left),
            "middle" | "center" => Ok(MouseButton::Middle),
            "right" => Ok(MouseButton::Right),
            other => other
                .strip_prefix("button")
                .unwrap_or(other)
                .parse::<u16>()
                .map(MouseButton::from_index)
                .map_err(|_| format!("unknown mouse button '{}'", s)),
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MouseButton::Left => f.write_str("left"),
            MouseButton::Middle => f.write_str("middle"),
            MouseButton::Right => f.write_str("right"),
            MouseButton::Other(n) => write!(f, "button{}", n),
        }
    }
}

/// Raw event categories a surface can be subscribed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawEventKind {
    PointerDown,
    PointerMove,
    PointerUp,
    TouchStart,
    TouchMove,
    TouchEnd,
    TouchCancel,
}

impl RawEventKind {
    pub const ALL: [RawEventKind; 7] = [
        RawEventKind::PointerDown,
        RawEventKind::PointerMove,
        RawEventKind::PointerUp,
        RawEventKind::TouchStart,
        RawEventKind::TouchMove,
        RawEventKind::TouchEnd,
        RawEventKind::TouchCancel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RawEventKind::PointerDown => "pointer-down",
            RawEventKind::PointerMove => "pointer-move",
            RawEventKind::PointerUp => "pointer-up",
            RawEventKind::TouchStart => "touch-start",
            RawEventKind::TouchMove => "touch-move",
            RawEventKind::TouchEnd => "touch-end",
            RawEventKind::TouchCancel => "touch-cancel",
        }
    }

    pub fn is_touch(&self) -> bool {
        matches!(
            self,
            RawEventKind::TouchStart
                | RawEventKind::TouchMove
                | RawEventKind::TouchEnd
                | RawEventKind::TouchCancel
        )
    }
}

impl FromStr for RawEventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RawEventKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown event kind '{}'", s))
    }
}

impl fmt::Display for RawEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pointer (mouse) event
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub position: Point,
    pub button: MouseButton,
    default_prevented: Cell<bool>,
}

impl PointerEvent {
    pub fn new(position: impl Into<Point>, button: MouseButton) -> Self {
        Self {
            position: position.into(),
            button,
            default_prevented: Cell::new(false),
        }
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

/// A single touch contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub id: i32,
    pub position: Point,
}

impl TouchPoint {
    pub fn new(id: i32, position: impl Into<Point>) -> Self {
        Self {
            id,
            position: position.into(),
        }
    }
}

/// Touch event
///
/// `touches` holds every contact still on the surface, `changed_touches`
/// the contacts this event is about. A touch-end therefore usually has an
/// empty `touches` list and the lifted contact in `changed_touches`.
#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    pub touches: Vec<TouchPoint>,
    pub changed_touches: Vec<TouchPoint>,
    default_prevented: Cell<bool>,
}

impl TouchEvent {
    pub fn new(touches: Vec<TouchPoint>, changed_touches: Vec<TouchPoint>) -> Self {
        Self {
            touches,
            changed_touches,
            default_prevented: Cell::new(false),
        }
    }

    /// Single contact that is (still) on the surface
    pub fn single(point: TouchPoint) -> Self {
        Self::new(vec![point], vec![point])
    }

    /// Single contact that just left the surface
    pub fn lifted(point: TouchPoint) -> Self {
        Self::new(Vec::new(), vec![point])
    }

    /// The contact that triggered this event
    pub fn primary(&self) -> Option<&TouchPoint> {
        self.changed_touches.first()
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

/// Raw input event as delivered to listeners
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Pointer(PointerEvent),
    Touch(TouchEvent),
}

impl InputEvent {
    /// Position of the pointer or of the primary changed touch
    pub fn position(&self) -> Option<Point> {
        match self {
            InputEvent::Pointer(e) => Some(e.position),
            InputEvent::Touch(e) => e.primary().map(|p| p.position),
        }
    }

    pub fn prevent_default(&self) {
        match self {
            InputEvent::Pointer(e) => e.prevent_default(),
            InputEvent::Touch(e) => e.prevent_default(),
        }
    }

    pub fn default_prevented(&self) -> bool {
        match self {
            InputEvent::Pointer(e) => e.default_prevented(),
            InputEvent::Touch(e) => e.default_prevented(),
        }
    }
}

impl From<PointerEvent> for InputEvent {
    fn from(event: PointerEvent) -> Self {
        InputEvent::Pointer(event)
    }
}

impl From<TouchEvent> for InputEvent {
    fn from(event: TouchEvent) -> Self {
        InputEvent::Touch(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_parsing() {
        assert_eq!("left".parse::<MouseButton>(), Ok(MouseButton::Left));
        assert_eq!("center".parse::<MouseButton>(), Ok(MouseButton::Middle));
        assert_eq!("2".parse::<MouseButton>(), Ok(MouseButton::Right));
        assert_eq!("4".parse::<MouseButton>(), Ok(MouseButton::Other(4)));
        assert!("thumb".parse::<MouseButton>().is_err());
    }

    #[test]
    fn test_event_kind_names() {
        for kind in RawEventKind::ALL {
            assert_eq!(kind.as_str().parse::<RawEventKind>(), Ok(kind));
        }
        assert!(RawEventKind::TouchCancel.is_touch());
        assert!(!RawEventKind::PointerUp.is_touch());
    }

    #[test]
    fn test_prevent_default_survives_clone() {
        let event = InputEvent::from(PointerEvent::new((1.0, 2.0), MouseButton::Left));
        assert!(!event.default_prevented());
        event.prevent_default();
        assert!(event.clone().default_prevented());
    }

    #[test]
    fn test_lifted_touch_has_primary() {
        let event = TouchEvent::lifted(TouchPoint::new(3, (10.0, 20.0)));
        assert!(event.touches.is_empty());
        assert_eq!(event.primary().map(|p| p.id), Some(3));
        assert_eq!(InputEvent::from(event).position(), Some(Point::new(10.0, 20.0)));
    }
}
