//! Start filters shared by the recognizers
//!
//! A gesture only starts when the pointer button or the number of touch
//! points passes the recognizer's filter.
//!
//! The touch options mean different things per recognizer:
//! a count given to [`ClickTouch`] is the MAXIMUM number of touch points a
//! click may start with, while a count given to [`SwipeTouch`] is the
//! MINIMUM number of touch points a swipe needs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::input::MouseButton;

/// Which mouse buttons may start a gesture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MouseOption", into = "MouseOption")]
pub enum MouseFilter {
    /// Ignore pointer events entirely
    Disabled,
    /// Left, middle and right all start a gesture
    Any,
    /// Only the listed buttons start a gesture
    Buttons(Vec<MouseButton>),
}

impl MouseFilter {
    pub fn accepts(&self, button: MouseButton) -> bool {
        match self {
            MouseFilter::Disabled => false,
            MouseFilter::Any => true,
            MouseFilter::Buttons(buttons) => buttons.contains(&button),
        }
    }
}

impl Default for MouseFilter {
    fn default() -> Self {
        MouseFilter::Any
    }
}

impl From<bool> for MouseFilter {
    fn from(enabled: bool) -> Self {
        if enabled {
            MouseFilter::Any
        } else {
            MouseFilter::Disabled
        }
    }
}

/// Parses `"true"`, `"false"` or a button list such as `"left-right"`
impl FromStr for MouseFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "true" | "all" => Ok(MouseFilter::Any),
            "false" | "none" | "" => Ok(MouseFilter::Disabled),
            list => list
                .split(['-', ',', '|'])
                .filter(|part| !part.trim().is_empty())
                .map(str::parse::<MouseButton>)
                .collect::<Result<Vec<_>, _>>()
                .map(MouseFilter::Buttons),
        }
    }
}

impl fmt::Display for MouseFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MouseFilter::Disabled => f.write_str("false"),
            MouseFilter::Any => f.write_str("true"),
            MouseFilter::Buttons(buttons) => {
                let names: Vec<String> = buttons.iter().map(|b| b.to_string()).collect();
                f.write_str(&names.join("-"))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum MouseOption {
    Flag(bool),
    Buttons(String),
}

impl TryFrom<MouseOption> for MouseFilter {
    type Error = String;

    fn try_from(option: MouseOption) -> Result<Self, Self::Error> {
        match option {
            MouseOption::Flag(enabled) => Ok(enabled.into()),
            MouseOption::Buttons(list) => list.parse(),
        }
    }
}

impl From<MouseFilter> for MouseOption {
    fn from(filter: MouseFilter) -> Self {
        match filter {
            MouseFilter::Disabled => MouseOption::Flag(false),
            MouseFilter::Any => MouseOption::Flag(true),
            buttons => MouseOption::Buttons(buttons.to_string()),
        }
    }
}

/// `true`/`false` or a touch point count; `0` disables touch
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
enum TouchOption {
    Flag(bool),
    Points(u32),
}

/// Touch filter for clicks: a count is the maximum number of touch points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TouchOption", into = "TouchOption")]
pub enum ClickTouch {
    Disabled,
    Any,
    AtMost(u32),
}

impl ClickTouch {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, ClickTouch::Disabled)
    }

    /// `touches` is the number of contacts currently on the surface
    pub fn accepts(&self, touches: usize) -> bool {
        match *self {
            ClickTouch::Disabled => false,
            ClickTouch::Any => true,
            ClickTouch::AtMost(max) => touches <= max as usize,
        }
    }
}

impl Default for ClickTouch {
    fn default() -> Self {
        ClickTouch::AtMost(1)
    }
}

impl From<TouchOption> for ClickTouch {
    fn from(option: TouchOption) -> Self {
        match option {
            TouchOption::Flag(true) => ClickTouch::Any,
            TouchOption::Flag(false) | TouchOption::Points(0) => ClickTouch::Disabled,
            TouchOption::Points(n) => ClickTouch::AtMost(n),
        }
    }
}

impl From<ClickTouch> for TouchOption {
    fn from(touch: ClickTouch) -> Self {
        match touch {
            ClickTouch::Disabled => TouchOption::Flag(false),
            ClickTouch::Any => TouchOption::Flag(true),
            ClickTouch::AtMost(n) => TouchOption::Points(n),
        }
    }
}

/// Touch filter for swipes: a count is the minimum number of touch points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TouchOption", into = "TouchOption")]
pub enum SwipeTouch {
    Disabled,
    Any,
    AtLeast(u32),
}

impl SwipeTouch {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, SwipeTouch::Disabled)
    }

    pub fn accepts(&self, touches: usize) -> bool {
        match *self {
            SwipeTouch::Disabled => false,
            SwipeTouch::Any => true,
            SwipeTouch::AtLeast(min) => touches >= min as usize,
        }
    }
}

impl Default for SwipeTouch {
    fn default() -> Self {
        SwipeTouch::Any
    }
}

impl From<TouchOption> for SwipeTouch {
    fn from(option: TouchOption) -> Self {
        match option {
            TouchOption::Flag(true) => SwipeTouch::Any,
            TouchOption::Flag(false) | TouchOption::Points(0) => SwipeTouch::Disabled,
            TouchOption::Points(n) => SwipeTouch::AtLeast(n),
        }
    }
}

impl From<SwipeTouch> for TouchOption {
    fn from(touch: SwipeTouch) -> Self {
        match touch {
            SwipeTouch::Disabled => TouchOption::Flag(false),
            SwipeTouch::Any => TouchOption::Flag(true),
            SwipeTouch::AtLeast(n) => TouchOption::Points(n),
        }
    }
}
