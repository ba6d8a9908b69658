//! Gesture profiles
//!
//! A profile is a TOML file with optional `[click]` and `[swipe]` tables.
//! Missing fields take their defaults; durations are milliseconds.
//!
//! ```toml
//! [click]
//! double_clicked = true
//! double_clicked_time = 250
//! mouse = "left-right"
//!
//! [swipe]
//! direction = "horizontal"
//! touch = 2
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::gestures::{ClickConfig, SwipeConfig};

/// Recognizers to attach to a surface
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureProfile {
    pub click: Option<ClickConfig>,
    pub swipe: Option<SwipeConfig>,
}

impl GestureProfile {
    /// Per-user profile location
    pub fn default_path() -> Option<PathBuf> {
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".config/flick/gestures.toml"))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let profile = Self::from_toml_str(&contents)?;
        tracing::info!("Loaded gesture profile from {:?}", path);
        Ok(profile)
    }

    /// Load the per-user profile, or return an empty one if it is missing or broken
    pub fn load_or_default() -> Self {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                match Self::load(&path) {
                    Ok(profile) => return profile,
                    Err(e) => tracing::warn!("Ignoring gesture profile {:?}: {}", path, e),
                }
            }
        }
        tracing::info!("No gesture profile found, using defaults");
        Self::default()
    }

    /// Fill the tables this profile leaves out from `other`
    pub fn or(self, other: GestureProfile) -> Self {
        Self {
            click: self.click.or(other.click),
            swipe: self.swipe.or(other.swipe),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.click.is_none() && self.swipe.is_none()
    }
}

/// Serde adapter storing a [`Duration`](std::time::Duration) as whole milliseconds
pub(crate) mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::Error;
    use crate::gestures::{ClickTouch, MouseFilter, SwipeAxis};
    use crate::input::MouseButton;

    #[test]
    fn test_full_profile() {
        let profile = GestureProfile::from_toml_str(
            r#"
            [click]
            double_clicked = true
            double_clicked_time = 250
            mouse = "left-right"
            touch = false

            [swipe]
            direction = "horizontal"
            threshold = 35.0
            "#,
        )
        .unwrap();

        let click = profile.click.unwrap();
        assert!(click.double_clicked);
        assert_eq!(click.double_clicked_time, Duration::from_millis(250));
        assert_eq!(click.long_clicked_time, Duration::from_millis(500));
        assert_eq!(click.mouse, MouseFilter::Buttons(vec![MouseButton::Left, MouseButton::Right]));
        assert_eq!(click.touch, ClickTouch::Disabled);

        let swipe = profile.swipe.unwrap();
        assert_eq!(swipe.direction, SwipeAxis::Horizontal);
        assert_eq!(swipe.threshold, 35.0);
        assert!(swipe.single_swipe);
    }

    #[test]
    fn test_empty_tables_take_defaults() {
        let profile = GestureProfile::from_toml_str("[click]\n").unwrap();
        assert_eq!(profile.click, Some(ClickConfig::default()));
        assert!(profile.swipe.is_none());

        assert!(GestureProfile::from_toml_str("").unwrap().is_empty());
    }

    #[test]
    fn test_bad_values_are_config_errors() {
        let err = GestureProfile::from_toml_str("[click]\nmouse = \"thumb\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = GestureProfile::from_toml_str("[swipe]\ndirection = \"diagonal\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = GestureProfile::load("/nonexistent/flick/gestures.toml").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_round_trip_keeps_millis() {
        let profile = GestureProfile {
            click: Some(ClickConfig {
                long_clicked: true,
                long_clicked_time: Duration::from_millis(750),
                ..Default::default()
            }),
            swipe: None,
        };
        let text = toml::to_string(&profile).unwrap();
        assert!(text.contains("long_clicked_time = 750"));
        assert_eq!(GestureProfile::from_toml_str(&text).unwrap(), profile);
    }

    #[test]
    fn test_or_fills_missing_tables() {
        let script = GestureProfile {
            click: None,
            swipe: Some(SwipeConfig::default()),
        };
        let file = GestureProfile {
            click: Some(ClickConfig::default()),
            swipe: Some(SwipeConfig {
                threshold: 50.0,
                ..Default::default()
            }),
        };
        let merged = script.or(file);
        assert_eq!(merged.click, Some(ClickConfig::default()));
        assert_eq!(merged.swipe, Some(SwipeConfig::default()));
    }
}
