//! Error types for gesture recognition
//!
//! Recognition itself never fails. These cover the fallible edges: arming
//! timers on a host event loop and loading profiles or replay scripts.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to schedule timer: {0}")]
    Schedule(String),

    #[error("invalid gesture profile: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid replay script: {0}")]
    Script(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
