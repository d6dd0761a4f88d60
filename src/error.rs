use std::time::Duration;

/// Errors surfaced by the dispatch primitive and the loops built on it.
///
/// None of these are retried internally; the calling loop decides whether to
/// stop or start a new wait.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `listen_for` was called before any interest was registered
    #[error("listen_for called with an empty matcher set")]
    EmptyMatcherSet,

    /// The world session went away while waiting or acting
    #[error("world session disconnected")]
    SessionDisconnected,

    /// A shutdown was requested while waiting
    #[error("wait cancelled by shutdown request")]
    Cancelled,

    /// A path replay was given waypoints it cannot visit
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// No event arrived within the configured real-time limit
    #[error("no event within {0:?}, session clock may be stalled")]
    TimedOut(Duration),
}

pub type Result<T> = std::result::Result<T, Error>;
