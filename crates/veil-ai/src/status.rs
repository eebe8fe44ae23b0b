//! Lifecycle status of the local model.

use std::fmt;

/// Where the local model is in its lifecycle.
///
/// Only `initialize`/`shutdown` change it; dispatch only reads it. A session
/// is used for inference only while the status is [`Status::Ready`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Downloading,
    Ready,
    Unsupported,
}

impl Status {
    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// ```text
    /// Idle | Unsupported -> Downloading | Ready | Unsupported
    /// Downloading        -> Ready | Unsupported | Idle (abandoned)
    /// Ready              -> Idle (shutdown)
    /// ```
    pub fn can_transition_to(self, next: Status) -> bool {
        use Status::*;
        matches!(
            (self, next),
            (Idle | Unsupported, Downloading | Ready | Unsupported)
                | (Downloading, Ready | Unsupported | Idle)
                | (Ready, Idle)
        )
    }

    pub fn is_ready(self) -> bool {
        self == Status::Ready
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Idle => write!(f, "idle"),
            Status::Downloading => write!(f, "downloading"),
            Status::Ready => write!(f, "ready"),
            Status::Unsupported => write!(f, "unsupported"),
        }
    }
}
