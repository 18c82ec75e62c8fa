use serde::{Deserialize, Serialize};

/// Playback session state machine.
///
/// State transitions:
/// ```text
/// prepared → running ↔ paused
///    │          ↓        ↓
///    └──────→ draining → closed
/// ```
/// A pause received before the first write moves `prepared` straight to
/// `paused`. Any fatal error moves the session to `closed` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Prepared,
    Running,
    Paused,
    Draining,
    Closed,
}

impl SessionState {
    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Whether the session may still accept audio.
    pub fn accepts_writes(&self) -> bool {
        matches!(self, Self::Prepared | Self::Running)
    }
}

/// Why a streaming loop finished without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    SourceExhausted,
    Stopped,
}
