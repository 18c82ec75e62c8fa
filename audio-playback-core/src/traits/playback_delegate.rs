use crate::models::error::PlaybackError;
use crate::models::state::SessionState;

/// Event delegate for playback session notifications.
///
/// All methods are called from the thread running the streaming loop.
pub trait PlaybackDelegate: Send + Sync {
    /// Called after every session state transition.
    fn on_state_changed(&self, state: SessionState);

    /// Called after an underrun has been recovered. `total` counts every
    /// recovery in the session so far.
    fn on_underrun_recovered(&self, total: u64);

    /// Called when a fatal error is about to be returned to the caller.
    fn on_error(&self, error: &PlaybackError);
}
