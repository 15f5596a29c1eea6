//! Transport state machine types

use serde::{Deserialize, Serialize};

/// Playback transport state
///
/// `Idle` is the state before anything was ever queued or played; `Stopped`
/// is reached by an explicit stop, a run off the end of the queue, or a
/// failure under the stop policy. The distinction matters to edits: while
/// `Playing` or `Paused` the cursor tracks the identity of the audible
/// entry, while `Idle`/`Stopped` it is numerically stable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    Stopped,
}

impl PlaybackState {
    /// Whether an entry is audibly engaged (playing or paused mid-item)
    pub fn is_engaged(&self) -> bool {
        matches!(self, PlaybackState::Playing | PlaybackState::Paused)
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Stopped => write!(f, "stopped"),
        }
    }
}
