//! Player orchestration
//!
//! **Module Structure:**
//! - `state.rs`: Transport state machine types
//! - `sync.rs`: Queue/mirror reconciliation (the core of the crate)
//! - `core.rs`: Player lifecycle, shared handles, accessors
//! - `edits.rs`: Queue edit surface (enqueue, insert, remove, move, replace, reset)
//! - `transport.rs`: Play/pause/stop/seek commands
//! - `notifications.rs`: Engine notification handler (cursor advances)

mod core;
mod edits;
mod notifications;
mod state;
mod sync;
mod transport;

pub use self::core::Player;
pub use state::PlaybackState;
pub use sync::{QueueSynchronizer, SyncOutcome};
