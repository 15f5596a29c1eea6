//! # mirrorq
//!
//! Playback queue reconciliation for engines with restricted edit APIs.
//!
//! The application edits an ordered queue with the full set of list
//! operations (insert, remove, move, replace, reset). The engine
//! underneath only knows insert-after-reference and single removal, and
//! destroys its list on clear. This crate translates between the two,
//! preferring incremental engine edits and falling back to rebuilding
//! the not-yet-played part of the engine list when an edit cannot be
//! expressed incrementally.
//!
//! Modules:
//! - [`item`]: Media items, queue entries, and engine handles
//! - [`queue`]: The logical queue and its change descriptions
//! - [`engine`]: The engine abstraction and the mirror of its list
//! - [`player`]: The orchestrator tying edits, transport, and engine
//!   notifications together
//! - [`events`]: Application-facing event broadcast
//! - [`config`]: Configuration loading
//! - [`error`]: Crate-wide error type

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod item;
pub mod player;
pub mod queue;

pub use config::PlayerConfig;
pub use error::{Error, Result};
pub use events::PlayerEvent;
pub use item::MediaItem;
pub use player::{PlaybackState, Player};
