//! Collaborator traits for the playback engine
//!
//! The crate never talks to a concrete engine. It consumes two injected
//! capabilities (item conversion and the engine's mutation/observation
//! surface) and one asynchronous notification stream flowing back from the
//! engine. Everything the engine cannot do is deliberately absent from
//! `EngineBackend`; the mirror enforces the missing pieces.

use std::time::Duration;
use uuid::Uuid;

use crate::error::Result;
use crate::item::{EngineHandle, EngineSource, MediaItem};

/// Conversion from an application item to an engine-native source
///
/// Must be pure, deterministic, and side-effect free. A conversion failure
/// (`Error::UnsupportedItem`) surfaces to the caller of the triggering edit
/// with the queue and mirror untouched for that item.
pub trait ToEngineItem: Send + Sync {
    fn to_engine_item(&self, item: &MediaItem) -> Result<EngineSource>;
}

/// The injected playback engine
///
/// Mutation calls are synchronous, fast, and infallible: on the engine
/// side they are pure list mutations. Anything that can actually go wrong
/// during playback (decode errors, network drops) arrives asynchronously
/// as an [`EngineNotification`], never as a return value here.
///
/// The mutation surface is deliberately restrictive, mirroring engines
/// that only append after a known reference item:
/// - no positional insert,
/// - no insert ahead of the currently playing item,
/// - no atomic reorder; only insert/remove plus a destructive clear.
pub trait EngineBackend: Send + Sync {
    /// Append `handle` immediately after `reference`, or at the head of an
    /// empty list when `reference` is None
    ///
    /// Callers guarantee the precondition (reference present, or list
    /// empty); [`crate::engine::EngineMirror`] checks it before calling.
    fn insert_after(&self, handle: &EngineHandle, reference: Option<&EngineHandle>);

    /// Remove `handle` from the engine's list
    fn remove(&self, handle: &EngineHandle);

    /// Discard the engine's entire list
    fn clear(&self);

    /// Begin or resume playback of the head item
    fn play(&self);

    /// Pause playback, keeping position
    fn pause(&self);

    /// Stop playback
    fn stop(&self);

    /// Seek within the currently playing item
    fn seek_to(&self, position_ms: u64);

    /// Elapsed playback time of the current item, if known
    fn elapsed(&self) -> Option<Duration>;

    /// Total duration of the current item, if known
    fn duration(&self) -> Option<Duration>;

    /// How far ahead of the playback position the engine has buffered
    fn buffered(&self) -> Option<Duration>;
}

/// Notifications flowing from the engine back to the player
///
/// Delivered over an mpsc channel whose sender the application wires into
/// its engine integration; the player drains the receiver in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineNotification {
    /// The current item played to completion
    ///
    /// Fires exactly once per completed item, in playback order, and never
    /// for an item that was removed before it finished.
    ItemFinished { entry_id: Uuid },

    /// The engine failed to play an item
    ///
    /// Forwarded to the application unchanged; the configured failure
    /// policy decides whether the cursor then advances.
    PlaybackFailed { entry_id: Uuid, message: String },

    /// Periodic playback position report
    PositionUpdate { position_ms: u64 },
}
