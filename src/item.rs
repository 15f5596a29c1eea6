//! Media item and engine handle types
//!
//! A `MediaItem` is what the application queues; an `EngineHandle` is what
//! the playback engine actually holds. Conversion between the two runs
//! exactly once, when a `QueueEntry` is built, so a conversion failure
//! surfaces before any queue or mirror mutation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Application-level media item
///
/// Equality is by identity (`id`), never by content: two items with the
/// same title and location are still distinct queue citizens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    /// Item UUID
    pub id: Uuid,

    /// Display title
    pub title: String,

    /// Opaque locator (URL, file path, catalog reference)
    pub location: String,
}

impl MediaItem {
    /// Create a new media item with a fresh UUID
    pub fn new(title: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            location: location.into(),
        }
    }
}

impl PartialEq for MediaItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MediaItem {}

/// Engine-native playable payload produced by item conversion
///
/// The crate treats the locator as opaque; only the converter and the
/// backend interpret it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSource {
    /// Engine-interpretable locator
    pub locator: String,
}

impl EngineSource {
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
        }
    }
}

/// What the engine's item list holds: per-entry identity plus payload
///
/// The `entry_id` is fresh per queue entry, not per media item, so the
/// same item may appear at several queue positions without making mirror
/// bookkeeping ambiguous. Equality is by `entry_id`.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    /// Queue entry UUID (fresh per entry)
    pub entry_id: Uuid,

    /// Playable payload
    pub source: EngineSource,
}

impl PartialEq for EngineHandle {
    fn eq(&self, other: &Self) -> bool {
        self.entry_id == other.entry_id
    }
}

impl Eq for EngineHandle {}

/// One logical queue position: the item plus its converted engine handle
#[derive(Debug, Clone)]
pub struct QueueEntry {
    /// Queue entry UUID (matches `handle.entry_id`)
    pub entry_id: Uuid,

    /// The application-level item
    pub item: MediaItem,

    /// Engine handle built from the item, exactly once
    pub handle: EngineHandle,
}

impl QueueEntry {
    /// Build an entry from an item and its already-converted source
    ///
    /// Generates the fresh per-entry UUID shared by the entry and its handle.
    pub fn new(item: MediaItem, source: EngineSource) -> Self {
        let entry_id = Uuid::new_v4();
        Self {
            entry_id,
            item,
            handle: EngineHandle { entry_id, source },
        }
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.entry_id == other.entry_id
    }
}

impl Eq for QueueEntry {}
