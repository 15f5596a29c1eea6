//! Event types for the player event system
//!
//! Provides the application-facing event definitions and the EventBus that
//! broadcasts them to any number of subscribers.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::player::PlaybackState;
use crate::queue::QueueChange;

/// Why the engine mirror was rebuilt from scratch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum RebuildReason {
    /// An insert's reference item was not present in the mirror
    IncrementalUnavailable,
    /// A move touched or crossed the playback cursor
    MoveAcrossCursor,
    /// The currently playing entry was replaced
    CurrentReplaced,
    /// Bulk queue reset
    Reset,
    /// Explicit jump to a queue position
    Jump,
    /// Audit found the mirror out of sync and forced a heal
    DesyncHeal,
    /// Stop with rewind back to the queue head
    Rewind,
}

impl std::fmt::Display for RebuildReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RebuildReason::IncrementalUnavailable => write!(f, "IncrementalUnavailable"),
            RebuildReason::MoveAcrossCursor => write!(f, "MoveAcrossCursor"),
            RebuildReason::CurrentReplaced => write!(f, "CurrentReplaced"),
            RebuildReason::Reset => write!(f, "Reset"),
            RebuildReason::Jump => write!(f, "Jump"),
            RebuildReason::DesyncHeal => write!(f, "DesyncHeal"),
            RebuildReason::Rewind => write!(f, "Rewind"),
        }
    }
}

/// Player event types
///
/// Events are broadcast via EventBus and can be serialized for transmission
/// to UI surfaces. All events carry the timestamp at which they occurred.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// Playback state changed
    ///
    /// Triggers:
    /// - UI: Update transport controls
    /// - Platform integration: Update media keys
    PlaybackStateChanged {
        /// Playback state before change
        old_state: PlaybackState,
        /// Playback state after change
        new_state: PlaybackState,
        /// When state changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A different queue entry became current
    ///
    /// Fires when a different entry becomes the audible one: on play
    /// start, natural advance, explicit jumps, and edits that displace
    /// the playing entry. Never fires for edits that merely renumber the
    /// cursor around the same entry.
    ///
    /// Triggers:
    /// - UI: Update now-playing display
    CurrentItemChanged {
        /// Queue entry UUID now current
        entry_id: Uuid,
        /// Media item UUID now current
        item_id: Uuid,
        /// Cursor position within the logical queue
        index: usize,
        /// When the change happened
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Logical queue order changed
    ///
    /// Triggers:
    /// - UI: Redraw queue display
    QueueChanged {
        /// The edit that caused the change
        change: QueueChange,
        /// Queue entry UUIDs in the new logical order
        queue: Vec<Uuid>,
        /// When the queue changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The last queued item finished and playback stopped
    ///
    /// Emitted exactly once per run-off-the-end, never when the queue is
    /// emptied by edits.
    QueueFinished {
        /// When playback ran off the end
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The engine reported a playback failure
    ///
    /// Forwarded unchanged; whether the cursor then advances is the
    /// configured failure policy.
    PlaybackFailed {
        /// Queue entry UUID that failed
        entry_id: Uuid,
        /// Engine-provided failure description
        message: String,
        /// When the failure was reported
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback position update
    ///
    /// Emitted for every engine position notification.
    ///
    /// Triggers:
    /// - UI: Update progress bar
    PositionChanged {
        /// Current position within the playing item (milliseconds)
        position_ms: u64,
        /// Position update timestamp
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An armed position boundary was crossed
    ///
    /// One-shot: the boundary disarms after firing.
    BoundaryReached {
        /// Position that crossed the boundary (milliseconds)
        position_ms: u64,
        /// The armed target (milliseconds)
        target_ms: u64,
        /// When the boundary fired
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The engine mirror was cleared and repopulated
    ///
    /// Rebuilds discard engine-internal prefetch state; applications that
    /// account for buffering can observe them here.
    MirrorRebuilt {
        /// Why the rebuild was necessary
        reason: RebuildReason,
        /// Number of items in the rebuilt mirror
        item_count: usize,
        /// When the rebuild completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// Event broadcast bus
///
/// Wraps a tokio broadcast channel. Emitting with no subscribers is not an
/// error; lagged receivers drop the oldest events per standard broadcast
/// semantics.
pub struct EventBus {
    tx: broadcast::Sender<PlayerEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorq::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Returns a receiver that will receive all events emitted after
    /// subscription. Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PlayerEvent,
    ) -> Result<usize, broadcast::error::SendError<PlayerEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// # Examples
    ///
    /// ```
    /// use mirrorq::events::{EventBus, PlayerEvent};
    ///
    /// let event_bus = EventBus::new(100);
    ///
    /// // Position updates - OK if no one is listening
    /// event_bus.emit_lossy(PlayerEvent::PositionChanged {
    ///     position_ms: 42000,
    ///     timestamp: chrono::Utc::now(),
    /// });
    /// ```
    pub fn emit_lossy(&self, event: PlayerEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
