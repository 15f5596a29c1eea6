//! Player lifecycle and shared handles
//!
//! **Responsibilities:**
//! - Own the synchronizer, transport state, boundary, and event bus
//! - Wire up the injected backend, converter, and notification channel
//! - Spawn the notification handler task
//! - Provide read accessors and the boundary observer surface

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, error, info};

use crate::config::PlayerConfig;
use crate::engine::backend::{EngineBackend, EngineNotification, ToEngineItem};
use crate::error::Result;
use crate::events::{EventBus, PlayerEvent, RebuildReason};
use crate::item::{MediaItem, QueueEntry};
use crate::player::state::PlaybackState;
use crate::player::sync::QueueSynchronizer;

/// Playback queue orchestrator
///
/// Serializes queue edits, transport commands, and cursor advances through
/// the synchronizer lock; everything that mutates cursor-relative state
/// goes through that one lock, so no reconciliation ever observes another
/// one mid-flight.
pub struct Player {
    /// Queue/mirror reconciliation state, the single execution context
    pub(super) sync: Arc<RwLock<QueueSynchronizer>>,

    /// Transport state (locked after `sync` whenever both are held)
    pub(super) state: Arc<RwLock<PlaybackState>>,

    /// Armed one-shot position boundary target (milliseconds)
    pub(super) boundary: Arc<RwLock<Option<u64>>>,

    /// The injected engine
    pub(super) backend: Arc<dyn EngineBackend>,

    /// Item-to-source conversion capability
    pub(super) converter: Arc<dyn ToEngineItem>,

    /// Application-facing event broadcast
    pub(super) event_bus: Arc<EventBus>,

    /// Engine notification receiver
    ///
    /// Wrapped in Option so it can be taken exactly once by the handler
    /// task that `start()` spawns.
    pub(super) notification_rx: Arc<RwLock<Option<mpsc::UnboundedReceiver<EngineNotification>>>>,

    /// Forced rebuilds triggered by the reconciliation audit
    pub(super) desync_interventions: Arc<AtomicU64>,

    /// Loaded configuration
    pub(super) config: PlayerConfig,
}

impl Player {
    /// Create a player over the injected collaborators
    ///
    /// The notification receiver is the read end of the channel whose
    /// sender the application wires into its engine integration.
    pub fn new(
        backend: Arc<dyn EngineBackend>,
        converter: Arc<dyn ToEngineItem>,
        notifications: mpsc::UnboundedReceiver<EngineNotification>,
        config: PlayerConfig,
    ) -> Self {
        info!(
            "Creating player (event capacity {}, failure policy {})",
            config.event_capacity, config.failure_policy
        );

        Self {
            sync: Arc::new(RwLock::new(QueueSynchronizer::new(backend.clone()))),
            state: Arc::new(RwLock::new(PlaybackState::Idle)),
            boundary: Arc::new(RwLock::new(None)),
            backend,
            converter,
            event_bus: Arc::new(EventBus::new(config.event_capacity)),
            notification_rx: Arc::new(RwLock::new(Some(notifications))),
            desync_interventions: Arc::new(AtomicU64::new(0)),
            config,
        }
    }

    /// Spawn the engine notification handler
    ///
    /// Must be called once; a second call finds the receiver already taken
    /// and the extra task exits after logging.
    pub async fn start(&self) {
        info!("Starting engine notification handler");
        let self_clone = self.clone_handles();
        tokio::spawn(async move {
            self_clone.notification_handler().await;
        });
    }

    /// Subscribe to player events
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.event_bus.subscribe()
    }

    /// Current transport state
    pub async fn playback_state(&self) -> PlaybackState {
        *self.state.read().await
    }

    /// Snapshot of the queue's media items in playback order
    pub async fn queue_items(&self) -> Vec<MediaItem> {
        let sync = self.sync.read().await;
        sync.queue().entries().iter().map(|e| e.item.clone()).collect()
    }

    /// Total queue length
    pub async fn queue_len(&self) -> usize {
        let sync = self.sync.read().await;
        sync.queue().len()
    }

    /// The currently playing (or about-to-play) item, if any
    pub async fn current_item(&self) -> Option<MediaItem> {
        let sync = self.sync.read().await;
        sync.current_entry().map(|e| e.item.clone())
    }

    /// Cursor position, or None when the queue has been fully consumed
    pub async fn current_index(&self) -> Option<usize> {
        let sync = self.sync.read().await;
        let cursor = sync.cursor();
        if cursor < sync.queue().len() {
            Some(cursor)
        } else {
            None
        }
    }

    /// Number of forced rebuilds the reconciliation audit has triggered
    pub fn desync_interventions(&self) -> u64 {
        self.desync_interventions.load(Ordering::SeqCst)
    }

    /// Arm a one-shot boundary that fires when playback crosses `target_ms`
    pub async fn arm_boundary(&self, target_ms: u64) {
        *self.boundary.write().await = Some(target_ms);
        debug!("Boundary armed at {} ms", target_ms);
    }

    /// Disarm the boundary, if armed
    pub async fn clear_boundary(&self) {
        let mut boundary = self.boundary.write().await;
        if boundary.take().is_some() {
            debug!("Boundary cleared");
        }
    }

    /// Elapsed playback time of the current item, straight from the engine
    pub fn elapsed(&self) -> Option<Duration> {
        self.backend.elapsed()
    }

    /// Duration of the current item, straight from the engine
    pub fn duration(&self) -> Option<Duration> {
        self.backend.duration()
    }

    /// Engine-reported buffered time ahead of the playback position
    pub fn buffered(&self) -> Option<Duration> {
        self.backend.buffered()
    }

    /// The active configuration
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Convert an item and build its queue entry
    ///
    /// Conversion runs here, before any queue or mirror mutation, so an
    /// `UnsupportedItem` failure leaves everything untouched.
    pub(super) fn build_entry(&self, item: MediaItem) -> Result<QueueEntry> {
        let source = self.converter.to_engine_item(&item)?;
        Ok(QueueEntry::new(item, source))
    }

    /// Audit the mirror and heal a detected desync with a forced rebuild
    ///
    /// The triggering operation is never failed; the desync is counted,
    /// logged, and repaired in place.
    pub(super) fn audit_and_heal(&self, sync: &mut QueueSynchronizer) {
        if !self.config.audit_reconciliation {
            return;
        }

        if let Err(e) = sync.audit() {
            error!("{}; forcing mirror rebuild", e);
            self.desync_interventions.fetch_add(1, Ordering::SeqCst);
            let item_count = sync.rebuild_future();
            self.event_bus.emit_lossy(PlayerEvent::MirrorRebuilt {
                reason: RebuildReason::DesyncHeal,
                item_count,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    /// Record a transport transition and announce it
    pub(super) async fn set_state(&self, old_state: PlaybackState, new_state: PlaybackState) {
        *self.state.write().await = new_state;
        self.event_bus.emit_lossy(PlayerEvent::PlaybackStateChanged {
            old_state,
            new_state,
            timestamp: chrono::Utc::now(),
        });
        info!("Playback state changed: {} -> {}", old_state, new_state);
    }

    /// Announce the entry now under the cursor
    pub(super) fn emit_current_item(&self, sync: &QueueSynchronizer) {
        if let Some(entry) = sync.current_entry() {
            self.event_bus.emit_lossy(PlayerEvent::CurrentItemChanged {
                entry_id: entry.entry_id,
                item_id: entry.item.id,
                index: sync.cursor(),
                timestamp: chrono::Utc::now(),
            });
        }
    }

    /// Clone all shared handles for a spawned task
    fn clone_handles(&self) -> Self {
        Self {
            sync: self.sync.clone(),
            state: self.state.clone(),
            boundary: self.boundary.clone(),
            backend: self.backend.clone(),
            converter: self.converter.clone(),
            event_bus: self.event_bus.clone(),
            notification_rx: self.notification_rx.clone(),
            desync_interventions: self.desync_interventions.clone(),
            config: self.config.clone(),
        }
    }
}

// Note: Additional methods for Player are implemented in:
// - edits.rs: Queue edit surface (enqueue, insert, remove, move, replace, reset)
// - transport.rs: Playback commands (play, play_at, pause, stop, seek)
// - notifications.rs: Engine notification handling (advance, failure, position)
