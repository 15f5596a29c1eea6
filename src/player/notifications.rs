//! Engine notification handling
//!
//! One task drains the engine notification channel and drives cursor
//! advance, failure policy, and the boundary observer from it.

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::FailurePolicy;
use crate::engine::backend::EngineNotification;
use crate::events::PlayerEvent;
use crate::player::core::Player;
use crate::player::state::PlaybackState;

impl Player {
    /// Drain engine notifications until the channel closes
    ///
    /// Spawned by `start()`. Takes the receiver out of its slot; a second
    /// spawn finds it gone and exits.
    pub(super) async fn notification_handler(&self) {
        let mut rx = match self.notification_rx.write().await.take() {
            Some(rx) => rx,
            None => {
                error!("Engine notification receiver already taken!");
                return;
            }
        };

        info!("Engine notification handler started");

        while let Some(notification) = rx.recv().await {
            match notification {
                EngineNotification::ItemFinished { entry_id } => {
                    self.handle_item_finished(entry_id).await;
                }
                EngineNotification::PlaybackFailed { entry_id, message } => {
                    self.handle_playback_failed(entry_id, message).await;
                }
                EngineNotification::PositionUpdate { position_ms } => {
                    self.handle_position_update(position_ms).await;
                }
            }
        }

        info!("Engine notification channel closed, handler stopping");
    }

    /// Advance past a finished entry
    ///
    /// Stale reports (an entry that is no longer the mirror head, e.g.
    /// because an edit already removed it) are dropped without touching
    /// the cursor.
    pub(super) async fn handle_item_finished(&self, entry_id: Uuid) {
        debug!("Item finished: {}", entry_id);

        let mut sync = self.sync.write().await;
        let state = *self.state.read().await;

        if !state.is_engaged() {
            warn!(
                "Finish notification for {} while {}; ignoring",
                entry_id, state
            );
            return;
        }

        let new_cursor = match sync.advance_finished(entry_id) {
            Some(cursor) => cursor,
            None => return,
        };

        self.clear_boundary().await;
        self.audit_and_heal(&mut sync);

        if sync.current_entry().is_some() {
            debug!("Continuing playback at position {}", new_cursor);
            self.emit_current_item(&sync);
        } else {
            self.set_state(state, PlaybackState::Stopped).await;
            self.event_bus.emit_lossy(PlayerEvent::QueueFinished {
                timestamp: chrono::Utc::now(),
            });
            info!("Queue finished");
        }
    }

    /// Apply the configured failure policy to a failed entry
    async fn handle_playback_failed(&self, entry_id: Uuid, message: String) {
        warn!("Playback failed for {}: {}", entry_id, message);
        self.event_bus.emit_lossy(PlayerEvent::PlaybackFailed {
            entry_id,
            message,
            timestamp: chrono::Utc::now(),
        });

        match self.config.failure_policy {
            FailurePolicy::Stop => {
                let state = *self.state.read().await;
                if state.is_engaged() {
                    self.backend.stop();
                    self.set_state(state, PlaybackState::Stopped).await;
                    self.clear_boundary().await;
                }
            }
            FailurePolicy::Skip => {
                debug!("Skipping failed entry {}", entry_id);
                // Same path as a natural finish; a stale report is dropped
                // there just as it would be here.
                self.handle_item_finished(entry_id).await;
            }
        }
    }

    /// Relay a position report and check the armed boundary
    async fn handle_position_update(&self, position_ms: u64) {
        self.event_bus.emit_lossy(PlayerEvent::PositionChanged {
            position_ms,
            timestamp: chrono::Utc::now(),
        });

        let armed = *self.boundary.read().await;
        if let Some(target_ms) = armed {
            if position_ms >= target_ms {
                // Disarm before announcing so the boundary fires once
                *self.boundary.write().await = None;
                self.event_bus.emit_lossy(PlayerEvent::BoundaryReached {
                    position_ms,
                    target_ms,
                    timestamp: chrono::Utc::now(),
                });
                info!(
                    "Boundary reached at {} ms (target {} ms)",
                    position_ms, target_ms
                );
            }
        }
    }
}
