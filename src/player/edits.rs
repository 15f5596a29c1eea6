//! Queue edit surface
//!
//! Every edit runs under the synchronizer write lock: convert items first,
//! apply the logical mutation plus its mirror reconciliation, then settle
//! (audit, events, cursor aftermath) before the lock is released.

use tracing::{debug, info};

use crate::error::Result;
use crate::events::PlayerEvent;
use crate::item::MediaItem;
use crate::player::core::Player;
use crate::player::state::PlaybackState;
use crate::player::sync::{QueueSynchronizer, SyncOutcome};
use uuid::Uuid;

impl Player {
    /// Append an item to the end of the queue
    pub async fn enqueue(&self, item: MediaItem) -> Result<()> {
        info!("Enqueue command received: {}", item.title);
        self.insert_items(vec![item], None).await
    }

    /// Append several items to the end of the queue as one edit
    pub async fn enqueue_all(&self, items: Vec<MediaItem>) -> Result<()> {
        info!("Enqueue command received: {} items", items.len());
        if items.is_empty() {
            debug!("Nothing to enqueue");
            return Ok(());
        }
        self.insert_items(items, None).await
    }

    /// Insert an item at a queue position
    ///
    /// `index` may be anywhere from 0 through the queue length (the latter
    /// appends). Inserting at or ahead of the playing item does not
    /// interrupt it.
    pub async fn insert_at(&self, item: MediaItem, index: usize) -> Result<()> {
        info!("Insert command received: {} at index {}", item.title, index);
        self.insert_items(vec![item], Some(index)).await
    }

    async fn insert_items(&self, items: Vec<MediaItem>, index: Option<usize>) -> Result<()> {
        let entries = items
            .into_iter()
            .map(|item| self.build_entry(item))
            .collect::<Result<Vec<_>>>()?;

        let mut sync = self.sync.write().await;
        let state = *self.state.read().await;
        let previous_current = sync.current_entry().map(|e| e.entry_id);

        let outcome = sync.apply_insert(entries, index, state)?;
        self.settle_edit(&mut sync, state, previous_current, outcome)
            .await;
        Ok(())
    }

    /// Remove the entry at a queue position
    ///
    /// Removing the playing entry stops it; its successor slides under the
    /// cursor and plays next time transport starts (or immediately, on the
    /// engine's own advance).
    pub async fn remove_at(&self, index: usize) -> Result<()> {
        info!("Remove command received: index {}", index);

        let mut sync = self.sync.write().await;
        let state = *self.state.read().await;
        let previous_current = sync.current_entry().map(|e| e.entry_id);

        let (removed, outcome) = sync.apply_remove(index)?;
        debug!("Removed entry {} ({})", removed.entry_id, removed.item.title);
        self.settle_edit(&mut sync, state, previous_current, outcome)
            .await;
        Ok(())
    }

    /// Move the entry at `from` so it ends up at `to`
    ///
    /// `to` names the entry's position in the final arrangement. Moving an
    /// entry onto itself is a no-op that emits nothing.
    pub async fn move_item(&self, from: usize, to: usize) -> Result<()> {
        info!("Move command received: {} -> {}", from, to);

        let mut sync = self.sync.write().await;
        let state = *self.state.read().await;
        let previous_current = sync.current_entry().map(|e| e.entry_id);

        match sync.apply_move(from, to, state)? {
            Some(outcome) => {
                self.settle_edit(&mut sync, state, previous_current, outcome)
                    .await;
            }
            None => debug!("Move is a no-op"),
        }
        Ok(())
    }

    /// Replace the entry at a queue position with a new item
    ///
    /// Replacing the playing entry restarts playback from the replacement.
    pub async fn replace_at(&self, index: usize, item: MediaItem) -> Result<()> {
        info!("Replace command received: index {} with {}", index, item.title);
        let entry = self.build_entry(item)?;

        let mut sync = self.sync.write().await;
        let state = *self.state.read().await;
        let previous_current = sync.current_entry().map(|e| e.entry_id);

        let (replaced, outcome) = sync.apply_replace(index, entry)?;
        debug!(
            "Replaced entry {} ({})",
            replaced.entry_id, replaced.item.title
        );
        self.settle_edit(&mut sync, state, previous_current, outcome)
            .await;
        Ok(())
    }

    /// Replace the whole queue with a new list
    ///
    /// The cursor returns to the head; playback of the old current entry
    /// does not survive a reset.
    pub async fn reset(&self, items: Vec<MediaItem>) -> Result<()> {
        info!("Reset command received: {} items", items.len());
        let entries = items
            .into_iter()
            .map(|item| self.build_entry(item))
            .collect::<Result<Vec<_>>>()?;

        let mut sync = self.sync.write().await;
        let state = *self.state.read().await;
        let previous_current = sync.current_entry().map(|e| e.entry_id);

        let outcome = sync.apply_reset(entries);
        self.settle_edit(&mut sync, state, previous_current, outcome)
            .await;
        Ok(())
    }

    /// Common aftermath of a committed edit
    ///
    /// Audits the mirror, announces what changed, and reconciles transport
    /// state with whatever is now under the cursor. Runs while the caller
    /// still holds the synchronizer write lock, so the audit sees exactly
    /// the state this edit produced.
    async fn settle_edit(
        &self,
        sync: &mut QueueSynchronizer,
        state: PlaybackState,
        previous_current: Option<Uuid>,
        outcome: SyncOutcome,
    ) {
        self.audit_and_heal(sync);

        if let Some(reason) = outcome.rebuilt {
            self.event_bus.emit_lossy(PlayerEvent::MirrorRebuilt {
                reason,
                item_count: sync.mirror().len(),
                timestamp: chrono::Utc::now(),
            });
        }

        self.event_bus.emit_lossy(PlayerEvent::QueueChanged {
            change: outcome.change,
            queue: sync.queue().entry_ids(),
            timestamp: chrono::Utc::now(),
        });

        if !state.is_engaged() {
            return;
        }

        match sync.current_entry() {
            Some(entry) => {
                if previous_current != Some(entry.entry_id) {
                    // The edit displaced the audible entry; announce its
                    // successor and drop any boundary armed for the old one.
                    self.emit_current_item(sync);
                    self.clear_boundary().await;
                }
            }
            None => {
                // The edit consumed everything at or past the cursor. An
                // engine with an empty list is stopped by definition; only
                // the bookkeeping needs to catch up.
                self.set_state(state, PlaybackState::Stopped).await;
                self.clear_boundary().await;
            }
        }
    }
}
