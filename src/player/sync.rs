//! Queue/mirror reconciliation
//!
//! **Responsibilities:**
//! - Own the logical queue and the engine mirror as one unit
//! - Translate each queue edit into incremental engine calls where the
//!   engine's constraints allow, falling back to a full rebuild otherwise
//! - Keep the cursor pointing at the right entry across edits and advances
//! - Audit the mirror against the logical future-list after reconciliation
//!
//! Every `apply_*` method completes fully (including any fallback rebuild)
//! before it returns; the caller serializes edits and advances through one
//! lock so no reconciliation ever observes another one mid-flight.
//!
//! A failed incremental call is never retried: any constraint violation
//! converts the whole edit into a rebuild, which is correct by construction.

use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::engine::backend::EngineBackend;
use crate::engine::mirror::EngineMirror;
use crate::error::{Error, Result};
use crate::events::RebuildReason;
use crate::item::{EngineHandle, QueueEntry};
use crate::player::state::PlaybackState;
use crate::queue::{LogicalQueue, QueueChange};

/// Outcome of reconciling one queue edit
#[derive(Debug)]
pub struct SyncOutcome {
    /// The change record the edit produced
    pub change: QueueChange,

    /// Set when reconciliation fell back to a full rebuild
    pub rebuilt: Option<RebuildReason>,
}

/// Owns the logical queue / engine mirror pair and reconciles every edit
pub struct QueueSynchronizer {
    queue: LogicalQueue,
    mirror: EngineMirror,
}

impl QueueSynchronizer {
    /// Create a synchronizer with an empty queue over the given backend
    pub fn new(backend: Arc<dyn EngineBackend>) -> Self {
        Self {
            queue: LogicalQueue::new(),
            mirror: EngineMirror::new(backend),
        }
    }

    /// The logical queue
    pub fn queue(&self) -> &LogicalQueue {
        &self.queue
    }

    /// The engine mirror
    pub fn mirror(&self) -> &EngineMirror {
        &self.mirror
    }

    /// Current cursor position within the logical queue
    pub fn cursor(&self) -> usize {
        self.mirror.now_playing_index()
    }

    /// The entry at the cursor, if the cursor is in bounds
    pub fn current_entry(&self) -> Option<&QueueEntry> {
        self.queue.get(self.mirror.now_playing_index())
    }

    /// Insert a contiguous run of entries at `index` (append when None)
    ///
    /// The incremental path references the logical predecessor for the
    /// first entry and chains each further entry after the one just
    /// inserted, so a run of k entries costs k engine calls. Only the
    /// first link can find its reference missing; that converts the whole
    /// edit into a rebuild.
    pub fn apply_insert(
        &mut self,
        entries: Vec<QueueEntry>,
        index: Option<usize>,
        state: PlaybackState,
    ) -> Result<SyncOutcome> {
        let at = index.unwrap_or_else(|| self.queue.len());
        let count = entries.len();
        let change = self.queue.insert_all(entries, Some(at))?;

        // While the cursor entry is audible it keeps its identity: entries
        // inserted at or before it shift the cursor forward. Otherwise the
        // cursor is numerically stable and the inserted entry may become
        // the one about to play.
        let cursor = self.mirror.now_playing_index();
        if state.is_engaged() && at <= cursor {
            self.mirror.set_cursor(cursor + count);
        }

        let rebuilt = self.reconcile_insert(at, count);
        Ok(SyncOutcome { change, rebuilt })
    }

    /// Remove the entry at `index`, returning it with the outcome
    ///
    /// Entries at or after the cursor are still engine-resident and get a
    /// real removal; removing the current entry makes the engine advance
    /// into its successor while the cursor stays put. Entries before the
    /// cursor were already consumed and are absent from the mirror by
    /// construction, so no engine call is issued for them.
    pub fn apply_remove(&mut self, index: usize) -> Result<(QueueEntry, SyncOutcome)> {
        let cursor = self.mirror.now_playing_index();
        let (removed, change) = self.queue.remove_at(index)?;

        if index >= cursor {
            self.mirror.remove_item(&removed.handle);
        } else {
            // No engine call: if the mirror does not already omit this
            // entry, that is a desync for the audit to catch, not a thing
            // to paper over with an unconditional removal.
            if self.mirror.contains(&removed.handle) {
                warn!(
                    "Removed below-cursor entry {} still present in mirror",
                    removed.entry_id
                );
            }
            // The consumed region shrank by one.
            self.mirror.set_cursor(cursor - 1);
        }

        Ok((
            removed,
            SyncOutcome {
                change,
                rebuilt: None,
            },
        ))
    }

    /// Move the entry at `from` so it ends up at `to`
    ///
    /// Returns None for a same-position no-op. Incremental only when both
    /// endpoints lie strictly in the future region; any move touching or
    /// crossing the cursor rebuilds with the cursor recomputed.
    pub fn apply_move(
        &mut self,
        from: usize,
        to: usize,
        state: PlaybackState,
    ) -> Result<Option<SyncOutcome>> {
        let cursor = self.mirror.now_playing_index();
        let current_id = self.queue.get(cursor).map(|e| e.entry_id);

        let change = match self.queue.move_entry(from, to)? {
            Some(change) => change,
            None => return Ok(None),
        };

        // Engaged playback pins the cursor to the entry it was on, wherever
        // that entry landed. Otherwise the cursor is numerically stable and
        // the about-to-play entry may change (moving an entry to the head
        // of a stopped queue makes it play next).
        if state.is_engaged() {
            if let Some(current_id) = current_id {
                if let Some(position) = self.queue.index_of_entry(current_id) {
                    self.mirror.set_cursor(position);
                }
            }
        }

        let cursor = self.mirror.now_playing_index();
        let rebuilt = if from > cursor && to > cursor {
            self.reconcile_future_move(to)
        } else {
            debug!("Move {} -> {} touches cursor {}, rebuilding", from, to, cursor);
            self.rebuild_future();
            Some(RebuildReason::MoveAcrossCursor)
        };

        Ok(Some(SyncOutcome { change, rebuilt }))
    }

    /// Swap the entry at `index` for `entry`, returning the old entry
    ///
    /// Future entries use insert-before-remove so no intermediate state
    /// drops an entry from the addressable future-list. Replacing the
    /// current entry rebuilds; the replacement becomes current and starts
    /// from its beginning. Below-cursor replacements touch no engine state.
    pub fn apply_replace(
        &mut self,
        index: usize,
        entry: QueueEntry,
    ) -> Result<(QueueEntry, SyncOutcome)> {
        let cursor = self.mirror.now_playing_index();
        let new_handle = entry.handle.clone();
        let (old, change) = self.queue.replace(index, entry)?;

        let rebuilt = if index > cursor {
            self.reconcile_future_replace(index, new_handle, &old.handle)
        } else if index == cursor {
            debug!("Current entry replaced, rebuilding");
            self.rebuild_future();
            Some(RebuildReason::CurrentReplaced)
        } else {
            // Consumed region: the old entry is absent and the replacement
            // never reaches the engine. Same desync discipline as removal.
            if self.mirror.contains(&old.handle) {
                warn!(
                    "Replaced below-cursor entry {} still present in mirror",
                    old.entry_id
                );
            }
            None
        };

        Ok((old, SyncOutcome { change, rebuilt }))
    }

    /// Discard the whole queue and adopt `entries`, cursor back to 0
    ///
    /// No incremental path is attempted; a bulk reset always discards
    /// prior engine state.
    pub fn apply_reset(&mut self, entries: Vec<QueueEntry>) -> SyncOutcome {
        let change = self.queue.reset(entries);
        let handles: Vec<EngineHandle> = self
            .queue
            .entries()
            .iter()
            .map(|e| e.handle.clone())
            .collect();
        self.mirror.jump_to(0, &handles);
        debug!("Queue reset to {} entries", handles.len());

        SyncOutcome {
            change,
            rebuilt: Some(RebuildReason::Reset),
        }
    }

    /// Advance past a finished entry, validating the engine's report
    ///
    /// Returns the new cursor position, or None when the finished handle is
    /// stale (not the mirror head) and the advance was ignored.
    pub fn advance_finished(&mut self, finished_entry_id: Uuid) -> Option<usize> {
        match self.mirror.items().first() {
            Some(head) if head.entry_id == finished_entry_id => {
                self.mirror.advance_cursor();
                Some(self.mirror.now_playing_index())
            }
            Some(head) => {
                warn!(
                    "Stale finished notification for {} (mirror head is {})",
                    finished_entry_id, head.entry_id
                );
                None
            }
            None => {
                warn!(
                    "Finished notification for {} with an empty mirror",
                    finished_entry_id
                );
                None
            }
        }
    }

    /// Reposition the cursor to `index` and rebuild the mirror from there
    pub fn jump_to(&mut self, index: usize) -> Result<usize> {
        if index >= self.queue.len() {
            return Err(Error::IndexOutOfRange(format!(
                "jump index {} out of range for queue length {}",
                index,
                self.queue.len()
            )));
        }

        let handles: Vec<EngineHandle> = self
            .queue
            .future(index)
            .iter()
            .map(|e| e.handle.clone())
            .collect();
        self.mirror.jump_to(index, &handles);
        Ok(handles.len())
    }

    /// Cursor back to 0 with a rebuild of the whole queue
    pub fn rewind(&mut self) -> usize {
        self.mirror.set_cursor(0);
        self.rebuild_future()
    }

    /// Compare the mirror against the logical future-list
    ///
    /// The mirror must hold exactly `queue[cursor..]` by handle identity
    /// and order. A mismatch is reported, never repaired here; the caller
    /// decides how loudly to heal.
    pub fn audit(&self) -> Result<()> {
        let expected: Vec<EngineHandle> = self
            .queue
            .future(self.mirror.now_playing_index())
            .iter()
            .map(|e| e.handle.clone())
            .collect();

        if self.mirror.matches(&expected) {
            Ok(())
        } else {
            Err(Error::EngineDesyncDetected(format!(
                "mirror diverged from logical future at cursor {}",
                self.mirror.now_playing_index()
            )))
        }
    }

    /// Rebuild the mirror from the logical future-list, returning its size
    pub fn rebuild_future(&mut self) -> usize {
        let handles: Vec<EngineHandle> = self
            .queue
            .future(self.mirror.now_playing_index())
            .iter()
            .map(|e| e.handle.clone())
            .collect();
        self.mirror.rebuild_from(&handles);
        handles.len()
    }

    /// Incremental path for a contiguous insert run
    fn reconcile_insert(&mut self, at: usize, count: usize) -> Option<RebuildReason> {
        let run: Vec<EngineHandle> = (at..at + count)
            .filter_map(|i| self.queue.get(i))
            .map(|e| e.handle.clone())
            .collect();
        let mut reference = if at == 0 {
            None
        } else {
            self.queue.get(at - 1).map(|e| e.handle.clone())
        };

        for handle in run {
            if let Err(e) = self.mirror.insert_after(handle.clone(), reference.as_ref()) {
                debug!("Incremental insert unavailable ({}), rebuilding", e);
                self.rebuild_future();
                return Some(RebuildReason::IncrementalUnavailable);
            }
            reference = Some(handle);
        }
        None
    }

    /// Incremental path for a move with both endpoints in the future
    fn reconcile_future_move(&mut self, to: usize) -> Option<RebuildReason> {
        let moved = self.queue.get(to).map(|e| e.handle.clone());
        let reference = self.queue.get(to - 1).map(|e| e.handle.clone());
        let (moved, reference) = match (moved, reference) {
            (Some(moved), Some(reference)) => (moved, reference),
            _ => {
                self.rebuild_future();
                return Some(RebuildReason::IncrementalUnavailable);
            }
        };

        self.mirror.remove_item(&moved);
        match self.mirror.insert_after(moved, Some(&reference)) {
            Ok(()) => None,
            Err(e) => {
                debug!("Incremental move unavailable ({}), rebuilding", e);
                self.rebuild_future();
                Some(RebuildReason::IncrementalUnavailable)
            }
        }
    }

    /// Incremental path for a future replacement, insert before remove
    fn reconcile_future_replace(
        &mut self,
        index: usize,
        new_handle: EngineHandle,
        old_handle: &EngineHandle,
    ) -> Option<RebuildReason> {
        let result = match self.queue.get(index - 1).map(|e| e.handle.clone()) {
            Some(reference) => self.mirror.insert_after(new_handle, Some(&reference)),
            None => Err(Error::CannotInsertIncrementally(
                "replacement predecessor missing".to_string(),
            )),
        };

        match result {
            Ok(()) => {
                self.mirror.remove_item(old_handle);
                None
            }
            Err(e) => {
                debug!("Incremental replace unavailable ({}), rebuilding", e);
                self.rebuild_future();
                Some(RebuildReason::IncrementalUnavailable)
            }
        }
    }
}
