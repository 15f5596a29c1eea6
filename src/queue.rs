//! Logical queue
//!
//! The user-editable, arbitrarily-ordered playlist and the single source of
//! truth for playback order. Every mutation yields a `QueueChange` record;
//! the synchronizer consumes those records strictly in mutation order to
//! keep the engine mirror aligned.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::item::QueueEntry;

/// Fine-grained record of one logical queue mutation
///
/// Indexes refer to the queue as it stands *after* the mutation, except
/// `Remove` whose index refers to the position the entry occupied before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum QueueChange {
    /// `count` entries inserted as a contiguous run starting at `index`
    Insert { index: usize, count: usize },
    /// Entry removed from `index`
    Remove { index: usize },
    /// Entry moved from `from` to `to` (`to` is its final position)
    Move { from: usize, to: usize },
    /// Entry at `index` swapped for a different one
    Replace { index: usize },
    /// Entire queue contents discarded and repopulated
    Reset,
}

/// Ordered, mutable sequence of queue entries
///
/// Insertion order is playback order. The queue knows nothing about the
/// engine or the cursor; it only validates indexes and reports changes.
#[derive(Debug, Default)]
pub struct LogicalQueue {
    entries: Vec<QueueEntry>,
}

impl LogicalQueue {
    /// Create a new empty queue
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert one entry at `index`, or append when `index` is None
    ///
    /// Valid insert positions are `0..=len`. Fails with `IndexOutOfRange`
    /// before anything mutates.
    pub fn insert(&mut self, entry: QueueEntry, index: Option<usize>) -> Result<QueueChange> {
        self.insert_all(vec![entry], index)
    }

    /// Insert a contiguous run of entries starting at `index`
    ///
    /// The run keeps its given order. An empty run is rejected as
    /// `InvalidOperation` so no zero-count change records exist.
    pub fn insert_all(
        &mut self,
        entries: Vec<QueueEntry>,
        index: Option<usize>,
    ) -> Result<QueueChange> {
        if entries.is_empty() {
            return Err(Error::InvalidOperation(
                "insert of zero entries".to_string(),
            ));
        }

        let at = index.unwrap_or(self.entries.len());
        if at > self.entries.len() {
            return Err(Error::IndexOutOfRange(format!(
                "insert index {} exceeds queue length {}",
                at,
                self.entries.len()
            )));
        }

        let count = entries.len();
        self.entries.splice(at..at, entries);
        Ok(QueueChange::Insert { index: at, count })
    }

    /// Remove the entry at `index`, returning it with the change record
    pub fn remove_at(&mut self, index: usize) -> Result<(QueueEntry, QueueChange)> {
        if index >= self.entries.len() {
            return Err(Error::IndexOutOfRange(format!(
                "remove index {} out of range for queue length {}",
                index,
                self.entries.len()
            )));
        }

        let entry = self.entries.remove(index);
        Ok((entry, QueueChange::Remove { index }))
    }

    /// Move the entry at `from` so it ends up at position `to`
    ///
    /// `to` names the entry's position in the final arrangement. A move to
    /// the same position is a no-op and produces no change record.
    pub fn move_entry(&mut self, from: usize, to: usize) -> Result<Option<QueueChange>> {
        if self.entries.is_empty() {
            return Err(Error::InvalidOperation("move on empty queue".to_string()));
        }
        if from >= self.entries.len() || to >= self.entries.len() {
            return Err(Error::IndexOutOfRange(format!(
                "move {} -> {} out of range for queue length {}",
                from,
                to,
                self.entries.len()
            )));
        }
        if from == to {
            return Ok(None);
        }

        let entry = self.entries.remove(from);
        self.entries.insert(to, entry);
        Ok(Some(QueueChange::Move { from, to }))
    }

    /// Swap the entry at `index` for `entry`, returning the old one
    pub fn replace(
        &mut self,
        index: usize,
        entry: QueueEntry,
    ) -> Result<(QueueEntry, QueueChange)> {
        if self.entries.is_empty() {
            return Err(Error::InvalidOperation(
                "replace on empty queue".to_string(),
            ));
        }
        if index >= self.entries.len() {
            return Err(Error::IndexOutOfRange(format!(
                "replace index {} out of range for queue length {}",
                index,
                self.entries.len()
            )));
        }

        let old = std::mem::replace(&mut self.entries[index], entry);
        Ok((old, QueueChange::Replace { index }))
    }

    /// Discard all entries and adopt `entries` as the new queue
    pub fn reset(&mut self, entries: Vec<QueueEntry>) -> QueueChange {
        self.entries = entries;
        QueueChange::Reset
    }

    /// Index of the first entry holding the given media item
    pub fn index_of_item(&self, item_id: Uuid) -> Option<usize> {
        self.entries.iter().position(|e| e.item.id == item_id)
    }

    /// Index of the entry with the given entry UUID
    pub fn index_of_entry(&self, entry_id: Uuid) -> Option<usize> {
        self.entries.iter().position(|e| e.entry_id == entry_id)
    }

    /// Entry at `index`, if any
    pub fn get(&self, index: usize) -> Option<&QueueEntry> {
        self.entries.get(index)
    }

    /// Total queue length
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in playback order
    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    /// The portion of the queue at and after `cursor`
    ///
    /// An out-of-bounds cursor yields the empty slice (the queue has been
    /// fully consumed).
    pub fn future(&self, cursor: usize) -> &[QueueEntry] {
        if cursor >= self.entries.len() {
            &[]
        } else {
            &self.entries[cursor..]
        }
    }

    /// Entry UUIDs in playback order
    pub fn entry_ids(&self) -> Vec<Uuid> {
        self.entries.iter().map(|e| e.entry_id).collect()
    }
}
