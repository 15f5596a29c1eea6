//! Engine mirror
//!
//! **Responsibilities:**
//! - Track exactly the items the playback engine currently holds, in order
//! - Track the playback cursor (`now_playing_index`) into the logical queue
//! - Enforce the engine's real mutation constraints before any backend call
//! - Provide the rebuild fallback used when an edit has no incremental form
//!
//! The mirror's item list always starts with the currently playing item;
//! the engine holds no opinion about already-consumed entries. The mirror is
//! never treated as a generic ordered collection: its operations are exactly
//! the primitives the engine supports, plus the composite fallbacks.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::engine::backend::EngineBackend;
use crate::error::{Error, Result};
use crate::item::EngineHandle;

/// Ordered mirror of the engine's item list plus the playback cursor
pub struct EngineMirror {
    /// The injected engine
    backend: Arc<dyn EngineBackend>,

    /// Handles the engine holds, head first
    items: Vec<EngineHandle>,

    /// Index of the currently playing (or about-to-play) entry within the
    /// logical queue
    now_playing_index: usize,
}

impl EngineMirror {
    /// Create an empty mirror over the given backend
    pub fn new(backend: Arc<dyn EngineBackend>) -> Self {
        Self {
            backend,
            items: Vec::new(),
            now_playing_index: 0,
        }
    }

    /// Append `handle` immediately after `reference`
    ///
    /// Succeeds only when `reference` is present in the mirror list, or is
    /// None with the list empty (head insert). A violated precondition
    /// returns `CannotInsertIncrementally` without touching the backend;
    /// the synchronizer treats that as a rebuild trigger, not a failure.
    pub fn insert_after(
        &mut self,
        handle: EngineHandle,
        reference: Option<&EngineHandle>,
    ) -> Result<()> {
        match reference {
            Some(reference) => {
                let position = match self.items.iter().position(|h| h == reference) {
                    Some(position) => position,
                    None => {
                        return Err(Error::CannotInsertIncrementally(format!(
                            "reference {} not present in mirror",
                            reference.entry_id
                        )));
                    }
                };

                self.backend.insert_after(&handle, Some(reference));
                debug!(
                    "Mirror insert: {} after {} (position {})",
                    handle.entry_id,
                    reference.entry_id,
                    position + 1
                );
                self.items.insert(position + 1, handle);
                Ok(())
            }
            None => {
                if !self.items.is_empty() {
                    return Err(Error::CannotInsertIncrementally(
                        "head insert into non-empty mirror".to_string(),
                    ));
                }

                self.backend.insert_after(&handle, None);
                debug!("Mirror insert: {} at head of empty list", handle.entry_id);
                self.items.push(handle);
                Ok(())
            }
        }
    }

    /// Remove `handle` from the mirror and the engine
    ///
    /// Absent handles are a harmless no-op with no backend call: entries
    /// consumed by playback are implicitly absent and are not re-removed.
    pub fn remove_item(&mut self, handle: &EngineHandle) {
        match self.items.iter().position(|h| h == handle) {
            Some(position) => {
                self.backend.remove(handle);
                self.items.remove(position);
                debug!("Mirror remove: {} (was position {})", handle.entry_id, position);
            }
            None => {
                debug!("Mirror remove: {} already absent, no-op", handle.entry_id);
            }
        }
    }

    /// Discard the engine's entire list
    ///
    /// Does not touch the cursor; callers that rebuild decide the cursor
    /// themselves.
    pub fn clear_all(&mut self) {
        self.backend.clear();
        self.items.clear();
        debug!("Mirror cleared");
    }

    /// Clear and repopulate the mirror from `handles`, in order
    ///
    /// The fallback path for edits with no incremental form: each handle is
    /// appended after the previous one (the first into the empty list), so
    /// the result is correct regardless of prior mirror state. O(n).
    pub fn rebuild_from(&mut self, handles: &[EngineHandle]) {
        self.clear_all();

        let mut reference: Option<&EngineHandle> = None;
        for handle in handles {
            self.backend.insert_after(handle, reference);
            reference = Some(handle);
        }
        self.items = handles.to_vec();
        debug!("Mirror rebuilt with {} items", self.items.len());
    }

    /// Advance the cursor past a finished item
    ///
    /// Increments `now_playing_index` and drops the mirror head. The engine
    /// discards consumed items on its own, so there is no backend call.
    pub fn advance_cursor(&mut self) {
        self.now_playing_index += 1;
        if self.items.is_empty() {
            warn!("Cursor advanced with an empty mirror");
        } else {
            self.items.remove(0);
        }
        debug!("Cursor advanced to {}", self.now_playing_index);
    }

    /// Reposition the cursor to `index` and rebuild the mirror from `handles`
    pub fn jump_to(&mut self, index: usize, handles: &[EngineHandle]) {
        self.now_playing_index = index;
        self.rebuild_from(handles);
    }

    /// Renumber the cursor without touching the engine
    ///
    /// Used by edit reconciliation when entries shift around the playing
    /// entry; this never changes which item the engine is playing.
    pub fn set_cursor(&mut self, index: usize) {
        self.now_playing_index = index;
    }

    /// Handles the engine holds, head first
    pub fn items(&self) -> &[EngineHandle] {
        &self.items
    }

    /// Current cursor position within the logical queue
    pub fn now_playing_index(&self) -> usize {
        self.now_playing_index
    }

    /// Number of items the engine holds
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the engine holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether `handle` is present in the mirror
    pub fn contains(&self, handle: &EngineHandle) -> bool {
        self.items.iter().any(|h| h == handle)
    }

    /// Compare the mirror against the expected future-list
    ///
    /// Identity and order comparison used by the reconciliation audit.
    /// Logs the first mismatch position before reporting failure.
    pub fn matches(&self, expected: &[EngineHandle]) -> bool {
        if self.items.len() != expected.len() {
            warn!(
                "Mirror length mismatch: mirror={}, expected={}",
                self.items.len(),
                expected.len()
            );
            return false;
        }

        for (i, (mirror, wanted)) in self.items.iter().zip(expected.iter()).enumerate() {
            if mirror != wanted {
                warn!(
                    "Mirror mismatch at position {}: mirror={}, expected={}",
                    i, mirror.entry_id, wanted.entry_id
                );
                return false;
            }
        }

        debug!("Mirror verification passed ({} items)", self.items.len());
        true
    }
}
