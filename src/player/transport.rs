//! Transport commands
//!
//! Playback commands validate against the current state, forward to the
//! engine, then record and broadcast the transition.

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::events::{PlayerEvent, RebuildReason};
use crate::player::core::Player;
use crate::player::state::PlaybackState;

impl Player {
    /// Start or resume playback at the cursor
    ///
    /// A play command with nothing under the cursor (empty or fully
    /// consumed queue) is logged and ignored; rewind or jump first.
    pub async fn play(&self) -> Result<()> {
        info!("Play command received");

        let sync = self.sync.read().await;
        let state = *self.state.read().await;

        if state == PlaybackState::Playing {
            debug!("Already playing");
            return Ok(());
        }

        if sync.current_entry().is_none() {
            warn!("Play ignored: no entry under the cursor");
            return Ok(());
        }

        self.backend.play();
        self.set_state(state, PlaybackState::Playing).await;
        if !state.is_engaged() {
            // Fresh start rather than resume
            self.emit_current_item(&sync);
        }
        Ok(())
    }

    /// Jump the cursor to `index` and play from there
    ///
    /// Entries ahead of the target are consumed without playing. The
    /// engine list is rebuilt around the new cursor.
    pub async fn play_at(&self, index: usize) -> Result<()> {
        info!("Play-at command received: index {}", index);

        let mut sync = self.sync.write().await;
        let state = *self.state.read().await;

        let item_count = sync.jump_to(index)?;
        self.event_bus.emit_lossy(PlayerEvent::MirrorRebuilt {
            reason: RebuildReason::Jump,
            item_count,
            timestamp: chrono::Utc::now(),
        });
        self.clear_boundary().await;

        self.backend.play();
        if state != PlaybackState::Playing {
            self.set_state(state, PlaybackState::Playing).await;
        }
        self.emit_current_item(&sync);
        Ok(())
    }

    /// Pause playback
    pub async fn pause(&self) -> Result<()> {
        info!("Pause command received");

        let state = *self.state.read().await;
        if state != PlaybackState::Playing {
            warn!("Pause ignored in state {}", state);
            return Ok(());
        }

        self.backend.pause();
        self.set_state(state, PlaybackState::Paused).await;
        Ok(())
    }

    /// Stop playback, optionally rewinding the cursor to the head
    ///
    /// Without rewind the cursor keeps its position and a later play
    /// resumes from the same entry. With rewind the whole queue becomes
    /// future again and the engine list is rebuilt to match.
    pub async fn stop(&self, rewind: bool) -> Result<()> {
        info!("Stop command received (rewind: {})", rewind);

        let mut sync = self.sync.write().await;
        let state = *self.state.read().await;

        self.backend.stop();
        self.clear_boundary().await;

        if rewind {
            let item_count = sync.rewind();
            self.event_bus.emit_lossy(PlayerEvent::MirrorRebuilt {
                reason: RebuildReason::Rewind,
                item_count,
                timestamp: chrono::Utc::now(),
            });
        }

        if state != PlaybackState::Stopped {
            self.set_state(state, PlaybackState::Stopped).await;
        }
        Ok(())
    }

    /// Seek within the current item
    pub async fn seek_to(&self, position_ms: u64) -> Result<()> {
        info!("Seek command received: {} ms", position_ms);
        self.backend.seek_to(position_ms);
        Ok(())
    }
}
