//! Player lifecycle and event integration tests
//!
//! Exercise the full player through its public API:
//! - Transport state machine and its no-op guards
//! - Queue exhaustion emitting QueueFinished exactly once
//! - Failure policies (stop on the failed entry vs skip past it)
//! - One-shot boundary observer arming, firing, and teardown
//! - Stale engine reports arriving after queue edits
//! - Event wire format over serde_json

mod helpers;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use helpers::{
    assert_no_event, make_item, next_event, wait_for_event, RecordingBackend, SelectiveConverter,
    TestRig,
};
use mirrorq::config::{FailurePolicy, PlayerConfig};
use mirrorq::engine::backend::EngineNotification;
use mirrorq::error::Error;
use mirrorq::events::{PlayerEvent, RebuildReason};
use mirrorq::player::{PlaybackState, Player};

#[tokio::test]
async fn test_queue_finished_emitted_exactly_once() {
    let rig = TestRig::new();
    rig.player.start().await;
    rig.player.reset(vec![make_item("a")]).await.unwrap();
    rig.player.play().await.unwrap();
    let mut events = rig.player.subscribe();

    let finished = rig.backend.handle_for("engine://a");
    rig.notify_tx
        .send(EngineNotification::ItemFinished {
            entry_id: finished.entry_id,
        })
        .unwrap();

    let event = next_event(&mut events).await;
    assert!(matches!(
        event,
        PlayerEvent::PlaybackStateChanged {
            old_state: PlaybackState::Playing,
            new_state: PlaybackState::Stopped,
            ..
        }
    ));
    let event = next_event(&mut events).await;
    assert!(matches!(event, PlayerEvent::QueueFinished { .. }));

    // A duplicate report must not advance or finish again
    rig.notify_tx
        .send(EngineNotification::ItemFinished {
            entry_id: finished.entry_id,
        })
        .unwrap();
    assert_no_event(&mut events, Duration::from_millis(200)).await;

    assert_eq!(rig.player.playback_state().await, PlaybackState::Stopped);
    assert_eq!(rig.player.current_index().await, None);
    // Consumed history is retained
    assert_eq!(rig.player.queue_len().await, 1);
}

#[tokio::test]
async fn test_failure_policy_stop_halts_on_failed_entry() {
    let rig = TestRig::new();
    rig.player.start().await;
    rig.player
        .reset(vec![make_item("a"), make_item("b")])
        .await
        .unwrap();
    rig.player.play().await.unwrap();
    let mut events = rig.player.subscribe();
    rig.backend.take_calls();

    let failed = rig.backend.handle_for("engine://a");
    rig.notify_tx
        .send(EngineNotification::PlaybackFailed {
            entry_id: failed.entry_id,
            message: "decoder choked".to_string(),
        })
        .unwrap();

    let event = next_event(&mut events).await;
    match event {
        PlayerEvent::PlaybackFailed {
            entry_id, message, ..
        } => {
            assert_eq!(entry_id, failed.entry_id);
            assert_eq!(message, "decoder choked");
        }
        other => panic!("expected PlaybackFailed, got {:?}", other),
    }
    let event = next_event(&mut events).await;
    assert!(matches!(
        event,
        PlayerEvent::PlaybackStateChanged {
            new_state: PlaybackState::Stopped,
            ..
        }
    ));

    assert_eq!(rig.player.playback_state().await, PlaybackState::Stopped);
    // The failed entry stays current for inspection or a manual skip
    assert_eq!(rig.player.current_item().await.unwrap().title, "a");
    assert!(rig.backend.calls().contains(&"stop".to_string()));
}

#[tokio::test]
async fn test_failure_policy_skip_advances_past_failed_entry() {
    let config = PlayerConfig {
        failure_policy: FailurePolicy::Skip,
        ..Default::default()
    };
    let rig = TestRig::with_config(config);
    rig.player.start().await;
    rig.player
        .reset(vec![make_item("a"), make_item("b")])
        .await
        .unwrap();
    rig.player.play().await.unwrap();
    let mut events = rig.player.subscribe();

    let failed = rig.backend.handle_for("engine://a");
    rig.notify_tx
        .send(EngineNotification::PlaybackFailed {
            entry_id: failed.entry_id,
            message: "unreadable".to_string(),
        })
        .unwrap();

    let event = next_event(&mut events).await;
    assert!(matches!(event, PlayerEvent::PlaybackFailed { .. }));
    let event = next_event(&mut events).await;
    match event {
        PlayerEvent::CurrentItemChanged { index, .. } => assert_eq!(index, 1),
        other => panic!("expected CurrentItemChanged, got {:?}", other),
    }

    assert_eq!(rig.player.playback_state().await, PlaybackState::Playing);
    assert_eq!(rig.player.current_item().await.unwrap().title, "b");
}

#[tokio::test]
async fn test_boundary_fires_once() {
    let rig = TestRig::new();
    rig.player.start().await;
    rig.player.reset(vec![make_item("a")]).await.unwrap();
    rig.player.play().await.unwrap();
    rig.player.arm_boundary(30_000).await;
    let mut events = rig.player.subscribe();

    rig.notify_tx
        .send(EngineNotification::PositionUpdate {
            position_ms: 10_000,
        })
        .unwrap();
    let event = next_event(&mut events).await;
    assert!(matches!(
        event,
        PlayerEvent::PositionChanged {
            position_ms: 10_000,
            ..
        }
    ));

    rig.notify_tx
        .send(EngineNotification::PositionUpdate {
            position_ms: 30_000,
        })
        .unwrap();
    let event = next_event(&mut events).await;
    assert!(matches!(
        event,
        PlayerEvent::PositionChanged {
            position_ms: 30_000,
            ..
        }
    ));
    let event = next_event(&mut events).await;
    assert!(matches!(
        event,
        PlayerEvent::BoundaryReached {
            position_ms: 30_000,
            target_ms: 30_000,
            ..
        }
    ));

    // Disarmed: further crossings report position only
    rig.notify_tx
        .send(EngineNotification::PositionUpdate {
            position_ms: 35_000,
        })
        .unwrap();
    let event = next_event(&mut events).await;
    assert!(matches!(event, PlayerEvent::PositionChanged { .. }));
    assert_no_event(&mut events, Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_boundary_cleared_when_item_changes() {
    let rig = TestRig::new();
    rig.player.start().await;
    rig.player
        .reset(vec![make_item("a"), make_item("b")])
        .await
        .unwrap();
    rig.player.play().await.unwrap();
    rig.player.arm_boundary(60_000).await;
    let mut events = rig.player.subscribe();

    let finished = rig.backend.handle_for("engine://a");
    rig.notify_tx
        .send(EngineNotification::ItemFinished {
            entry_id: finished.entry_id,
        })
        .unwrap();
    wait_for_event(&mut events, |e| {
        matches!(e, PlayerEvent::CurrentItemChanged { .. })
    })
    .await;

    // The boundary was armed for the finished item and went with it
    rig.notify_tx
        .send(EngineNotification::PositionUpdate {
            position_ms: 70_000,
        })
        .unwrap();
    let event = next_event(&mut events).await;
    assert!(matches!(event, PlayerEvent::PositionChanged { .. }));
    assert_no_event(&mut events, Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_boundary_cleared_on_stop() {
    let rig = TestRig::new();
    rig.player.start().await;
    rig.player.reset(vec![make_item("a")]).await.unwrap();
    rig.player.play().await.unwrap();
    rig.player.arm_boundary(30_000).await;

    rig.player.stop(false).await.unwrap();
    let mut events = rig.player.subscribe();

    rig.notify_tx
        .send(EngineNotification::PositionUpdate {
            position_ms: 40_000,
        })
        .unwrap();
    let event = next_event(&mut events).await;
    assert!(matches!(event, PlayerEvent::PositionChanged { .. }));
    assert_no_event(&mut events, Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_unsupported_item_leaves_everything_untouched() {
    let backend = RecordingBackend::new();
    let (_notify_tx, notify_rx) = mpsc::unbounded_channel();
    let player = Player::new(
        backend.clone(),
        Arc::new(SelectiveConverter),
        notify_rx,
        PlayerConfig::default(),
    );
    let mut events = player.subscribe();

    player.enqueue(make_item("good-1")).await.unwrap();
    let _ = next_event(&mut events).await; // its QueueChanged

    // One bad item poisons the whole multi-item edit before any mutation
    let result = player
        .enqueue_all(vec![make_item("good-2"), make_item("bad-x")])
        .await;
    assert!(matches!(result, Err(Error::UnsupportedItem(_))));

    assert_eq!(player.queue_len().await, 1);
    assert_eq!(
        backend.calls(),
        vec!["insert engine://good-1 at head".to_string()]
    );
    assert_no_event(&mut events, Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_transport_state_machine() -> anyhow::Result<()> {
    let rig = TestRig::new();
    rig.player.reset(vec![make_item("a")]).await?;
    assert_eq!(rig.player.playback_state().await, PlaybackState::Idle);
    rig.backend.take_calls();

    rig.player.play().await?;
    assert_eq!(rig.player.playback_state().await, PlaybackState::Playing);

    // Redundant commands are logged no-ops
    rig.player.play().await?;
    assert_eq!(rig.player.playback_state().await, PlaybackState::Playing);

    rig.player.pause().await?;
    assert_eq!(rig.player.playback_state().await, PlaybackState::Paused);
    rig.player.pause().await?;
    assert_eq!(rig.player.playback_state().await, PlaybackState::Paused);

    rig.player.play().await?;
    assert_eq!(rig.player.playback_state().await, PlaybackState::Playing);

    rig.player.stop(false).await?;
    assert_eq!(rig.player.playback_state().await, PlaybackState::Stopped);

    // Without rewind the cursor survives and play resumes the same entry
    assert_eq!(rig.player.current_item().await.unwrap().title, "a");
    rig.player.play().await?;
    assert_eq!(rig.player.playback_state().await, PlaybackState::Playing);

    assert_eq!(
        rig.backend.calls(),
        vec!["play", "pause", "play", "stop", "play"]
    );
    Ok(())
}

#[tokio::test]
async fn test_play_on_empty_queue_is_a_noop() {
    let rig = TestRig::new();
    let mut events = rig.player.subscribe();

    rig.player.play().await.unwrap();

    assert_eq!(rig.player.playback_state().await, PlaybackState::Idle);
    assert!(rig.backend.calls().is_empty());
    assert_no_event(&mut events, Duration::from_millis(200)).await;
}

#[tokio::test]
async fn test_stop_with_rewind_rebuilds_from_head() {
    let rig = TestRig::new();
    rig.player.start().await;
    rig.player
        .reset(vec![make_item("a"), make_item("b")])
        .await
        .unwrap();
    rig.player.play().await.unwrap();
    let mut events = rig.player.subscribe();

    let finished = rig.backend.handle_for("engine://a");
    rig.notify_tx
        .send(EngineNotification::ItemFinished {
            entry_id: finished.entry_id,
        })
        .unwrap();
    wait_for_event(&mut events, |e| {
        matches!(e, PlayerEvent::CurrentItemChanged { .. })
    })
    .await;
    rig.backend.take_calls();

    rig.player.stop(true).await.unwrap();

    assert_eq!(
        rig.backend.calls(),
        vec![
            "stop",
            "clear",
            "insert engine://a at head",
            "insert engine://b after engine://a",
        ]
    );

    let event = next_event(&mut events).await;
    assert!(matches!(
        event,
        PlayerEvent::MirrorRebuilt {
            reason: RebuildReason::Rewind,
            item_count: 2,
            ..
        }
    ));
    let event = next_event(&mut events).await;
    assert!(matches!(
        event,
        PlayerEvent::PlaybackStateChanged {
            new_state: PlaybackState::Stopped,
            ..
        }
    ));

    assert_eq!(rig.player.current_index().await, Some(0));
    assert_eq!(rig.player.current_item().await.unwrap().title, "a");
}

#[tokio::test]
async fn test_stale_finish_after_edit_is_ignored() {
    let rig = TestRig::new();
    rig.player.start().await;
    rig.player
        .reset(vec![make_item("a"), make_item("b")])
        .await
        .unwrap();
    rig.player.play().await.unwrap();
    let mut events = rig.player.subscribe();

    let removed = rig.backend.handle_for("engine://a");

    // Remove the playing entry; its successor becomes current
    rig.player.remove_at(0).await.unwrap();
    let event = next_event(&mut events).await;
    assert!(matches!(event, PlayerEvent::QueueChanged { .. }));
    let event = next_event(&mut events).await;
    match event {
        PlayerEvent::CurrentItemChanged { index, .. } => assert_eq!(index, 0),
        other => panic!("expected CurrentItemChanged, got {:?}", other),
    }

    // The engine's belated finish report for the removed entry is stale
    rig.notify_tx
        .send(EngineNotification::ItemFinished {
            entry_id: removed.entry_id,
        })
        .unwrap();
    assert_no_event(&mut events, Duration::from_millis(200)).await;

    assert_eq!(rig.player.current_item().await.unwrap().title, "b");
    assert_eq!(rig.player.current_index().await, Some(0));
    assert_eq!(rig.player.playback_state().await, PlaybackState::Playing);
}

#[tokio::test]
async fn test_play_at_jumps_and_rebuilds() {
    let rig = TestRig::new();
    rig.player
        .reset(vec![make_item("a"), make_item("b"), make_item("c")])
        .await
        .unwrap();
    rig.backend.take_calls();
    let mut events = rig.player.subscribe();

    rig.player.play_at(2).await.unwrap();

    assert_eq!(
        rig.backend.calls(),
        vec!["clear", "insert engine://c at head", "play"]
    );

    let event = next_event(&mut events).await;
    assert!(matches!(
        event,
        PlayerEvent::MirrorRebuilt {
            reason: RebuildReason::Jump,
            item_count: 1,
            ..
        }
    ));
    let event = next_event(&mut events).await;
    assert!(matches!(
        event,
        PlayerEvent::PlaybackStateChanged {
            new_state: PlaybackState::Playing,
            ..
        }
    ));
    let event = next_event(&mut events).await;
    match event {
        PlayerEvent::CurrentItemChanged { index, .. } => assert_eq!(index, 2),
        other => panic!("expected CurrentItemChanged, got {:?}", other),
    }

    assert_eq!(rig.player.current_index().await, Some(2));
    assert_eq!(rig.player.current_item().await.unwrap().title, "c");

    let result = rig.player.play_at(5).await;
    assert!(matches!(result, Err(Error::IndexOutOfRange(_))));
}

#[tokio::test]
async fn test_event_wire_format() {
    let rig = TestRig::new();
    let mut events = rig.player.subscribe();

    rig.player.enqueue(make_item("a")).await.unwrap();
    let event = next_event(&mut events).await;
    let v = serde_json::to_value(&event).unwrap();
    assert_eq!(v["type"], "QueueChanged");
    assert_eq!(v["change"]["op"], "Insert");
    assert_eq!(v["change"]["index"], 0);
    assert_eq!(v["change"]["count"], 1);
    assert_eq!(v["queue"].as_array().unwrap().len(), 1);
    assert!(v["timestamp"].is_string());

    // Head insert on a non-empty engine list falls back to a rebuild
    rig.player.insert_at(make_item("b"), 0).await.unwrap();
    let event = next_event(&mut events).await;
    let v = serde_json::to_value(&event).unwrap();
    assert_eq!(v["type"], "MirrorRebuilt");
    assert_eq!(v["reason"], "IncrementalUnavailable");
    assert_eq!(v["item_count"], 2);
    let _ = next_event(&mut events).await; // its QueueChanged

    rig.player.play().await.unwrap();
    let event = next_event(&mut events).await;
    let v = serde_json::to_value(&event).unwrap();
    assert_eq!(v["type"], "PlaybackStateChanged");
    assert_eq!(v["old_state"], "idle");
    assert_eq!(v["new_state"], "playing");
}

#[tokio::test]
async fn test_mixed_edit_sequence_keeps_audit_quiet() -> anyhow::Result<()> {
    let rig = TestRig::new();
    rig.player.start().await;
    rig.player
        .reset(vec![
            make_item("a"),
            make_item("b"),
            make_item("c"),
            make_item("d"),
        ])
        .await?;
    rig.player.play().await?;
    let mut events = rig.player.subscribe();

    let finished = rig.backend.handle_for("engine://a");
    rig.notify_tx.send(EngineNotification::ItemFinished {
        entry_id: finished.entry_id,
    })?;
    wait_for_event(&mut events, |e| {
        matches!(e, PlayerEvent::CurrentItemChanged { .. })
    })
    .await;

    // Edits above, below, and away from the cursor
    rig.player.insert_at(make_item("e"), 2).await?;
    rig.player.move_item(3, 4).await?;
    rig.player.remove_at(0).await?;
    rig.player.replace_at(3, make_item("x")).await?;
    rig.player.enqueue(make_item("f")).await?;
    rig.player.stop(true).await?;
    rig.player.play().await?;

    let titles: Vec<String> = rig
        .player
        .queue_items()
        .await
        .into_iter()
        .map(|i| i.title)
        .collect();
    assert_eq!(titles, vec!["b", "e", "d", "x", "f"]);
    assert_eq!(rig.player.current_item().await.unwrap().title, "b");
    assert_eq!(rig.player.playback_state().await, PlaybackState::Playing);

    // Every reconciliation along the way passed its audit
    assert_eq!(rig.player.desync_interventions(), 0);
    Ok(())
}
