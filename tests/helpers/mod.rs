//! Test helper infrastructure for player integration tests
//!
//! Provides:
//! - RecordingBackend: an engine stub that records every call in order
//! - PassthroughConverter / FailingConverter: item conversion stubs
//! - TestRig: a wired-up player plus the engine-side notification sender
//! - Event helpers for awaiting broadcast events with a timeout

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;

use mirrorq::config::PlayerConfig;
use mirrorq::engine::backend::{EngineBackend, EngineNotification, ToEngineItem};
use mirrorq::error::{Error, Result};
use mirrorq::events::PlayerEvent;
use mirrorq::item::{EngineHandle, EngineSource, MediaItem};
use mirrorq::player::Player;

/// Engine stub recording every backend call in order
///
/// Calls are recorded as readable strings keyed by source locator, so
/// tests can assert exact call sequences without chasing generated UUIDs.
pub struct RecordingBackend {
    calls: Mutex<Vec<String>>,
    inserted: Mutex<Vec<EngineHandle>>,
}

impl RecordingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            inserted: Mutex::new(Vec::new()),
        })
    }

    /// Every call recorded so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Drain the recorded calls so the next phase starts from an empty log
    pub fn take_calls(&self) -> Vec<String> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    /// The most recently inserted handle with a matching locator
    ///
    /// This is how a real engine integration knows entry identities: it
    /// keeps the handles passed to `insert_after` and reports them back
    /// in notifications.
    pub fn handle_for(&self, locator: &str) -> EngineHandle {
        self.inserted
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|h| h.source.locator == locator)
            .cloned()
            .unwrap_or_else(|| panic!("no handle inserted for {}", locator))
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl EngineBackend for RecordingBackend {
    fn insert_after(&self, handle: &EngineHandle, reference: Option<&EngineHandle>) {
        match reference {
            Some(r) => self.record(format!(
                "insert {} after {}",
                handle.source.locator, r.source.locator
            )),
            None => self.record(format!("insert {} at head", handle.source.locator)),
        }
        self.inserted.lock().unwrap().push(handle.clone());
    }

    fn remove(&self, handle: &EngineHandle) {
        self.record(format!("remove {}", handle.source.locator));
    }

    fn clear(&self) {
        self.record("clear".to_string());
    }

    fn play(&self) {
        self.record("play".to_string());
    }

    fn pause(&self) {
        self.record("pause".to_string());
    }

    fn stop(&self) {
        self.record("stop".to_string());
    }

    fn seek_to(&self, position_ms: u64) {
        self.record(format!("seek {}", position_ms));
    }

    fn elapsed(&self) -> Option<Duration> {
        None
    }

    fn duration(&self) -> Option<Duration> {
        None
    }

    fn buffered(&self) -> Option<Duration> {
        None
    }
}

/// Converter producing an engine locator straight from the item location
pub struct PassthroughConverter;

impl ToEngineItem for PassthroughConverter {
    fn to_engine_item(&self, item: &MediaItem) -> Result<EngineSource> {
        Ok(EngineSource::new(item.location.clone()))
    }
}

/// Converter that rejects every item
pub struct FailingConverter;

impl ToEngineItem for FailingConverter {
    fn to_engine_item(&self, item: &MediaItem) -> Result<EngineSource> {
        Err(Error::UnsupportedItem(format!(
            "no engine source for {}",
            item.title
        )))
    }
}

/// Converter that rejects items whose title starts with "bad"
pub struct SelectiveConverter;

impl ToEngineItem for SelectiveConverter {
    fn to_engine_item(&self, item: &MediaItem) -> Result<EngineSource> {
        if item.title.starts_with("bad") {
            Err(Error::UnsupportedItem(format!(
                "no engine source for {}",
                item.title
            )))
        } else {
            Ok(EngineSource::new(item.location.clone()))
        }
    }
}

/// A player wired to a recording backend plus the engine-side
/// notification sender the tests drive
pub struct TestRig {
    pub player: Player,
    pub backend: Arc<RecordingBackend>,
    pub notify_tx: mpsc::UnboundedSender<EngineNotification>,
}

impl TestRig {
    pub fn new() -> Self {
        Self::with_config(PlayerConfig::default())
    }

    pub fn with_config(config: PlayerConfig) -> Self {
        init_tracing();
        let backend = RecordingBackend::new();
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let player = Player::new(
            backend.clone(),
            Arc::new(PassthroughConverter),
            notify_rx,
            config,
        );
        Self {
            player,
            backend,
            notify_tx,
        }
    }
}

/// Build a media item whose locator the recording backend will echo
pub fn make_item(label: &str) -> MediaItem {
    MediaItem::new(label, format!("engine://{}", label))
}

/// Route player logs into the test output when RUST_LOG is set
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Await the next broadcast event, failing the test after one second
pub async fn next_event(rx: &mut broadcast::Receiver<PlayerEvent>) -> PlayerEvent {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for player event")
        .expect("event channel closed")
}

/// Await the next event matching the predicate, skipping others
pub async fn wait_for_event<F>(
    rx: &mut broadcast::Receiver<PlayerEvent>,
    mut matches: F,
) -> PlayerEvent
where
    F: FnMut(&PlayerEvent) -> bool,
{
    loop {
        let event = next_event(rx).await;
        if matches(&event) {
            return event;
        }
    }
}

/// Assert that nothing arrives on the event channel within the window
pub async fn assert_no_event(rx: &mut broadcast::Receiver<PlayerEvent>, window: Duration) {
    if let Ok(result) = timeout(window, rx.recv()).await {
        panic!("unexpected event: {:?}", result.unwrap());
    }
}
