//! Scriptable in-memory sources.
//!
//! Each source is a cheap clone sharing one store, so a test (or the replay
//! driver) can keep a handle, give a clone to the code under observation, and
//! mutate the shared state while subscriptions are live. `set_*` methods
//! change stored values silently; `update_*` methods change them and push the
//! matching property notification to every subscriber.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::warn;

use playwatch_core::{
    FlagFields, PlayerId, PlayerSource, PlayerSources, PropertyUpdate, Selection, SelectionEvent,
    SelectionSource, StateFields, SuppressionSource, TransportError,
};

/// Bound of every subscription channel a memory source hands out.
const CHANNEL_CAPACITY: usize = 32;

// ── Subscriber fan-out ──

/// Live subscription senders for one source.
///
/// Thread-safe via `std::sync::Mutex` (non-async, held briefly); senders are
/// cloned out before any await.
struct Fanout<T> {
    senders: Mutex<Vec<mpsc::Sender<T>>>,
}

impl<T> Default for Fanout<T> {
    fn default() -> Self {
        Self {
            senders: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Clone> Fanout<T> {
    fn attach(&self) -> mpsc::Receiver<T> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        self.guard().push(tx);
        rx
    }

    async fn send(&self, item: T) {
        let senders = self.guard().clone();
        let mut any_closed = false;
        for tx in &senders {
            if tx.send(item.clone()).await.is_err() {
                any_closed = true;
            }
        }
        if any_closed {
            self.guard().retain(|tx| !tx.is_closed());
        }
    }

    /// Drop every sender, completing all current subscriptions. A later
    /// `attach` starts a fresh stream.
    fn close(&self) {
        self.guard().clear();
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::Sender<T>>> {
        self.senders.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ── Player ──

#[derive(Default)]
struct PlayerStore {
    metadata: Map<String, Value>,
    playback: String,
    fields: StateFields,
    failing: bool,
}

#[derive(Default)]
struct PlayerInner {
    store: RwLock<PlayerStore>,
    notes: Fanout<std::result::Result<PropertyUpdate, TransportError>>,
}

/// An in-memory player surface.
///
/// Reads serve the stored metadata bag and playback word; `set_failing(true)`
/// makes every read and new subscription fail instead, as a vanished player
/// would. Notifications synthesized by `update_*` and `invalidate_*` use the
/// player's own field vocabulary.
#[derive(Clone, Default)]
pub struct MemoryPlayer {
    inner: Arc<PlayerInner>,
}

impl MemoryPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(self, metadata: Map<String, Value>) -> Self {
        self.store_mut().metadata = metadata;
        self
    }

    pub fn with_playback(self, status: impl Into<String>) -> Self {
        self.store_mut().playback = status.into();
        self
    }

    pub fn with_fields(self, fields: StateFields) -> Self {
        self.store_mut().fields = fields;
        self
    }

    /// Store a new metadata bag without notifying anyone.
    pub fn set_metadata(&self, metadata: Map<String, Value>) {
        self.store_mut().metadata = metadata;
    }

    /// Store a new playback word without notifying anyone.
    pub fn set_playback(&self, status: impl Into<String>) {
        self.store_mut().playback = status.into();
    }

    /// Make reads and new subscriptions fail from now on.
    pub fn set_failing(&self, failing: bool) {
        self.store_mut().failing = failing;
    }

    /// Store a new metadata bag and notify subscribers with the value inline.
    pub async fn update_metadata(&self, metadata: Map<String, Value>) {
        let update = {
            let mut store = self.store_mut();
            store.metadata = metadata.clone();
            PropertyUpdate::new(&store.fields.interface)
                .with_changed(&store.fields.metadata, Value::Object(metadata))
        };
        self.inner.notes.send(Ok(update)).await;
    }

    /// Store a new playback word and notify subscribers with the value inline.
    pub async fn update_playback(&self, status: impl Into<String>) {
        let status = status.into();
        let update = {
            let mut store = self.store_mut();
            store.playback = status.clone();
            PropertyUpdate::new(&store.fields.interface)
                .with_changed(&store.fields.playback, Value::String(status))
        };
        self.inner.notes.send(Ok(update)).await;
    }

    /// Notify subscribers that the metadata changed without carrying a value.
    pub async fn invalidate_metadata(&self) {
        let update = {
            let store = self.store();
            PropertyUpdate::new(&store.fields.interface).with_invalidated(&store.fields.metadata)
        };
        self.inner.notes.send(Ok(update)).await;
    }

    /// Notify subscribers that the playback word changed without carrying a value.
    pub async fn invalidate_playback(&self) {
        let update = {
            let store = self.store();
            PropertyUpdate::new(&store.fields.interface).with_invalidated(&store.fields.playback)
        };
        self.inner.notes.send(Ok(update)).await;
    }

    /// Push an arbitrary property notification to subscribers.
    pub async fn notify(&self, update: PropertyUpdate) {
        self.inner.notes.send(Ok(update)).await;
    }

    /// Complete every open subscription.
    pub async fn close(&self) {
        self.inner.notes.close();
    }

    fn store(&self) -> RwLockReadGuard<'_, PlayerStore> {
        self.inner.store.read().unwrap_or_else(|e| e.into_inner())
    }

    fn store_mut(&self) -> RwLockWriteGuard<'_, PlayerStore> {
        self.inner.store.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl PlayerSource for MemoryPlayer {
    async fn metadata(&self) -> std::result::Result<Map<String, Value>, TransportError> {
        let store = self.store();
        if store.failing {
            return Err(TransportError::Read {
                property: store.fields.metadata.clone(),
                reason: "player is unreachable".into(),
            });
        }
        Ok(store.metadata.clone())
    }

    async fn playback_status(&self) -> std::result::Result<String, TransportError> {
        let store = self.store();
        if store.failing {
            return Err(TransportError::Read {
                property: store.fields.playback.clone(),
                reason: "player is unreachable".into(),
            });
        }
        Ok(store.playback.clone())
    }

    async fn subscribe(
        &self,
    ) -> std::result::Result<
        mpsc::Receiver<std::result::Result<PropertyUpdate, TransportError>>,
        TransportError,
    > {
        if self.store().failing {
            return Err(TransportError::Subscribe("player is unreachable".into()));
        }
        Ok(self.inner.notes.attach())
    }
}

// ── Player registry ──

/// A registry of in-memory players.
///
/// Ids that were never registered resolve to a failing player, so a stale
/// selection entry surfaces as a transport fault on that branch rather than
/// a missing stream.
#[derive(Clone, Default)]
pub struct MemoryPlayers {
    inner: Arc<Mutex<HashMap<String, MemoryPlayer>>>,
}

impl MemoryPlayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: impl Into<String>, player: MemoryPlayer) {
        self.guard().insert(id.into(), player);
    }

    pub fn get(&self, id: &str) -> Option<MemoryPlayer> {
        self.guard().get(id).cloned()
    }

    /// Complete every registered player's subscriptions.
    pub async fn close_all(&self) {
        let players: Vec<MemoryPlayer> = self.guard().values().cloned().collect();
        for player in players {
            player.close().await;
        }
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, HashMap<String, MemoryPlayer>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PlayerSources for MemoryPlayers {
    fn player(&self, id: &PlayerId) -> Arc<dyn PlayerSource> {
        match self.get(id.as_str()) {
            Some(player) => Arc::new(player),
            None => {
                warn!(player = %id, "unregistered player, resolving to a failing source");
                let vacant = MemoryPlayer::new();
                vacant.set_failing(true);
                Arc::new(vacant)
            }
        }
    }
}

// ── Selection ──

#[derive(Default)]
struct SelectionInner {
    current: RwLock<Selection>,
    events: Fanout<std::result::Result<SelectionEvent, TransportError>>,
}

/// An in-memory selection daemon surface.
#[derive(Clone, Default)]
pub struct MemorySelection {
    inner: Arc<SelectionInner>,
}

impl MemorySelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_current<I>(self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<PlayerId>,
    {
        *self.current_mut() = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the selection and notify subscribers.
    pub async fn replace<I>(&self, ids: I)
    where
        I: IntoIterator,
        I::Item: Into<PlayerId>,
    {
        let selection: Selection = ids.into_iter().map(Into::into).collect();
        *self.current_mut() = selection.clone();
        self.inner
            .events
            .send(Ok(SelectionEvent::Replaced(selection)))
            .await;
    }

    /// Drop the selection entirely and notify subscribers.
    pub async fn clear(&self) {
        *self.current_mut() = Selection::default();
        self.inner.events.send(Ok(SelectionEvent::Cleared)).await;
    }

    /// Push a transport fault as the final item of every subscription.
    pub async fn fail(&self, reason: impl Into<String>) {
        self.inner
            .events
            .send(Err(TransportError::Connection(reason.into())))
            .await;
        self.inner.events.close();
    }

    /// Complete every open subscription.
    pub async fn close(&self) {
        self.inner.events.close();
    }

    fn current_mut(&self) -> RwLockWriteGuard<'_, Selection> {
        self.inner.current.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SelectionSource for MemorySelection {
    async fn current(&self) -> std::result::Result<Selection, TransportError> {
        Ok(self
            .inner
            .current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }

    async fn subscribe(
        &self,
    ) -> std::result::Result<
        mpsc::Receiver<std::result::Result<SelectionEvent, TransportError>>,
        TransportError,
    > {
        Ok(self.inner.events.attach())
    }
}

// ── Suppression ──

#[derive(Default)]
struct SuppressionStore {
    suppressed: bool,
    fields: FlagFields,
}

#[derive(Default)]
struct SuppressionInner {
    store: RwLock<SuppressionStore>,
    notes: Fanout<std::result::Result<PropertyUpdate, TransportError>>,
}

/// An in-memory suppression daemon surface.
#[derive(Clone, Default)]
pub struct MemorySuppression {
    inner: Arc<SuppressionInner>,
}

impl MemorySuppression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_suppressed(self, suppressed: bool) -> Self {
        self.store_mut().suppressed = suppressed;
        self
    }

    pub fn with_fields(self, fields: FlagFields) -> Self {
        self.store_mut().fields = fields;
        self
    }

    /// Store a new flag value and notify subscribers with the value inline.
    pub async fn set(&self, suppressed: bool) {
        let update = {
            let mut store = self.store_mut();
            store.suppressed = suppressed;
            PropertyUpdate::new(&store.fields.interface)
                .with_changed(&store.fields.property, Value::Bool(suppressed))
        };
        self.inner.notes.send(Ok(update)).await;
    }

    /// Notify subscribers that the flag changed without carrying a value.
    pub async fn invalidate(&self) {
        let update = {
            let store = self.store();
            PropertyUpdate::new(&store.fields.interface).with_invalidated(&store.fields.property)
        };
        self.inner.notes.send(Ok(update)).await;
    }

    /// Push an arbitrary property notification to subscribers.
    pub async fn notify(&self, update: PropertyUpdate) {
        self.inner.notes.send(Ok(update)).await;
    }

    /// Push a transport fault as the final item of every subscription.
    pub async fn fail(&self, reason: impl Into<String>) {
        self.inner
            .notes
            .send(Err(TransportError::Connection(reason.into())))
            .await;
        self.inner.notes.close();
    }

    /// Complete every open subscription.
    pub async fn close(&self) {
        self.inner.notes.close();
    }

    fn store(&self) -> RwLockReadGuard<'_, SuppressionStore> {
        self.inner.store.read().unwrap_or_else(|e| e.into_inner())
    }

    fn store_mut(&self) -> RwLockWriteGuard<'_, SuppressionStore> {
        self.inner.store.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SuppressionSource for MemorySuppression {
    async fn suppressed(&self) -> std::result::Result<bool, TransportError> {
        Ok(self.store().suppressed)
    }

    async fn subscribe(
        &self,
    ) -> std::result::Result<
        mpsc::Receiver<std::result::Result<PropertyUpdate, TransportError>>,
        TransportError,
    > {
        Ok(self.inner.notes.attach())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(title: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("xesam:title".into(), json!(title));
        map
    }

    #[tokio::test]
    async fn update_metadata_notifies_with_the_value_inline() {
        let player = MemoryPlayer::new();
        let mut rx = player.subscribe().await.unwrap();

        player.update_metadata(bag("Song1")).await;

        let update = rx.recv().await.unwrap().unwrap();
        assert_eq!(update.interface, StateFields::default().interface);
        assert_eq!(
            update.changed.get("Metadata"),
            Some(&Value::Object(bag("Song1")))
        );
        assert!(update.invalidated.is_empty());
    }

    #[tokio::test]
    async fn custom_fields_shape_the_notifications() {
        let fields = StateFields {
            interface: "net.example.Deck".into(),
            playback: "Transport".into(),
            ..StateFields::default()
        };
        let player = MemoryPlayer::new().with_fields(fields);
        let mut rx = player.subscribe().await.unwrap();

        player.update_playback("Playing").await;

        let update = rx.recv().await.unwrap().unwrap();
        assert_eq!(update.interface, "net.example.Deck");
        assert_eq!(update.changed.get("Transport"), Some(&json!("Playing")));
    }

    #[tokio::test]
    async fn set_methods_store_without_notifying() {
        let player = MemoryPlayer::new().with_playback("Playing");
        let mut rx = player.subscribe().await.unwrap();

        player.set_metadata(bag("Song1"));
        player.set_playback("Paused");
        player.invalidate_playback().await;

        let update = rx.recv().await.unwrap().unwrap();
        assert!(update.changed.is_empty());
        assert_eq!(update.invalidated, vec!["PlaybackStatus".to_string()]);
        assert_eq!(player.playback_status().await.unwrap(), "Paused");
    }

    #[tokio::test]
    async fn failing_player_rejects_reads_and_subscriptions() {
        let player = MemoryPlayer::new().with_metadata(bag("Song1"));
        player.set_failing(true);

        assert!(player.metadata().await.is_err());
        assert!(player.playback_status().await.is_err());
        assert!(player.subscribe().await.is_err());
    }

    #[tokio::test]
    async fn close_completes_open_subscriptions() {
        let player = MemoryPlayer::new();
        let mut rx = player.subscribe().await.unwrap();

        player.close().await;
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn registry_resolves_vacant_ids_to_failing_sources() {
        let players = MemoryPlayers::new();
        players.register("spotify", MemoryPlayer::new().with_metadata(bag("Song1")));

        let known = players.player(&PlayerId::from("spotify"));
        assert!(known.metadata().await.is_ok());

        let ghost = players.player(&PlayerId::from("ghost"));
        assert!(ghost.metadata().await.is_err());
        assert!(ghost.subscribe().await.is_err());
    }

    #[tokio::test]
    async fn selection_replace_reaches_subscribers_and_current() {
        let selection = MemorySelection::new();
        let mut rx = selection.subscribe().await.unwrap();

        selection.replace(["spotify", "vlc"]).await;

        let event = rx.recv().await.unwrap().unwrap();
        let replaced = event.into_selection();
        assert_eq!(replaced.head().map(PlayerId::as_str), Some("spotify"));
        assert_eq!(selection.current().await.unwrap(), replaced);
    }

    #[tokio::test]
    async fn selection_fail_delivers_the_fault_last() {
        let selection = MemorySelection::new();
        let mut rx = selection.subscribe().await.unwrap();

        selection.fail("daemon went away").await;

        assert!(rx.recv().await.unwrap().is_err());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn suppression_set_notifies_with_the_flag_inline() {
        let suppression = MemorySuppression::new();
        let mut rx = suppression.subscribe().await.unwrap();

        suppression.set(true).await;

        let update = rx.recv().await.unwrap().unwrap();
        assert_eq!(update.interface, FlagFields::default().interface);
        assert_eq!(update.changed.get("Suppressed"), Some(&json!(true)));
        assert!(suppression.suppressed().await.unwrap());
    }

    #[tokio::test]
    async fn dropped_receivers_are_pruned_from_the_fanout() {
        let player = MemoryPlayer::new();
        let rx = player.subscribe().await.unwrap();
        let mut live = player.subscribe().await.unwrap();
        drop(rx);

        player.update_metadata(bag("Song1")).await;
        assert!(live.recv().await.unwrap().is_ok());

        player.update_metadata(bag("Song2")).await;
        assert!(live.recv().await.unwrap().is_ok());
    }
}
