//! Per-player snapshot assembly.
//!
//! A [`StateTracker`] turns one player's raw property notifications into a
//! stream of complete [`PlayerState`] snapshots. It reads the full state
//! once up front, emits it, and from then on folds each notification into
//! the tracked fields, re-reading on demand whatever a notification
//! invalidated without a replacement value.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::warn;

use playwatch_core::{Playback, PlayerSource, PlayerState, StateFields, TransportError};

/// Snapshot assembler for a single player.
///
/// `spawn()` starts a background task and hands back the snapshot stream.
/// The stream ends when the player's notification stream ends; a transport
/// fault is delivered as a final `Err` item. Dropping the receiver cancels
/// the tracker.
pub struct StateTracker {
    /// The player's property surface
    source: Arc<dyn PlayerSource>,

    /// Wire vocabulary to match notifications against
    fields: StateFields,

    /// Bound of the outgoing snapshot channel
    capacity: usize,
}

impl StateTracker {
    /// Create a tracker over one player's property surface.
    pub fn new(source: Arc<dyn PlayerSource>) -> Self {
        Self {
            source,
            fields: StateFields::default(),
            capacity: 32,
        }
    }

    /// Override the wire vocabulary.
    pub fn with_fields(mut self, fields: StateFields) -> Self {
        self.fields = fields;
        self
    }

    /// Override the channel capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Start the tracker and return its snapshot stream.
    ///
    /// Everything, including the subscription and the eager read, happens on
    /// the spawned task, so a slow or dead player never blocks the caller.
    pub fn spawn(self) -> mpsc::Receiver<std::result::Result<PlayerState, TransportError>> {
        let (tx, rx) = mpsc::channel(self.capacity);
        let source = self.source;
        let fields = self.fields;

        tokio::spawn(async move {
            // Subscribe before the eager read so no change slips between them.
            let mut updates = match source.subscribe().await {
                Ok(updates) => updates,
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            };

            // ── Eager combined read ──
            let (bag, status) = match tokio::join!(source.metadata(), source.playback_status()) {
                (Ok(bag), Ok(status)) => (bag, status),
                (Err(e), _) | (_, Err(e)) => {
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            };

            // The initial snapshot goes out as read, even if the status word
            // is unknown; only notification-driven emissions skip on unknown.
            let initial = PlayerState::assemble(&bag, &status, &fields);
            if tx.send(Ok(initial)).await.is_err() {
                return;
            }

            let mut bag = Some(bag);
            let mut status = Some(status);

            // ── Notification loop ──
            while let Some(item) = updates.recv().await {
                let update = match item {
                    Ok(update) => update,
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                };

                if update.interface != fields.interface {
                    continue;
                }

                let mut touched = false;
                if let Some(value) = update.changed.get(&fields.metadata) {
                    bag = Some(decode_bag(value));
                    touched = true;
                }
                if let Some(value) = update.changed.get(&fields.playback) {
                    status = Some(decode_status(value));
                    touched = true;
                }
                if update.invalidated.iter().any(|p| p == &fields.metadata) {
                    bag = None;
                    touched = true;
                }
                if update.invalidated.iter().any(|p| p == &fields.playback) {
                    status = None;
                    touched = true;
                }

                if !touched {
                    continue;
                }

                // ── Refresh whatever was invalidated without a value ──
                if bag.is_none() {
                    match source.metadata().await {
                        Ok(fresh) => bag = Some(fresh),
                        Err(e) => {
                            let _ = tx.send(Err(e)).await;
                            return;
                        }
                    }
                }
                if status.is_none() {
                    match source.playback_status().await {
                        Ok(fresh) => status = Some(fresh),
                        Err(e) => {
                            let _ = tx.send(Err(e)).await;
                            return;
                        }
                    }
                }

                let (Some(bag_now), Some(status_now)) = (&bag, &status) else {
                    warn!("tracked player state unresolved after refresh, skipping emission");
                    continue;
                };

                let state = PlayerState::assemble(bag_now, status_now, &fields);
                if state.playback == Playback::Unknown {
                    warn!(status = %status_now, "unknown playback status, skipping emission");
                    continue;
                }

                if tx.send(Ok(state)).await.is_err() {
                    return;
                }
            }
        });

        rx
    }
}

fn decode_bag(value: &Value) -> serde_json::Map<String, Value> {
    match value {
        Value::Object(map) => map.clone(),
        _ => {
            warn!("metadata payload is not a map, treating as empty");
            serde_json::Map::new()
        }
    }
}

fn decode_status(value: &Value) -> String {
    match value {
        Value::String(word) => word.clone(),
        other => {
            warn!(value = %other, "playback status payload is not a string, treating as unknown");
            String::new()
        }
    }
}
