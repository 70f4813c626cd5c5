//! Following the head of the ordered selection.
//!
//! A [`SelectionFollower`] merges the selection stream with the snapshot
//! stream of whichever player currently heads the selection. At most one
//! player subscription is open at any time; a selection change retires the
//! outgoing player's stream before the next one opens, so a stale snapshot
//! can never be paired with the new player's id.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use playwatch_core::{
    ActivePlayer, PlayerId, PlayerSources, PlayerState, Selection, SelectionEvent,
    SelectionSource, StateFields, TransportError,
};

use crate::state::StateTracker;

type SnapshotStream = mpsc::Receiver<std::result::Result<PlayerState, TransportError>>;

/// Which of the two raced waits settled first.
enum Next {
    Selection(Option<std::result::Result<SelectionEvent, TransportError>>),
    Snapshot(Option<std::result::Result<PlayerState, TransportError>>),
}

/// The switch-merge over selection and per-player snapshot streams.
///
/// `run()` yields a stream of `Ok(None)` (no active player), `Ok(Some(_))`
/// (the active player with a fresh snapshot), and `Err(_)` items. An `Err`
/// from the active player's own stream is forwarded and the follower keeps
/// going headless; an `Err` from the selection subscription is the stream's
/// final item. The stream completes when the selection subscription does.
pub struct SelectionFollower {
    /// The selection daemon's surface
    selection: Arc<dyn SelectionSource>,

    /// Registry resolving ids to player surfaces
    players: Arc<dyn PlayerSources>,

    /// Wire vocabulary handed to each player tracker
    fields: StateFields,

    /// Bound of every channel this follower opens
    capacity: usize,
}

impl SelectionFollower {
    /// Create a follower over a selection source and a player registry.
    pub fn new(selection: Arc<dyn SelectionSource>, players: Arc<dyn PlayerSources>) -> Self {
        Self {
            selection,
            players,
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

    /// Subscribe to the selection, read its current value, and start the
    /// merge. Fails if the selection daemon cannot be reached.
    pub async fn run(
        self,
    ) -> std::result::Result<
        mpsc::Receiver<std::result::Result<Option<ActivePlayer>, TransportError>>,
        TransportError,
    > {
        // Subscribe before the eager read so no replacement slips between.
        let mut events = self.selection.subscribe().await?;
        let current = self.selection.current().await?;

        let (tx, rx) = mpsc::channel(self.capacity);
        let players = self.players;
        let fields = self.fields;
        let capacity = self.capacity;

        tokio::spawn(async move {
            // Nothing is resolved yet: the first output is always None.
            if tx.send(Ok(None)).await.is_err() {
                return;
            }

            let mut active = open_head(&current, players.as_ref(), &fields, capacity);

            loop {
                let next = match active.as_mut() {
                    // Headless: park on the selection subscription alone.
                    None => Next::Selection(events.recv().await),
                    Some((_, snapshots)) => tokio::select! {
                        event = events.recv() => Next::Selection(event),
                        snapshot = snapshots.recv() => Next::Snapshot(snapshot),
                    },
                };

                match next {
                    Next::Selection(None) => return,
                    Next::Selection(Some(Err(e))) => {
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                    Next::Selection(Some(Ok(event))) => {
                        // Retire the outgoing stream first; at most one
                        // player subscription is ever open.
                        drop(active.take());
                        active = open_head(
                            &event.into_selection(),
                            players.as_ref(),
                            &fields,
                            capacity,
                        );
                        if active.is_none() && tx.send(Ok(None)).await.is_err() {
                            return;
                        }
                    }
                    Next::Snapshot(None) => {
                        debug!("active player stream ended, waiting for next selection");
                        active = None;
                        if tx.send(Ok(None)).await.is_err() {
                            return;
                        }
                    }
                    Next::Snapshot(Some(Err(e))) => {
                        warn!(error = %e, "active player stream failed");
                        if tx.send(Err(e)).await.is_err() {
                            return;
                        }
                        active = None;
                        if tx.send(Ok(None)).await.is_err() {
                            return;
                        }
                    }
                    Next::Snapshot(Some(Ok(state))) => {
                        if let Some((id, _)) = active.as_ref() {
                            let item = ActivePlayer {
                                id: id.clone(),
                                state,
                            };
                            if tx.send(Ok(Some(item))).await.is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        });

        Ok(rx)
    }
}

/// Open a snapshot stream for the selection head, if there is one.
fn open_head(
    selection: &Selection,
    players: &dyn PlayerSources,
    fields: &StateFields,
    capacity: usize,
) -> Option<(PlayerId, SnapshotStream)> {
    let id = selection.head()?;
    info!(player = %id, "following active player");
    let snapshots = StateTracker::new(players.player(id))
        .with_fields(fields.clone())
        .with_capacity(capacity)
        .spawn();
    Some((id.clone(), snapshots))
}
