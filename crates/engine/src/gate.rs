//! Pairing a stream with the latest suppression flag.
//!
//! A [`SuppressionGate`] wraps any stream in combine-latest fashion: each
//! output item carries the newest flag value alongside the newest base item,
//! and a change on either side re-emits the pair. Nothing is emitted until
//! the base stream has produced its first item; flag flips before that point
//! only update the value that the first pair will carry.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use playwatch_core::{FlagFields, SuppressionSource, TransportError};

/// Which side of the race produced work.
enum Settled<T> {
    Base(Option<T>),
    Note(Option<std::result::Result<playwatch_core::PropertyUpdate, TransportError>>),
}

/// Combine-latest of a base stream and the suppression flag.
///
/// The flag side is best-effort: if its subscription completes or fails, the
/// gate logs and keeps relaying base items under the last known flag. The
/// output completes when the base stream does.
pub struct SuppressionGate {
    /// The suppression daemon's surface
    source: Arc<dyn SuppressionSource>,

    /// Wire vocabulary for the flag property
    fields: FlagFields,

    /// Bound of the output channel
    capacity: usize,
}

impl SuppressionGate {
    /// Create a gate over a suppression source.
    pub fn new(source: Arc<dyn SuppressionSource>) -> Self {
        Self {
            source,
            fields: FlagFields::default(),
            capacity: 32,
        }
    }

    /// Override the wire vocabulary.
    pub fn with_fields(mut self, fields: FlagFields) -> Self {
        self.fields = fields;
        self
    }

    /// Override the channel capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Subscribe to the flag, read its current value, and start pairing.
    /// Fails if the suppression daemon cannot be reached.
    pub async fn apply<T>(
        self,
        mut base: mpsc::Receiver<T>,
    ) -> std::result::Result<mpsc::Receiver<(bool, T)>, TransportError>
    where
        T: Clone + Send + 'static,
    {
        // Subscribe before the eager read so no flip slips between.
        let mut notes = self.source.subscribe().await?;
        let mut flag = self.source.suppressed().await?;

        let (tx, rx) = mpsc::channel(self.capacity);
        let fields = self.fields;

        tokio::spawn(async move {
            let mut held: Option<T> = None;
            let mut dirty = false;
            let mut notes_open = true;

            loop {
                let settled = if notes_open {
                    tokio::select! {
                        item = base.recv() => Settled::Base(item),
                        note = notes.recv() => Settled::Note(note),
                    }
                } else {
                    Settled::Base(base.recv().await)
                };

                match settled {
                    Settled::Base(None) => return,
                    Settled::Base(Some(item)) => {
                        held = Some(item);
                        dirty = true;
                    }
                    Settled::Note(None) => {
                        debug!("suppression stream ended, continuing on base alone");
                        notes_open = false;
                    }
                    Settled::Note(Some(Err(e))) => {
                        warn!(error = %e, "suppression stream failed, continuing on base alone");
                        notes_open = false;
                    }
                    Settled::Note(Some(Ok(update))) => {
                        if update.interface != fields.interface {
                            continue;
                        }
                        if let Some(value) = update.changed.get(&fields.property) {
                            match value {
                                Value::Bool(suppressed) => {
                                    flag = *suppressed;
                                    dirty = true;
                                }
                                other => {
                                    warn!(value = %other, "suppression flag is not a boolean, ignoring");
                                }
                            }
                        } else if update.invalidated.contains(&fields.property) {
                            // The value is gone from the wire; re-announce the
                            // last known flag rather than guess a new one.
                            dirty = true;
                        }
                    }
                }

                // A change on either side re-emits the pair, but never
                // before the base stream has produced something to pair.
                if dirty {
                    if let Some(item) = &held {
                        if tx.send((flag, item.clone())).await.is_err() {
                            return;
                        }
                        dirty = false;
                    }
                }
            }
        });

        Ok(rx)
    }
}
