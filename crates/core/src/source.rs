//! Source traits — the abstraction over the property transport.
//!
//! A source exposes one remote property surface: the selection daemon, a
//! single player, or the suppression switch. Implementations own the actual
//! transport (a bus connection, an in-memory script); the engine only ever
//! sees these traits.
//!
//! Subscriptions follow one convention throughout: `subscribe()` returns a
//! bounded receiver of `Result` items. The channel closing is normal
//! completion of that stream. An `Err` item is a transport fault and is the
//! last item the producer sends.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::notify::PropertyUpdate;
use crate::player::PlayerId;
use crate::selection::{Selection, SelectionEvent};

/// The ordered-selection surface of the selection daemon.
#[async_trait]
pub trait SelectionSource: Send + Sync {
    /// Read the selection as it stands right now.
    async fn current(&self) -> std::result::Result<Selection, TransportError>;

    /// Subscribe to selection changes.
    async fn subscribe(
        &self,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<SelectionEvent, TransportError>>,
        TransportError,
    >;
}

/// The property surface of one player.
#[async_trait]
pub trait PlayerSource: Send + Sync {
    /// Read the raw metadata bag on demand.
    async fn metadata(
        &self,
    ) -> std::result::Result<serde_json::Map<String, serde_json::Value>, TransportError>;

    /// Read the raw playback status word on demand.
    async fn playback_status(&self) -> std::result::Result<String, TransportError>;

    /// Subscribe to this player's property-change notifications.
    async fn subscribe(
        &self,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<PropertyUpdate, TransportError>>,
        TransportError,
    >;
}

/// Registry resolving a player id to its property surface.
///
/// Resolution itself never fails; a vanished or unknown player resolves to a
/// source whose reads and subscription fail, which the engine then handles
/// like any other transport fault.
pub trait PlayerSources: Send + Sync {
    fn player(&self, id: &PlayerId) -> Arc<dyn PlayerSource>;
}

/// The boolean suppression switch.
#[async_trait]
pub trait SuppressionSource: Send + Sync {
    /// Read the flag on demand.
    async fn suppressed(&self) -> std::result::Result<bool, TransportError>;

    /// Subscribe to flag-change notifications.
    async fn subscribe(
        &self,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<PropertyUpdate, TransportError>>,
        TransportError,
    >;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSelection(Selection);

    #[async_trait]
    impl SelectionSource for FixedSelection {
        async fn current(&self) -> std::result::Result<Selection, TransportError> {
            Ok(self.0.clone())
        }

        async fn subscribe(
            &self,
        ) -> std::result::Result<
            tokio::sync::mpsc::Receiver<std::result::Result<SelectionEvent, TransportError>>,
            TransportError,
        > {
            let (tx, rx) = tokio::sync::mpsc::channel(1);
            let _ = tx
                .send(Ok(SelectionEvent::Replaced(self.0.clone())))
                .await;
            Ok(rx)
        }
    }

    #[tokio::test]
    async fn selection_source_is_object_safe() {
        let source: Arc<dyn SelectionSource> =
            Arc::new(FixedSelection(Selection::new(vec![PlayerId::from("mpv")])));
        let current = source.current().await.unwrap();
        assert_eq!(current.head().map(PlayerId::as_str), Some("mpv"));

        let mut events = source.subscribe().await.unwrap();
        let event = events.recv().await.unwrap().unwrap();
        assert_eq!(event.into_selection(), current);
    }
}
