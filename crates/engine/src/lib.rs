//! # Playwatch Engine
//!
//! The stream combinators at the heart of playwatch. Three pieces, composed
//! in order:
//!
//! - [`StateTracker`] assembles one player's partial-update notifications
//!   into complete [`PlayerState`](playwatch_core::PlayerState) snapshots.
//! - [`SelectionFollower`] follows the head of the ordered selection,
//!   opening a tracker for whichever player is active and cancelling it the
//!   moment the selection moves on.
//! - [`SuppressionGate`] pairs any stream with the boolean suppression
//!   switch, re-emitting the latest value whenever either side changes.
//!
//! Each combinator runs as a single spawned task feeding a bounded channel.
//! The returned receiver is the stream: read it to consume, drop it to
//! cancel. All coordination is race-then-cancel via `tokio::select!` over
//! cancel-safe channel reads; no stage shares mutable state with another.

pub mod follow;
pub mod gate;
pub mod state;

pub use follow::SelectionFollower;
pub use gate::SuppressionGate;
pub use state::StateTracker;
