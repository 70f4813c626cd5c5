//! # Playwatch Core
//!
//! Domain types, traits, and error definitions for the playwatch media-player
//! monitor. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every remote surface (the player registry, individual players, the
//! suppression switch) is defined as a trait here. Implementations live in
//! their respective crates. This enables:
//! - Swapping the transport via configuration
//! - Easy testing with scripted in-memory sources
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod fields;
pub mod notify;
pub mod player;
pub mod selection;
pub mod source;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result, TransportError};
pub use fields::{FlagFields, StateFields};
pub use notify::PropertyUpdate;
pub use player::{ActivePlayer, Playback, PlayerId, PlayerState};
pub use selection::{Selection, SelectionEvent};
pub use source::{PlayerSource, PlayerSources, SelectionSource, SuppressionSource};
