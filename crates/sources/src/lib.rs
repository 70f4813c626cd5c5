//! # Playwatch Sources
//!
//! Concrete implementations of the core source traits.
//!
//! - [`memory`]: scriptable in-memory sources, shared-state handles that
//!   double as test fixtures for anything built over the traits.
//! - [`replay`]: a TOML scenario format plus a driver that plays a recorded
//!   timeline through the memory sources.

pub mod memory;
pub mod replay;

pub use memory::{MemoryPlayer, MemoryPlayers, MemorySelection, MemorySuppression};
pub use replay::{PlayerSeed, Replay, ReplayError, ReplaySources, Scenario, Step, TimedStep};
