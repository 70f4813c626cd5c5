//! Scripted replay of a recorded session.
//!
//! A [`Scenario`] is a TOML file describing the players on the bus, the
//! starting selection and suppression flag, and a timeline of steps. Loading
//! one and starting it yields a bound set of memory sources plus a driver
//! task that applies each step after its delay, so the whole pipeline can be
//! exercised end to end without any real players around.
//!
//! ```toml
//! initial_selection = ["spotify"]
//!
//! [players.spotify]
//! playback = "Playing"
//! metadata = { "xesam:title" = "Song1", "xesam:artist" = "Artist" }
//!
//! [[steps]]
//! after_ms = 100
//! action = "metadata"
//! player = "spotify"
//! values = { "xesam:title" = "Song2" }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::memory::{MemoryPlayer, MemoryPlayers, MemorySelection, MemorySuppression};

/// Errors from loading or validating a scenario file.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to read scenario {path}: {reason}")]
    ReadError { path: String, reason: String },

    #[error("Failed to parse scenario {path}: {reason}")]
    ParseError { path: String, reason: String },

    #[error("Invalid scenario: {0}")]
    ValidationError(String),
}

/// A recorded session: seeded players plus a timeline of steps.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    /// Players known at start, keyed by id.
    #[serde(default)]
    pub players: std::collections::BTreeMap<String, PlayerSeed>,

    /// Selection in force before the first step.
    #[serde(default)]
    pub initial_selection: Vec<String>,

    /// Suppression flag in force before the first step.
    #[serde(default)]
    pub suppressed: bool,

    /// Keep all subscriptions open after the last step instead of closing
    /// them. Useful when a live consumer should keep waiting.
    #[serde(default)]
    pub hold_open: bool,

    #[serde(default)]
    pub steps: Vec<TimedStep>,
}

/// Starting state of one player.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerSeed {
    #[serde(default)]
    pub metadata: Map<String, Value>,

    #[serde(default)]
    pub playback: String,
}

/// One step on the timeline.
#[derive(Debug, Clone, Deserialize)]
pub struct TimedStep {
    /// Delay before this step, relative to the previous one.
    #[serde(default)]
    pub after_ms: u64,

    #[serde(flatten)]
    pub step: Step,
}

/// What a step does.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Replace the selection with the given ids, head first.
    Select { players: Vec<String> },

    /// Drop the selection entirely.
    ClearSelection,

    /// Change a player's metadata, carrying the new bag inline.
    Metadata {
        player: String,
        #[serde(default)]
        values: Map<String, Value>,
    },

    /// Change a player's playback word, carrying it inline.
    Playback { player: String, status: String },

    /// Announce a metadata change without a value.
    InvalidateMetadata { player: String },

    /// Announce a playback change without a value.
    InvalidatePlayback { player: String },

    /// Flip the suppression flag, carrying it inline.
    Suppress { value: bool },

    /// Announce a suppression change without a value.
    InvalidateSuppressed,

    /// Complete a player's property stream.
    ClosePlayer { player: String },

    /// Complete the selection stream.
    CloseSelection,
}

impl Step {
    /// The player this step manipulates, if it targets one.
    fn player(&self) -> Option<&str> {
        match self {
            Step::Metadata { player, .. }
            | Step::Playback { player, .. }
            | Step::InvalidateMetadata { player }
            | Step::InvalidatePlayback { player }
            | Step::ClosePlayer { player } => Some(player),
            _ => None,
        }
    }
}

/// The memory sources a scenario is bound to.
///
/// Clones share state with the driver, so handing these to a follower or
/// gate observes the scripted timeline as it plays out.
#[derive(Clone)]
pub struct ReplaySources {
    pub selection: MemorySelection,
    pub players: MemoryPlayers,
    pub suppression: MemorySuppression,
}

/// A validated scenario, ready to bind and play.
#[derive(Debug)]
pub struct Replay {
    scenario: Scenario,
}

impl Replay {
    /// Load and validate a scenario from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ReplayError::ReadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let scenario: Scenario = toml::from_str(&raw).map_err(|e| ReplayError::ParseError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_scenario(scenario)
    }

    /// Validate an already-built scenario.
    ///
    /// Selections may name unseeded players (the pipeline is expected to
    /// surface those as failing branches), but a step that manipulates an
    /// unseeded player is a script mistake and is rejected.
    pub fn from_scenario(scenario: Scenario) -> Result<Self, ReplayError> {
        for (index, timed) in scenario.steps.iter().enumerate() {
            if let Some(player) = timed.step.player() {
                if !scenario.players.contains_key(player) {
                    return Err(ReplayError::ValidationError(format!(
                        "step {} manipulates unseeded player '{}'",
                        index + 1,
                        player
                    )));
                }
            }
        }
        Ok(Self { scenario })
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Seed memory sources with the scenario's starting state.
    pub fn bind(&self) -> ReplaySources {
        let players = MemoryPlayers::new();
        for (id, seed) in &self.scenario.players {
            players.register(
                id.clone(),
                MemoryPlayer::new()
                    .with_metadata(seed.metadata.clone())
                    .with_playback(seed.playback.clone()),
            );
        }
        let selection = MemorySelection::new().with_current(self.scenario.initial_selection.iter().map(String::as_str));
        let suppression = MemorySuppression::new().with_suppressed(self.scenario.suppressed);
        ReplaySources {
            selection,
            players,
            suppression,
        }
    }

    /// Bind the sources and spawn the timeline driver.
    ///
    /// Unless the scenario says `hold_open`, the driver closes the selection
    /// first once the timeline ends, so a consumer's merged stream completes
    /// without a trailing headless notice, then closes everything else.
    pub fn start(self) -> ReplaySources {
        let sources = self.bind();
        let handles = sources.clone();
        let scenario = self.scenario;

        tokio::spawn(async move {
            for timed in &scenario.steps {
                tokio::time::sleep(Duration::from_millis(timed.after_ms)).await;
                apply(&timed.step, &handles).await;
            }
            if !scenario.hold_open {
                debug!("scenario finished, closing sources");
                handles.selection.close().await;
                handles.suppression.close().await;
                handles.players.close_all().await;
            }
        });

        sources
    }
}

async fn apply(step: &Step, sources: &ReplaySources) {
    match step {
        Step::Select { players } => {
            sources.selection.replace(players.iter().map(String::as_str)).await;
        }
        Step::ClearSelection => sources.selection.clear().await,
        Step::Metadata { player, values } => {
            if let Some(handle) = sources.players.get(player) {
                handle.update_metadata(values.clone()).await;
            } else {
                warn!(player = %player, "skipping step for unseeded player");
            }
        }
        Step::Playback { player, status } => {
            if let Some(handle) = sources.players.get(player) {
                handle.update_playback(status.clone()).await;
            } else {
                warn!(player = %player, "skipping step for unseeded player");
            }
        }
        Step::InvalidateMetadata { player } => {
            if let Some(handle) = sources.players.get(player) {
                handle.invalidate_metadata().await;
            }
        }
        Step::InvalidatePlayback { player } => {
            if let Some(handle) = sources.players.get(player) {
                handle.invalidate_playback().await;
            }
        }
        Step::Suppress { value } => sources.suppression.set(*value).await,
        Step::InvalidateSuppressed => sources.suppression.invalidate().await,
        Step::ClosePlayer { player } => {
            if let Some(handle) = sources.players.get(player) {
                handle.close().await;
            }
        }
        Step::CloseSelection => sources.selection.close().await,
    }
}
