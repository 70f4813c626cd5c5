//! `playwatch state` — Print one player's state once.

use std::path::PathBuf;

use playwatch_config::WatchConfig;
use playwatch_core::{
    ActivePlayer, PlayerId, PlayerSources, PlayerState, SelectionSource,
};
use playwatch_sources::Replay;

pub async fn run(
    scenario: PathBuf,
    player: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = WatchConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let replay = Replay::load(&scenario)?;

    // One-shot read of the starting state; the timeline is not played.
    let sources = replay.bind();

    let id = match player {
        Some(id) => Some(PlayerId(id)),
        None => sources.selection.current().await?.head().cloned(),
    };
    let Some(id) = id else {
        println!("null");
        return Ok(());
    };

    let source = sources.players.player(&id);
    let (bag, status) = tokio::try_join!(source.metadata(), source.playback_status())
        .map_err(|e| format!("Failed to read player {id}: {e}"))?;
    let state = PlayerState::assemble(&bag, &status, &config.fields.state);

    let active = ActivePlayer { id, state };
    println!("{}", serde_json::to_string_pretty(&active)?);
    Ok(())
}
