//! `playwatch watch` — Stream the merged active-player state as JSON lines.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

use playwatch_config::WatchConfig;
use playwatch_core::{ActivePlayer, TransportError};
use playwatch_engine::{SelectionFollower, SuppressionGate};
use playwatch_sources::Replay;

type MergedItem = std::result::Result<Option<ActivePlayer>, TransportError>;

pub async fn run(
    scenario: PathBuf,
    no_suppression: bool,
    dedup: bool,
    trim_artist: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = WatchConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let dedup = dedup || config.watch.dedup;
    let trim_artist = trim_artist || config.watch.trim_artist;
    let gated = config.watch.suppression && !no_suppression;

    let replay = Replay::load(&scenario)?;
    info!(
        scenario = %scenario.display(),
        players = replay.scenario().players.len(),
        steps = replay.scenario().steps.len(),
        "playing scenario"
    );
    if !gated {
        debug!("suppression gate is off");
    }
    let sources = replay.start();

    let follower = SelectionFollower::new(
        Arc::new(sources.selection.clone()),
        Arc::new(sources.players.clone()),
    )
    .with_fields(config.fields.state.clone())
    .with_capacity(config.engine.capacity);
    let merged = follower
        .run()
        .await
        .map_err(|e| format!("Selection source unavailable: {e}"))?;

    let mut last: Option<String> = None;
    if gated {
        let gate = SuppressionGate::new(Arc::new(sources.suppression.clone()))
            .with_fields(config.fields.flag.clone())
            .with_capacity(config.engine.capacity);
        let paired = gate
            .apply(merged)
            .await
            .map_err(|e| format!("Suppression source unavailable: {e}"))?;

        let mut stream = ReceiverStream::new(paired);
        while let Some((suppressed, item)) = stream.next().await {
            let line = render(item, Some(suppressed), trim_artist);
            if let Some(line) = take_line(line, dedup, &mut last) {
                println!("{line}");
            }
        }
    } else {
        let mut stream = ReceiverStream::new(merged);
        while let Some(item) = stream.next().await {
            let line = render(item, None, trim_artist);
            if let Some(line) = take_line(line, dedup, &mut last) {
                println!("{line}");
            }
        }
    }

    Ok(())
}

/// One output line: the merged item, plus the suppression flag when gated.
fn render(item: MergedItem, suppressed: Option<bool>, trim_artist: bool) -> String {
    let mut line = serde_json::Map::new();
    if let Some(suppressed) = suppressed {
        line.insert("suppressed".into(), suppressed.into());
    }
    match item {
        Ok(Some(player)) => {
            let state = if trim_artist {
                player.state.without_redundant_artist()
            } else {
                player.state
            };
            line.insert(
                "active".into(),
                serde_json::json!({ "player": player.id, "state": state }),
            );
        }
        Ok(None) => {
            line.insert("active".into(), serde_json::Value::Null);
        }
        Err(e) => {
            line.insert("error".into(), e.to_string().into());
        }
    }
    serde_json::Value::Object(line).to_string()
}

/// Pass `line` through unless dedup is on and it repeats the previous one.
fn take_line(line: String, dedup: bool, last: &mut Option<String>) -> Option<String> {
    if dedup && last.as_deref() == Some(line.as_str()) {
        return None;
    }
    *last = Some(line.clone());
    Some(line)
}
