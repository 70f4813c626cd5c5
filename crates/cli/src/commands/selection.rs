//! `playwatch selection` — Print the current selection once.

use std::path::PathBuf;

use playwatch_core::SelectionSource;
use playwatch_sources::Replay;

pub async fn run(scenario: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let replay = Replay::load(&scenario)?;
    let sources = replay.bind();

    let selection = sources.selection.current().await?;
    println!("{}", serde_json::to_string(&selection)?);
    Ok(())
}
