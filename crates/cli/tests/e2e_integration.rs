//! End-to-end integration tests for the playwatch pipeline.
//!
//! These tests exercise the full path from a scripted scenario through the
//! selection follower and suppression gate to the merged output stream,
//! with the replay driver playing the timeline under a paused clock.

use std::sync::Arc;

use tokio::sync::mpsc;

use playwatch_core::{ActivePlayer, Playback, TransportError};
use playwatch_engine::{SelectionFollower, SuppressionGate};
use playwatch_sources::{Replay, ReplaySources, Scenario};

type Item = std::result::Result<Option<ActivePlayer>, TransportError>;

fn start(raw: &str) -> ReplaySources {
    let scenario: Scenario = toml::from_str(raw).expect("Scenario should parse");
    Replay::from_scenario(scenario)
        .expect("Scenario should validate")
        .start()
}

fn follower_over(sources: &ReplaySources) -> SelectionFollower {
    SelectionFollower::new(
        Arc::new(sources.selection.clone()),
        Arc::new(sources.players.clone()),
    )
}

async fn next(rx: &mut mpsc::Receiver<Item>) -> Option<ActivePlayer> {
    rx.recv()
        .await
        .expect("Stream should be open")
        .expect("Item should be ok")
}

fn is(active: &Option<ActivePlayer>, id: &str, title: &str) -> bool {
    match active {
        Some(player) => {
            player.id.as_str() == id && player.state.title.as_deref() == Some(title)
        }
        None => false,
    }
}

// ── E2E: Switching the active player ─────────────────────────────────────

const SWITCH_SCENARIO: &str = r#"
hold_open = true
initial_selection = ["playerA"]

[players.playerA]
playback = "Playing"
metadata = { "xesam:title" = "Song1" }

[players.playerB]
playback = "Playing"
metadata = { "xesam:title" = "SongB" }

[[steps]]
after_ms = 10
action = "metadata"
player = "playerA"
values = { "xesam:title" = "Song2" }

[[steps]]
after_ms = 10
action = "select"
players = ["playerB"]

[[steps]]
after_ms = 10
action = "metadata"
player = "playerA"
values = { "xesam:title" = "Song3" }

[[steps]]
after_ms = 10
action = "close_selection"
"#;

#[tokio::test(start_paused = true)]
async fn e2e_switch_emits_each_player_under_its_own_id() {
    let sources = start(SWITCH_SCENARIO);
    let mut rx = follower_over(&sources).run().await.expect("run should start");

    // Nothing known yet, then the selected player's eager snapshot.
    assert_eq!(next(&mut rx).await, None);
    assert!(is(&next(&mut rx).await, "playerA", "Song1"));

    // A fresh value for the same player.
    assert!(is(&next(&mut rx).await, "playerA", "Song2"));

    // The switch: the next emission is B with B's own snapshot, never a
    // stale pairing of B's id with A's last value.
    assert!(is(&next(&mut rx).await, "playerB", "SongB"));

    // A's later change goes nowhere; the stream just ends on close.
    assert!(rx.recv().await.is_none());
}

// ── E2E: Empty selection ─────────────────────────────────────────────────

const EMPTY_SCENARIO: &str = r#"
hold_open = true

[players.lonely]
playback = "Playing"
metadata = { "xesam:title" = "Never Seen" }

[[steps]]
after_ms = 10
action = "metadata"
player = "lonely"
values = { "xesam:title" = "Still Never Seen" }

[[steps]]
after_ms = 10
action = "close_selection"
"#;

#[tokio::test(start_paused = true)]
async fn e2e_empty_selection_yields_a_single_none() {
    let sources = start(EMPTY_SCENARIO);
    let mut rx = follower_over(&sources).run().await.expect("run should start");

    // One None at startup; the unselected player's activity never shows.
    assert_eq!(next(&mut rx).await, None);
    assert!(rx.recv().await.is_none());
}

// ── E2E: Suppression gate over the follower ──────────────────────────────

const GATED_SCENARIO: &str = r#"
hold_open = true
initial_selection = ["playerA"]

[players.playerA]
playback = "Playing"
metadata = { "xesam:title" = "Song1" }

[[steps]]
after_ms = 10
action = "suppress"
value = true

[[steps]]
after_ms = 10
action = "metadata"
player = "playerA"
values = { "xesam:title" = "Song2" }

[[steps]]
after_ms = 10
action = "suppress"
value = false

[[steps]]
after_ms = 10
action = "close_selection"
"#;

#[tokio::test(start_paused = true)]
async fn e2e_gate_re_pairs_on_either_side_changing() {
    let sources = start(GATED_SCENARIO);
    let merged = follower_over(&sources).run().await.expect("run should start");
    let mut rx = SuppressionGate::new(Arc::new(sources.suppression.clone()))
        .apply(merged)
        .await
        .expect("gate should start");

    let (flag, item) = rx.recv().await.expect("Should get startup pair");
    assert!(!flag);
    assert_eq!(item.expect("ok"), None);

    let (flag, item) = rx.recv().await.expect("Should get eager snapshot");
    assert!(!flag);
    assert!(is(&item.expect("ok"), "playerA", "Song1"));

    // Flag flip re-emits the held item under the new flag.
    let (flag, item) = rx.recv().await.expect("Should re-emit on suppress");
    assert!(flag);
    assert!(is(&item.expect("ok"), "playerA", "Song1"));

    // A base change keeps the latest flag.
    let (flag, item) = rx.recv().await.expect("Should emit new snapshot");
    assert!(flag);
    assert!(is(&item.expect("ok"), "playerA", "Song2"));

    let (flag, item) = rx.recv().await.expect("Should re-emit on unsuppress");
    assert!(!flag);
    assert!(is(&item.expect("ok"), "playerA", "Song2"));

    // Base completes, so the gated stream completes.
    assert!(rx.recv().await.is_none());
}

// ── E2E: Faults stay on their branch ─────────────────────────────────────

const GHOST_SCENARIO: &str = r#"
hold_open = true
initial_selection = ["ghost"]

[players.playerB]
playback = "Paused"
metadata = { "xesam:title" = "SongB" }

[[steps]]
after_ms = 10
action = "select"
players = ["playerB"]

[[steps]]
after_ms = 10
action = "close_selection"
"#;

#[tokio::test(start_paused = true)]
async fn e2e_fault_on_one_branch_leaves_the_pipeline_running() {
    let sources = start(GHOST_SCENARIO);
    let mut rx = follower_over(&sources).run().await.expect("run should start");

    assert_eq!(next(&mut rx).await, None);

    // The selected player does not exist: its branch fails, in band.
    assert!(rx.recv().await.expect("Stream still open").is_err());
    assert_eq!(next(&mut rx).await, None);

    // The next selection works fine.
    let active = next(&mut rx).await;
    assert!(is(&active, "playerB", "SongB"));
    assert_eq!(
        active.expect("checked above").state.playback,
        Playback::Paused
    );

    assert!(rx.recv().await.is_none());
}

// ── E2E: Player restart heals the stream ─────────────────────────────────

const RESTART_SCENARIO: &str = r#"
hold_open = true
initial_selection = ["playerA"]

[players.playerA]
playback = "Playing"
metadata = { "xesam:title" = "Song1" }

[[steps]]
after_ms = 10
action = "close_player"
player = "playerA"

[[steps]]
after_ms = 10
action = "select"
players = ["playerA"]

[[steps]]
after_ms = 10
action = "close_selection"
"#;

#[tokio::test(start_paused = true)]
async fn e2e_reselecting_a_restarted_player_reopens_its_stream() {
    let sources = start(RESTART_SCENARIO);
    let mut rx = follower_over(&sources).run().await.expect("run should start");

    assert_eq!(next(&mut rx).await, None);
    assert!(is(&next(&mut rx).await, "playerA", "Song1"));

    // The player's stream ends: back to None until the daemon re-announces.
    assert_eq!(next(&mut rx).await, None);

    // Re-selection performs a fresh eager read.
    assert!(is(&next(&mut rx).await, "playerA", "Song1"));
    assert!(rx.recv().await.is_none());
}

// ── E2E: Scenario files on disk ──────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn e2e_scenario_loads_from_disk_and_plays() {
    use std::io::Write;

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("switch.toml");
    let mut file = std::fs::File::create(&path).expect("create");
    file.write_all(SWITCH_SCENARIO.as_bytes()).expect("write");

    let sources = Replay::load(&path).expect("Scenario should load").start();
    let mut rx = follower_over(&sources).run().await.expect("run should start");

    assert_eq!(next(&mut rx).await, None);
    assert!(is(&next(&mut rx).await, "playerA", "Song1"));
}

// ── E2E: Configuration system ────────────────────────────────────────────

#[tokio::test]
async fn e2e_config_defaults_and_validation() {
    let config = playwatch_config::WatchConfig::default();

    assert_eq!(config.engine.capacity, 32);
    assert!(config.watch.suppression);
    assert_eq!(config.fields.state.interface, "org.mpris.MediaPlayer2.Player");
    assert_eq!(config.fields.flag.property, "Suppressed");

    // Verify TOML roundtrip.
    let toml_str = toml::to_string_pretty(&config).expect("Config should serialize");
    let reparsed: playwatch_config::WatchConfig =
        toml::from_str(&toml_str).expect("Config should parse back");

    assert_eq!(reparsed.engine.capacity, config.engine.capacity);
    assert_eq!(reparsed.fields.state.interface, config.fields.state.interface);
}
