//! `playwatch check` — Validate config and scenario files.

use std::path::PathBuf;

use playwatch_config::WatchConfig;
use playwatch_sources::Replay;

pub async fn run(
    scenario: Option<PathBuf>,
    print_config: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if print_config {
        print!("{}", WatchConfig::default_toml());
        return Ok(());
    }

    println!("playwatch check");
    println!("===============\n");

    let mut issues = 0;

    let config_path = WatchConfig::config_dir().join("config.toml");
    if config_path.exists() {
        match WatchConfig::load() {
            Ok(config) => {
                println!("  ✅ Config file valid");
                println!("     State interface: {}", config.fields.state.interface);
                println!("     Flag interface:  {}", config.fields.flag.interface);
                println!("     Capacity:        {}", config.engine.capacity);
            }
            Err(e) => {
                println!("  ❌ Config file invalid: {e}");
                issues += 1;
            }
        }
    } else {
        println!("  ✅ No config file at {}, defaults apply", config_path.display());
    }

    if let Some(path) = scenario {
        match Replay::load(&path) {
            Ok(replay) => {
                let scenario = replay.scenario();
                println!(
                    "  ✅ Scenario valid: {} player(s), {} step(s)",
                    scenario.players.len(),
                    scenario.steps.len()
                );
                if scenario.initial_selection.is_empty() {
                    println!("  ⚠️  Scenario starts with an empty selection");
                }
            }
            Err(e) => {
                println!("  ❌ {e}");
                issues += 1;
            }
        }
    }

    println!();
    if issues == 0 {
        println!("  All checks passed");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
