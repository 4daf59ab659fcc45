//! # Skirmish
//!
//! Headless arena runner for the combat core.
//!
//! Usage:
//! - `skirmish [config.toml]` runs the arena described by the config
//! - `skirmish --init [config.toml]` writes the default config and exits
//!
//! Set `RUST_LOG` to adjust verbosity and `SKIRMISH_LOG_FORMAT=json` for
//! structured output.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use anyhow::{Context, Result};
use skirmish_sim::config::{SimConfig, CONFIG_FILE};
use skirmish_sim::scenario::{EventLog, Scenario};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    let json = std::env::var("SKIRMISH_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let (plain, structured) = if json {
        (None, Some(fmt::layer().json()))
    } else {
        (Some(fmt::layer()), None)
    };

    tracing_subscriber::registry()
        .with(plain)
        .with(structured)
        .with(
            EnvFilter::from_default_env()
                .add_directive("skirmish_core=info".parse()?)
                .add_directive("skirmish_sim=info".parse()?),
        )
        .init();

    info!("Skirmish {}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    let first = args.next();

    if first.as_deref() == Some("--init") {
        let path = args.next().unwrap_or_else(|| CONFIG_FILE.to_string());
        SimConfig::default()
            .save_to(&path)
            .with_context(|| format!("failed to write {path}"))?;
        return Ok(());
    }

    let path = first.unwrap_or_else(|| CONFIG_FILE.to_string());
    let mut config = SimConfig::load_from(&path);
    config.validate();

    let scenario = Scenario::from_config(&config).context("failed to build arena")?;
    let mut log = EventLog::default();
    let summary = scenario.run(&mut log)?;

    info!(
        elapsed = summary.elapsed,
        player_alive = summary.player_alive,
        hits = summary.events.hits,
        total_damage = summary.events.total_damage,
        combo_steps = summary.events.combo_steps,
        dashes = summary.events.dashes,
        dropped_events = summary.dropped_events,
        "summary"
    );
    Ok(())
}
