use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tilewalk_system_movement::{ConcurrentMovePolicy, MovementConfig, DEFAULT_TICK_INTERVAL};
use tilewalk_system_pathfinding::{SearchConfig, DEFAULT_ITERATION_CAP};

const SUPPORTED_SETTINGS_VERSION: u32 = 1;

/// Tunables loaded from the optional TOML settings file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) search: SearchConfig,
    pub(crate) movement: MovementConfig,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    version: u32,
    #[serde(default)]
    search: SearchSection,
    #[serde(default)]
    movement: MovementSection,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SearchSection {
    iteration_cap: u32,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            iteration_cap: DEFAULT_ITERATION_CAP,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct MovementSection {
    tick_interval_ms: u64,
    concurrent_moves: PolicyName,
}

impl Default for MovementSection {
    fn default() -> Self {
        let tick_interval_ms = u64::try_from(DEFAULT_TICK_INTERVAL.as_millis()).unwrap_or(120);
        Self {
            tick_interval_ms,
            concurrent_moves: PolicyName::Ignore,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PolicyName {
    Ignore,
    Supersede,
}

impl Settings {
    /// Loads settings from the TOML file at `path`.
    pub(crate) fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file at {}", path.display()))?;
        parse_settings(&contents)
            .with_context(|| format!("invalid settings file at {}", path.display()))
    }
}

fn parse_settings(contents: &str) -> Result<Settings> {
    let file: SettingsFile =
        toml::from_str(contents).context("failed to parse settings toml contents")?;
    if file.version != SUPPORTED_SETTINGS_VERSION {
        bail!(
            "unsupported settings version {}; expected {}",
            file.version,
            SUPPORTED_SETTINGS_VERSION
        );
    }
    if file.movement.tick_interval_ms == 0 {
        bail!("movement.tick_interval_ms must be positive");
    }

    let concurrent_moves = match file.movement.concurrent_moves {
        PolicyName::Ignore => ConcurrentMovePolicy::Ignore,
        PolicyName::Supersede => ConcurrentMovePolicy::Supersede,
    };

    Ok(Settings {
        search: SearchConfig {
            iteration_cap: file.search.iteration_cap,
        },
        movement: MovementConfig {
            tick_interval: Duration::from_millis(file.movement.tick_interval_ms),
            concurrent_moves,
        },
    })
}
