//! Server configuration loaded from TOML.

use std::{fs, path::Path, time::Duration};

use anyhow::{ensure, Context, Result};
use rampart_core::LevelConfig;
use serde::Deserialize;

const DEFAULT_SEED: u64 = 0x5241_4d50_4152_5400;

/// Top-level server configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Scheduler cadence and phase windows.
    pub timing: TimingConfig,
    /// Global seed every room derives its spawn jitter stream from.
    pub seed: u64,
    /// Level geometry shared by every room.
    pub level: LevelConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            seed: DEFAULT_SEED,
            level: LevelConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Parses a configuration from TOML text; missing sections keep their defaults.
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse server configuration toml")
    }

    /// Reads and parses a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration at {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// Rejects values the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.timing.tick_interval_ms > 0,
            "timing.tick_interval_ms must be greater than zero"
        );
        self.level.validate().context("invalid level configuration")
    }
}

/// Scheduler cadence and the fixed windows between phases, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    /// Period of the simulation tick.
    pub tick_interval_ms: u64,
    /// Time enemies stay frozen after a wave spawns.
    pub spawn_grace_ms: u64,
    /// Time the shop stays open before the next wave.
    pub shop_window_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            spawn_grace_ms: 2000,
            shop_window_ms: 5000,
        }
    }
}

impl TimingConfig {
    /// Period of the simulation tick.
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Time enemies stay frozen after a wave spawns.
    #[must_use]
    pub const fn spawn_grace(&self) -> Duration {
        Duration::from_millis(self.spawn_grace_ms)
    }

    /// Time the shop stays open before the next wave.
    #[must_use]
    pub const fn shop_window(&self) -> Duration {
        Duration::from_millis(self.shop_window_ms)
    }
}
