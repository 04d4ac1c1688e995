//! Replay configuration
//!
//! Loadable from TOML, e.g.
//!
//! ```toml
//! skip_wait = false
//! speed = 2.0
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{KactError, Result};

const MIN_SPEED: f64 = 0.1;
const MAX_SPEED: f64 = 10.0;

/// Configuration for a replay run.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Skip every inter-act delay and its wait notification.
    pub skip_wait: bool,
    /// Playback speed multiplier (1.0 = recorded timing).
    pub speed: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            skip_wait: false,
            speed: 1.0,
        }
    }
}

impl ReplayConfig {
    /// Config that replays without any delay.
    pub fn instant() -> Self {
        Self::default().with_skip_wait(true)
    }

    pub fn with_skip_wait(mut self, skip_wait: bool) -> Self {
        self.skip_wait = skip_wait;
        self
    }

    /// Set the playback speed, clamped to 0.1..=10.0.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = clamp_speed(speed);
        self
    }

    /// Parse a config from TOML source.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let mut config: ReplayConfig =
            toml::from_str(source).map_err(|e| KactError::Config(e.to_string()))?;
        config.speed = clamp_speed(config.speed);
        Ok(config)
    }

    /// Load a config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Real time to block for a computed wait of `wait_ms`.
    pub fn scaled_delay(&self, wait_ms: u64) -> Duration {
        let nanos = (wait_ms as f64 * 1_000_000.0 / clamp_speed(self.speed)).round();
        Duration::from_nanos(nanos as u64)
    }
}

fn clamp_speed(speed: f64) -> f64 {
    if speed.is_nan() {
        return 1.0;
    }
    speed.clamp(MIN_SPEED, MAX_SPEED)
}
