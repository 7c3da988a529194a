//! Configuration Management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Capture settings
    pub capture: CaptureConfig,
    /// Script synthesis settings
    pub script: ScriptConfig,
    /// Replay settings
    pub replay: ReplayConfig,
}

/// Capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Ring buffer size (power of 2)
    pub ring_buffer_size: usize,
    /// Drain-thread sleep when the buffer is empty (ms)
    pub drain_interval_ms: u64,
}

/// Script synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Startup delay emitted ahead of the first replayed action (seconds)
    pub startup_delay_secs: f64,
}

/// Replay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Cancellation poll granularity inside waits (ms)
    pub cancel_poll_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            ring_buffer_size: 4096,
            drain_interval_ms: 10,
        }
    }
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            startup_delay_secs: 2.0,
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self { cancel_poll_ms: 100 }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.capture.ring_buffer_size == 0
            || (self.capture.ring_buffer_size & (self.capture.ring_buffer_size - 1)) != 0
        {
            return Err(crate::Error::Config(format!(
                "ring_buffer_size must be a power of 2, got {}",
                self.capture.ring_buffer_size
            )));
        }
        if self.capture.drain_interval_ms == 0 {
            return Err(crate::Error::Config(
                "drain_interval_ms must be > 0".to_string(),
            ));
        }
        if !(0.0..=60.0).contains(&self.script.startup_delay_secs) {
            return Err(crate::Error::Config(format!(
                "startup_delay_secs must be in [0, 60], got {}",
                self.script.startup_delay_secs
            )));
        }
        if self.replay.cancel_poll_ms == 0 {
            return Err(crate::Error::Config(
                "cancel_poll_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Load config from file
    pub fn load(path: &PathBuf) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from default location
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &PathBuf) -> Result<(), crate::Error> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;

        // Create parent directories
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Save to default location
    pub fn save_default(&self) -> Result<(), crate::Error> {
        self.save(&Self::default_path())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".input_replay").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, crate::Error> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }
}
