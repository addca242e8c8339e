//! Engine configuration.
//!
//! Everything is optional in the file; missing sections and fields fall back
//! to their defaults.
//!
//! ```json
//! {
//!     "bus": { "inbox_capacity": 10 },
//!     "tick": { "tick_rate": 60.0, "max_ticks": 0 }
//! }
//! ```

use std::path::{Path, PathBuf};

use engine_bus::{BusConfig, BusError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tick::TickConfig;

/// Errors loading or validating an [`EngineConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration JSON.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The bus section is unusable.
    #[error("invalid bus config: {0}")]
    Bus(#[from] BusError),

    /// The tick rate is negative or not a number.
    #[error("invalid tick rate {0}: must be a finite number >= 0")]
    TickRate(f64),
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Event bus settings.
    pub bus: BusConfig,
    /// Tick loop settings.
    pub tick: TickConfig,
}

impl EngineConfig {
    /// Load and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed or
    /// validated.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        debug!(path = %path.display(), ?config, "loaded engine config");
        Ok(config)
    }

    /// Check every section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Bus`] for a zero inbox capacity and
    /// [`ConfigError::TickRate`] for a negative or non-finite tick rate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bus.validate()?;
        if !self.tick.tick_rate.is_finite() || self.tick.tick_rate < 0.0 {
            return Err(ConfigError::TickRate(self.tick.tick_rate));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{name}-{}.json", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.bus.inbox_capacity, 10);
        assert!((config.tick.tick_rate - 60.0).abs() < f64::EPSILON);
        assert_eq!(config.tick.max_ticks, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let path = write_temp("engine-partial", r#"{ "tick": { "max_ticks": 5 } }"#);
        let config = EngineConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.tick.max_ticks, 5);
        assert_eq!(config.bus, BusConfig::default());
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_malformed_file() {
        let path = write_temp("engine-malformed", "{ bus: ");
        let err = EngineConfig::from_json_file(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_invalid_values() {
        let mut config = EngineConfig::default();
        config.bus.inbox_capacity = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Bus(BusError::ZeroCapacity))));

        let mut config = EngineConfig::default();
        config.tick.tick_rate = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::TickRate(_))));
    }
}
