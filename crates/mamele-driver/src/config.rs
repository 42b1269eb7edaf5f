//! Driver configuration

use mamele_core::{MameleError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Frame counts for the restart sequence
///
/// The emulated machine has no "start playing" primitive, only a coin slot
/// and a start button, so a restart is a timed sequence of presses. These
/// counts are tuned per game; the defaults suit most classic titles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetTiming {
    /// Frames to let pass after a machine reset
    pub reset_frames: u32,
    /// Frames between inserting a coin and pressing start
    pub coin_to_start_frames: u32,
    /// Frames between pressing start and the game accepting input
    pub start_to_live_frames: u32,
    /// Frames a coin or start press is held
    pub press_frames: u32,
}

impl Default for ResetTiming {
    fn default() -> Self {
        Self {
            reset_frames: 20,
            coin_to_start_frames: 60,
            start_to_live_frames: 20,
            press_frames: 4,
        }
    }
}

/// Configuration for a driver session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Restart sequence timing
    pub timing: ResetTiming,
    /// How long to wait for the emulator to connect
    pub accept_timeout_secs: u64,
    /// How long a closing session waits for the emulator to exit before
    /// killing it
    pub exit_grace_secs: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            timing: ResetTiming::default(),
            accept_timeout_secs: 60,
            exit_grace_secs: 5,
        }
    }
}

impl DriverConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            MameleError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn accept_timeout(&self) -> Duration {
        Duration::from_secs(self.accept_timeout_secs)
    }

    pub fn exit_grace(&self) -> Duration {
        Duration::from_secs(self.exit_grace_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json() {
        let config: DriverConfig =
            serde_json::from_str(r#"{"timing": {"coin_to_start_frames": 90}}"#).unwrap();
        assert_eq!(config.timing.coin_to_start_frames, 90);
        assert_eq!(config.timing.reset_frames, 20);
        assert_eq!(config.timing.press_frames, 4);
        assert_eq!(config.accept_timeout(), Duration::from_secs(60));
        assert_eq!(config.exit_grace(), Duration::from_secs(5));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            DriverConfig::from_json_file("/nonexistent/mamele.json"),
            Err(MameleError::ConfigError(_))
        ));
    }

    #[test]
    fn test_bad_json() {
        let err = serde_json::from_str::<DriverConfig>(r#"{"timing": 5}"#).unwrap_err();
        assert!(matches!(MameleError::from(err), MameleError::ConfigError(_)));
    }
}
