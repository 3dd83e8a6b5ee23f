//! Scheduler settings consumed by the undo machinery.

use Error;
use serde_json;

/// Requests older than this many steps are no longer kept for undo.
pub const DEFAULT_MAX_TOTAL_LOG_SIZE: usize = 2048;

/// Settings shared between the scheduler and the components it
/// drives. Missing fields take their default values when the
/// configuration is deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of requests a user's log must retain so that
    /// every undoable request can still be transformed to the current
    /// state. `None` retains everything.
    pub max_total_log_size: Option<usize>,
}

impl Config {
    /// Constructs a configuration with unlimited log retention.
    pub fn unlimited() -> Self {
        Config{max_total_log_size: None}
    }

    /// Parses a configuration from JSON, e.g.
    /// `{"max_total_log_size": 512}`.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: Config = serde_json::from_str(json)?;
        if config.max_total_log_size == Some(0) {
            return Err(Error::InvalidConfig("max_total_log_size must be positive".into()))
        }
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config{max_total_log_size: Some(DEFAULT_MAX_TOTAL_LOG_SIZE)}
    }
}
