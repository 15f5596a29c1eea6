//! Configuration loading for the player
//!
//! Settings are loaded from a TOML file resolved in priority order:
//! 1. Explicit path argument (highest priority)
//! 2. `MIRRORQ_CONFIG` environment variable
//! 3. OS config directory (`<config dir>/mirrorq/config.toml`)
//! 4. Built-in defaults (fallback)
//!
//! A missing or unreadable file degrades to defaults with a warning; a
//! present but malformed file is a hard error so typos do not silently
//! vanish into defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Environment variable naming the configuration file path
pub const CONFIG_ENV_VAR: &str = "MIRRORQ_CONFIG";

/// How the player responds to an engine-reported playback failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stay on the failed entry and transition to Stopped
    Stop,
    /// Advance past the failed entry as if it had finished
    Skip,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        FailurePolicy::Stop
    }
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::Stop => write!(f, "stop"),
            FailurePolicy::Skip => write!(f, "skip"),
        }
    }
}

/// Player configuration loaded from TOML
///
/// Every field has a built-in default; missing fields take defaults and
/// unknown fields are ignored, so old and new config files stay readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Event broadcast channel capacity
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Response to engine playback failures
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Compare mirror against logical queue after every reconciliation
    ///
    /// Disable for very large queues where the O(n) comparison costs more
    /// than the diagnostics are worth.
    #[serde(default = "default_audit_reconciliation")]
    pub audit_reconciliation: bool,
}

fn default_event_capacity() -> usize {
    100
}

fn default_audit_reconciliation() -> bool {
    true
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            event_capacity: default_event_capacity(),
            failure_policy: FailurePolicy::default(),
            audit_reconciliation: default_audit_reconciliation(),
        }
    }
}

impl PlayerConfig {
    /// Load configuration following the documented priority order
    ///
    /// Returns defaults when no file can be located or read; returns
    /// `Error::Config` only when a located file fails to parse.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = match Self::resolve_path(explicit_path) {
            Some(path) => path,
            None => {
                debug!("No configuration file location available, using defaults");
                return Ok(Self::default());
            }
        };

        if !path.exists() {
            warn!(
                "Configuration file not found: {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    "Failed to read configuration file {}: {}, using defaults",
                    path.display(),
                    e
                );
                return Ok(Self::default());
            }
        };

        let config: PlayerConfig = toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Resolve the configuration file path without touching the filesystem
    fn resolve_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
        // Priority 1: explicit path argument
        if let Some(path) = explicit_path {
            return Some(path.to_path_buf());
        }

        // Priority 2: environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }

        // Priority 3: OS config directory
        dirs::config_dir().map(|d| d.join("mirrorq").join("config.toml"))
    }
}
