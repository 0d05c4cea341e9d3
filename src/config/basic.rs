use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Basic (core) configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BasicConfig {
    /// Store URL; `postgres://` in production, `sqlite:` for local runs.
    /// TOML: `basic.database_url`. Default: `postgres://localhost/billing`.
    #[serde(default)]
    pub database_url: String,

    /// Log level for tracing subscriber initialization (e.g., "error", "warn", "info", "debug", "trace").
    /// TOML: `basic.loglevel`. Default: `info`.
    #[serde(default)]
    pub loglevel: String,

    /// Pool size. Rollovers are sequential, so a handful is plenty.
    /// TOML: `basic.max_connections`. Default: `4`.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection before giving up.
    /// TOML: `basic.acquire_timeout_secs`. Default: `30`.
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,

    /// Create the SQLite development schema on startup.
    /// TOML: `basic.apply_dev_schema`. Default: `false`.
    #[serde(default)]
    pub apply_dev_schema: bool,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/billing".to_string(),
            loglevel: "info".to_string(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            apply_dev_schema: false,
        }
    }
}

impl BasicConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs.max(1))
    }
}

fn default_max_connections() -> u32 {
    4
}

fn default_acquire_timeout_secs() -> u64 {
    30
}
