mod basic;
mod rollover;

pub use basic::BasicConfig;
pub use rollover::{DEFAULT_CREATION_TEMPLATE, DEFAULT_LOG_QUERY, RolloverConfig, SourceConfig};

use crate::error::RolloverError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use partition_rollover_core::{PartitionSourceRegistry, PartitionTargets, StatementTemplate};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Store connection and logging (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Rollover job parameters and partition sources (see `rollover` table in config.toml).
    #[serde(default)]
    pub rollover: RolloverConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Env var naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "PARTITION_CONFIG";

/// Prefix of env overrides; nested keys use `__` (`PARTITION_BASIC__DATABASE_URL`).
pub const ENV_PREFIX: &str = "PARTITION_";

impl Config {
    /// Builds a Figment that merges defaults, the config TOML file if present, then env overrides.
    pub fn figment() -> Figment {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from);
        Self::figment_from(path)
    }

    pub fn figment_from(path: PathBuf) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if path.is_file() {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]).split("__"))
    }

    /// Extracts and validates the configuration.
    pub fn load() -> Result<Self, RolloverError> {
        Self::from_figment(&Self::figment())
    }

    pub fn from_figment(figment: &Figment) -> Result<Self, RolloverError> {
        let cfg: Self = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), RolloverError> {
        if self.basic.database_url.trim().is_empty() {
            return Err(RolloverError::Config(
                "basic.database_url must be set and non-empty".to_string(),
            ));
        }
        if self.rollover.chunk_size == 0 {
            return Err(RolloverError::Config(
                "rollover.chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.rollover.provisional_partition_id == self.rollover.current_partition_id {
            return Err(RolloverError::Config(
                "rollover.provisional_partition_id and rollover.current_partition_id must differ"
                    .to_string(),
            ));
        }
        self.creation_template()?;
        self.registry()?;
        Ok(())
    }

    pub fn registry(&self) -> Result<PartitionSourceRegistry, RolloverError> {
        self.rollover.registry()
    }

    pub fn creation_template(&self) -> Result<StatementTemplate, RolloverError> {
        Ok(StatementTemplate::with_arity(
            self.rollover.creation_template.as_str(),
            crate::rollover::CREATION_TEMPLATE_SLOTS,
        )?)
    }

    pub fn partition_targets(&self) -> PartitionTargets {
        PartitionTargets {
            provisional: self.rollover.provisional_partition_id,
            current: self.rollover.current_partition_id,
        }
    }
}
