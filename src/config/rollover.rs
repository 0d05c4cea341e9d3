use crate::error::RolloverError;
use chrono::NaiveDate;
use partition_rollover_core::{
    CURRENT_PARTITION_ID, EntityKind, OperationSelector, PROVISIONAL_PARTITION_ID,
    PartitionSource, PartitionSourceRegistry, SqlIdent,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default store-side partition primitive: `(alias, source table, partition name, boundary start)`.
/// The cast keeps the returned scalar decodable whatever the procedure's return type.
pub const DEFAULT_CREATION_TEMPLATE: &str =
    "SELECT CAST(create_new_partition('%s', '%s', '%s', '%s') AS TEXT)";

/// Default latest-range lookup; `$1` is the alias.
pub const DEFAULT_LOG_QUERY: &str = "SELECT CAST(max(from_date) AS TEXT), CAST(max(to_date) AS TEXT), CAST(max(created_at) AS TEXT) FROM partition_log WHERE alias = $1";

/// Job parameters for the rollover.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RolloverConfig {
    /// `ALL` or one entity kind (`EDR`, `WO`, `RT`, or their aliases).
    /// TOML: `rollover.operation`. Default: `ALL`.
    #[serde(default = "default_operation")]
    pub operation: OperationSelector,

    /// Seconds between two scheduled runs.
    /// TOML: `rollover.interval_secs`. Default: `86400`.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Run a single time and exit instead of looping on the timer.
    /// TOML: `rollover.run_once`. Default: `false`.
    #[serde(default)]
    pub run_once: bool,

    /// Ids per UPDATE slice handed to the chunked executor.
    /// TOML: `rollover.chunk_size`. Default: `100000`.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,

    /// Partition id targeted by the pass that runs before creation.
    /// TOML: `rollover.provisional_partition_id`. Default: `1`.
    #[serde(default = "default_provisional_partition_id")]
    pub provisional_partition_id: i64,

    /// Partition id targeted by the pass that runs after creation.
    /// TOML: `rollover.current_partition_id`. Default: `0`.
    #[serde(default = "default_current_partition_id")]
    pub current_partition_id: i64,

    /// Partition-creation statement with four `%s` slots.
    /// TOML: `rollover.creation_template`.
    #[serde(default = "default_creation_template")]
    pub creation_template: String,

    /// Query returning the latest `from, to[, created_at]` as text for alias `$1`.
    /// TOML: `rollover.log_query`.
    #[serde(default = "default_log_query")]
    pub log_query: String,

    /// Partitioned tables, processed in this order for `ALL`.
    /// TOML: `[[rollover.sources]]`. Default: EDR, WO, RT with a one-month period.
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,
}

/// One `[[rollover.sources]]` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    pub kind: EntityKind,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub date_column: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default = "default_period_months")]
    pub rollover_period_months: u32,
    #[serde(default)]
    pub seed_boundary: Option<NaiveDate>,
}

impl SourceConfig {
    pub fn for_kind(kind: EntityKind) -> Self {
        Self {
            kind,
            table: None,
            date_column: None,
            alias: None,
            rollover_period_months: default_period_months(),
            seed_boundary: None,
        }
    }

    /// Fills unset fields from the kind's stock entry and validates identifiers.
    pub fn to_source(&self) -> Result<PartitionSource, RolloverError> {
        let mut source = self.kind.default_source();
        if let Some(table) = &self.table {
            source.table = SqlIdent::named("table", table.as_str())?;
        }
        if let Some(column) = &self.date_column {
            source.date_column = SqlIdent::named("date_column", column.as_str())?;
        }
        if let Some(alias) = &self.alias {
            source.alias = SqlIdent::named("alias", alias.as_str())?;
        }
        source.rollover_period_months = self.rollover_period_months;
        source.seed_boundary = self.seed_boundary;
        Ok(source)
    }
}

impl Default for RolloverConfig {
    fn default() -> Self {
        Self {
            operation: default_operation(),
            interval_secs: default_interval_secs(),
            run_once: false,
            chunk_size: default_chunk_size(),
            provisional_partition_id: default_provisional_partition_id(),
            current_partition_id: default_current_partition_id(),
            creation_template: default_creation_template(),
            log_query: default_log_query(),
            sources: default_sources(),
        }
    }
}

impl RolloverConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn registry(&self) -> Result<PartitionSourceRegistry, RolloverError> {
        let sources = self
            .sources
            .iter()
            .map(SourceConfig::to_source)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PartitionSourceRegistry::new(sources)?)
    }
}

fn default_operation() -> OperationSelector {
    OperationSelector::All
}

fn default_interval_secs() -> u64 {
    24 * 60 * 60
}

fn default_chunk_size() -> u64 {
    100_000
}

fn default_provisional_partition_id() -> i64 {
    PROVISIONAL_PARTITION_ID
}

fn default_current_partition_id() -> i64 {
    CURRENT_PARTITION_ID
}

fn default_creation_template() -> String {
    DEFAULT_CREATION_TEMPLATE.to_string()
}

fn default_log_query() -> String {
    DEFAULT_LOG_QUERY.to_string()
}

fn default_period_months() -> u32 {
    1
}

fn default_sources() -> Vec<SourceConfig> {
    EntityKind::ALL.into_iter().map(SourceConfig::for_kind).collect()
}
