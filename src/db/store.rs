use crate::config::BasicConfig;
use crate::db::models::LogRangeRow;
use crate::db::schema::SQLITE_DEV_SCHEMA;
use crate::error::{IsRetryable, RolloverError};
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use partition_rollover_core::{IdBounds, PartitionLogEntry, PartitionSourceRegistry};
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Row};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Everything the rollover needs from the relational store.
///
/// Statements arrive as finished text; the store never sees partition
/// semantics beyond what the text says.
#[async_trait]
pub trait PartitionStore: Send + Sync {
    /// Latest `[from, to)` logged for `alias`, or `None` on a first run.
    async fn latest_log_entry(
        &self,
        alias: &str,
    ) -> Result<Option<PartitionLogEntry>, RolloverError>;

    /// Runs a single scalar-returning statement and discards the value.
    /// The scalar must decode as a plain SQL type (text, integer, ...).
    async fn call_scalar(&self, statement: &str) -> Result<(), RolloverError>;

    /// Runs a `min(id), max(id)` query.
    async fn fetch_id_bounds(&self, query: &str) -> Result<Option<IdBounds>, RolloverError>;

    /// Runs a mutating statement and returns the affected row count.
    async fn execute(&self, statement: &str) -> Result<u64, RolloverError>;
}

/// `PartitionStore` over a sqlx `Any` pool (Postgres or SQLite, chosen by URL).
#[derive(Clone)]
pub struct SqlPartitionStore {
    pool: AnyPool,
    log_query: String,
}

impl SqlPartitionStore {
    /// Connects with exponential backoff on transport failures.
    pub async fn connect(
        basic: &BasicConfig,
        log_query: impl Into<String>,
    ) -> Result<Self, RolloverError> {
        sqlx::any::install_default_drivers();

        let retry_policy = ExponentialBuilder::default()
            .with_min_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(30))
            .with_max_times(5)
            .with_jitter();

        let pool = (|| async {
            AnyPoolOptions::new()
                .max_connections(basic.max_connections.max(1))
                .acquire_timeout(basic.acquire_timeout())
                .connect(&basic.database_url)
                .await
                .map_err(RolloverError::from)
        })
        .retry(retry_policy)
        .when(|e: &RolloverError| e.is_retryable())
        .notify(|err, dur: Duration| {
            warn!(error = %err, delay = ?dur, "store connection failed, retrying");
        })
        .await?;

        let store = Self::from_pool(pool, log_query);
        if basic.apply_dev_schema {
            store.apply_dev_schema().await?;
        }
        info!(max_connections = basic.max_connections, "store pool ready");
        Ok(store)
    }

    pub fn from_pool(pool: AnyPool, log_query: impl Into<String>) -> Self {
        Self {
            pool,
            log_query: log_query.into(),
        }
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub async fn apply_dev_schema(&self) -> Result<(), RolloverError> {
        sqlx::raw_sql(SQLITE_DEV_SCHEMA).execute(&self.pool).await?;
        debug!("development schema applied");
        Ok(())
    }

    /// Stores each source's rollover period so the dev trigger logs ranges of
    /// the right length.
    pub async fn register_dev_periods(
        &self,
        registry: &PartitionSourceRegistry,
    ) -> Result<(), RolloverError> {
        for source in registry.iter() {
            sqlx::query(
                "INSERT INTO partition_period (alias, months) VALUES ($1, $2) \
                 ON CONFLICT(alias) DO UPDATE SET months = excluded.months",
            )
            .bind(source.alias.as_str())
            .bind(i64::from(source.rollover_period_months))
            .execute(&self.pool)
            .await?;
        }
        debug!(sources = registry.len(), "development periods registered");
        Ok(())
    }
}

fn optional_text(row: &AnyRow, index: usize) -> Option<String> {
    row.try_get::<Option<String>, _>(index).ok().flatten()
}

#[async_trait]
impl PartitionStore for SqlPartitionStore {
    async fn latest_log_entry(
        &self,
        alias: &str,
    ) -> Result<Option<PartitionLogEntry>, RolloverError> {
        let row = sqlx::query(&self.log_query)
            .bind(alias)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let range = LogRangeRow {
            range_from: row.try_get::<Option<String>, _>(0)?,
            range_to: row.try_get::<Option<String>, _>(1)?,
            created_at: optional_text(&row, 2),
        };
        Ok(range.into_entry(alias)?)
    }

    async fn call_scalar(&self, statement: &str) -> Result<(), RolloverError> {
        sqlx::query(statement).fetch_all(&self.pool).await?;
        Ok(())
    }

    async fn fetch_id_bounds(&self, query: &str) -> Result<Option<IdBounds>, RolloverError> {
        let row = sqlx::query(query).fetch_optional(&self.pool).await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let min = row.try_get::<Option<i64>, _>(0)?;
        let max = row.try_get::<Option<i64>, _>(1)?;
        Ok(IdBounds::from_row(min, max))
    }

    async fn execute(&self, statement: &str) -> Result<u64, RolloverError> {
        let res = sqlx::query(statement).execute(&self.pool).await?;
        Ok(res.rows_affected())
    }
}
