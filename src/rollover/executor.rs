use crate::db::PartitionStore;
use crate::error::RolloverError;
use crate::job::JobReporter;
use async_trait::async_trait;
use partition_rollover_core::MigrationQueryPair;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// A large UPDATE to run in bounded id slices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkedUpdate {
    /// Shown in report lines and logs, e.g. `rt phase A`.
    pub label: String,
    pub bounding_query: String,
    pub mutating_query: String,
    pub chunk_size: u64,
    /// Raw store statements rather than entity queries.
    pub native: bool,
}

impl ChunkedUpdate {
    pub fn native(label: impl Into<String>, pair: &MigrationQueryPair, chunk_size: u64) -> Self {
        Self {
            label: label.into(),
            bounding_query: pair.bounding_query.clone(),
            mutating_query: pair.mutating_query.clone(),
            chunk_size,
            native: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChunkProgress {
    pub chunks: u64,
    pub rows: u64,
}

/// Runs a chunked update to completion or to its first failure.
///
/// A failure after committed chunks comes back as
/// [`RolloverError::PartialMigration`] so those rows can still be counted.
#[async_trait]
pub trait ChunkedExecutor: Send + Sync {
    async fn execute(
        &self,
        update: &ChunkedUpdate,
        reporter: &mut dyn JobReporter,
    ) -> Result<ChunkProgress, RolloverError>;
}

/// Slices `[min(id), max(id)]` into windows and runs one UPDATE per window.
#[derive(Clone)]
pub struct SqlChunkedExecutor {
    store: Arc<dyn PartitionStore>,
}

impl SqlChunkedExecutor {
    pub fn new(store: Arc<dyn PartitionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ChunkedExecutor for SqlChunkedExecutor {
    async fn execute(
        &self,
        update: &ChunkedUpdate,
        reporter: &mut dyn JobReporter,
    ) -> Result<ChunkProgress, RolloverError> {
        if !update.native {
            return Err(RolloverError::Executor(format!(
                "{}: only native statements are supported",
                update.label
            )));
        }

        let Some(bounds) = self.store.fetch_id_bounds(&update.bounding_query).await? else {
            debug!(label = %update.label, "no candidate rows, update skipped");
            reporter.add_report(&format!("{}: no rows to migrate", update.label));
            return Ok(ChunkProgress::default());
        };

        let windows = bounds.windows(update.chunk_size)?;
        debug!(
            label = %update.label,
            min_id = bounds.min,
            max_id = bounds.max,
            chunks = windows.len(),
            "chunked update planned"
        );

        let mut progress = ChunkProgress::default();
        for window in windows {
            let statement = window.restrict(&update.mutating_query);
            match self.store.execute(&statement).await {
                Ok(rows) => {
                    progress.chunks += 1;
                    progress.rows += rows;
                    debug!(
                        label = %update.label,
                        window = %window,
                        rows,
                        "chunk applied"
                    );
                }
                Err(e) => {
                    reporter.add_report(&format!(
                        "{}: stopped at ids {window} after {} row(s) in {} chunk(s)",
                        update.label, progress.rows, progress.chunks
                    ));
                    return Err(RolloverError::PartialMigration {
                        chunks: progress.chunks,
                        rows: progress.rows,
                        source: Box::new(e),
                    });
                }
            }
        }

        reporter.add_report(&format!(
            "{}: {} row(s) in {} chunk(s)",
            update.label, progress.rows, progress.chunks
        ));
        Ok(progress)
    }
}
