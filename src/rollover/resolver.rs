use crate::db::PartitionStore;
use crate::error::RolloverError;
use partition_rollover_core::{PartitionBoundary, PartitionSource, next_boundary};
use std::sync::Arc;
use tracing::debug;

/// Computes the next partition range from the store's partition log.
#[derive(Clone)]
pub struct BoundaryResolver {
    store: Arc<dyn PartitionStore>,
}

impl BoundaryResolver {
    pub fn new(store: Arc<dyn PartitionStore>) -> Self {
        Self { store }
    }

    /// Store errors come back untouched; retrying is the scheduler's business.
    pub async fn resolve_next_boundary(
        &self,
        source: &PartitionSource,
    ) -> Result<PartitionBoundary, RolloverError> {
        let latest = self.store.latest_log_entry(source.alias.as_str()).await?;

        match &latest {
            Some(entry) => debug!(
                alias = %source.alias,
                last_from = %entry.range_from,
                last_to = %entry.range_to,
                "latest partition log entry"
            ),
            None => debug!(
                alias = %source.alias,
                seed = ?source.seed_boundary,
                "no partition log entry, falling back to seed"
            ),
        }

        Ok(next_boundary(latest.as_ref(), source)?)
    }
}
