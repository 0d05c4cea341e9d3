use crate::db::PartitionStore;
use crate::error::RolloverError;
use crate::job::JobReporter;
use partition_rollover_core::{PartitionBoundary, PartitionSource, StatementTemplate};
use std::sync::Arc;
use tracing::{info, warn};

/// Slots of the creation template: alias, source table, partition name, boundary start.
pub const CREATION_TEMPLATE_SLOTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationOutcome {
    Created {
        partition_name: String,
    },
    /// `message` is the store's own text when the store rejected the call.
    Failed {
        partition_name: String,
        message: String,
    },
}

/// Submits the store-side partition primitive through a text template.
#[derive(Clone)]
pub struct PartitionCreator {
    store: Arc<dyn PartitionStore>,
    template: StatementTemplate,
}

impl PartitionCreator {
    pub fn new(
        store: Arc<dyn PartitionStore>,
        template: StatementTemplate,
    ) -> Result<Self, RolloverError> {
        template.expect_arity(CREATION_TEMPLATE_SLOTS)?;
        Ok(Self { store, template })
    }

    pub fn statement(
        &self,
        source: &PartitionSource,
        boundary: &PartitionBoundary,
    ) -> Result<String, RolloverError> {
        let partition_name = boundary.partition_name(source.table.as_str());
        let boundary_start = boundary.from_sql();
        Ok(self.template.render(&[
            source.alias.as_str(),
            source.table.as_str(),
            partition_name.as_str(),
            boundary_start.as_str(),
        ])?)
    }

    /// Never fails: the outcome is reported to `reporter` and returned.
    pub async fn create_partition(
        &self,
        source: &PartitionSource,
        boundary: &PartitionBoundary,
        reporter: &mut dyn JobReporter,
    ) -> CreationOutcome {
        let partition_name = boundary.partition_name(source.table.as_str());

        let submitted = match self.statement(source, boundary) {
            Ok(statement) => self.store.call_scalar(&statement).await,
            Err(e) => Err(e),
        };

        match submitted {
            Ok(()) => {
                info!(
                    alias = %source.alias,
                    partition = %partition_name,
                    boundary = %boundary.from_sql(),
                    "partition created"
                );
                reporter.register_success();
                reporter.add_report(&format!(
                    "{}: created partition {partition_name} starting {}",
                    source.alias,
                    boundary.from_sql()
                ));
                CreationOutcome::Created { partition_name }
            }
            Err(e) => {
                let message = e.report_message();
                warn!(
                    alias = %source.alias,
                    partition = %partition_name,
                    error = %message,
                    "partition creation failed"
                );
                reporter.register_error(&message);
                reporter.add_report(&format!(
                    "{}: partition {partition_name} not created: {message}",
                    source.alias
                ));
                CreationOutcome::Failed {
                    partition_name,
                    message,
                }
            }
        }
    }
}
