use super::creator::{CreationOutcome, PartitionCreator};
use super::executor::{ChunkedExecutor, ChunkedUpdate, SqlChunkedExecutor};
use super::resolver::BoundaryResolver;
use crate::config::Config;
use crate::db::PartitionStore;
use crate::error::{IsRetryable, RolloverError};
use crate::job::{
    ItemCounters, JobReporter, PartitionRunResult, RolloverState, RolloverStep, StepOutcome,
};
use partition_rollover_core::{
    MigrationPhase, MigrationPlanner, OperationSelector, PartitionBoundary, PartitionSource,
    PartitionSourceRegistry, PartitionTargets, StatementTemplate,
};
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

/// Knobs shared by every source of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolloverSettings {
    pub chunk_size: u64,
    pub targets: PartitionTargets,
}

impl Default for RolloverSettings {
    fn default() -> Self {
        Self {
            chunk_size: 100_000,
            targets: PartitionTargets::default(),
        }
    }
}

/// Drives resolve, migrate A, create, migrate B for each selected source.
pub struct PartitionRunCoordinator {
    registry: PartitionSourceRegistry,
    resolver: BoundaryResolver,
    creator: PartitionCreator,
    planner: MigrationPlanner,
    executor: Arc<dyn ChunkedExecutor>,
    settings: RolloverSettings,
}

impl PartitionRunCoordinator {
    pub fn new(
        registry: PartitionSourceRegistry,
        store: Arc<dyn PartitionStore>,
        executor: Arc<dyn ChunkedExecutor>,
        creation_template: StatementTemplate,
        settings: RolloverSettings,
    ) -> Result<Self, RolloverError> {
        if settings.chunk_size == 0 {
            return Err(RolloverError::Config(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if settings.targets.provisional == settings.targets.current {
            return Err(RolloverError::Config(format!(
                "provisional and current partition ids must differ (both {})",
                settings.targets.current
            )));
        }

        Ok(Self {
            registry,
            resolver: BoundaryResolver::new(store.clone()),
            creator: PartitionCreator::new(store, creation_template)?,
            planner: MigrationPlanner,
            executor,
            settings,
        })
    }

    /// Wires the SQL executor over `store` with everything else taken from `cfg`.
    pub fn from_config(cfg: &Config, store: Arc<dyn PartitionStore>) -> Result<Self, RolloverError> {
        let executor = Arc::new(SqlChunkedExecutor::new(store.clone()));
        Self::new(
            cfg.registry()?,
            store,
            executor,
            cfg.creation_template()?,
            RolloverSettings {
                chunk_size: cfg.rollover.chunk_size,
                targets: cfg.partition_targets(),
            },
        )
    }

    pub fn registry(&self) -> &PartitionSourceRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &RolloverSettings {
        &self.settings
    }

    /// Rolls over every selected source, one after the other.
    ///
    /// A failing source never stops the others. The run itself only fails
    /// when the selector is unknown or every source failed to reach the store.
    pub async fn run(
        &self,
        selector: OperationSelector,
        reporter: &mut dyn JobReporter,
    ) -> Result<Vec<PartitionRunResult>, RolloverError> {
        let span = info_span!("rollover", run_id = %Uuid::new_v4(), operation = %selector);
        self.run_sources(selector, reporter).instrument(span).await
    }

    async fn run_sources(
        &self,
        selector: OperationSelector,
        reporter: &mut dyn JobReporter,
    ) -> Result<Vec<PartitionRunResult>, RolloverError> {
        let sources = self.registry.select(selector)?;
        info!(sources = sources.len(), "rollover run started");

        let mut totals = ItemCounters::default();
        let mut results = Vec::with_capacity(sources.len());
        let mut unreachable = 0usize;

        for source in sources {
            let (result, store_down) = self.roll_over(source, reporter, &mut totals).await;
            if store_down {
                unreachable += 1;
            }
            results.push(result);
        }

        if !results.is_empty() && unreachable == results.len() {
            error!(sources = unreachable, "store unreachable for every source");
            return Err(RolloverError::StoreUnavailable {
                sources: unreachable,
            });
        }

        let failed = results.iter().filter(|r| !r.success).count();
        info!(
            sources = results.len(),
            failed,
            processed = totals.processed,
            warnings = totals.warning,
            "rollover run finished"
        );
        Ok(results)
    }

    /// Second value is true when boundary resolution failed on a retryable store error.
    async fn roll_over(
        &self,
        source: &PartitionSource,
        reporter: &mut dyn JobReporter,
        totals: &mut ItemCounters,
    ) -> (PartitionRunResult, bool) {
        let mut result = PartitionRunResult::start(source);
        info!(alias = %source.alias, kind = %source.kind, "source rollover started");

        result.enter(RolloverState::ResolvingBoundary);
        let boundary = match self.resolver.resolve_next_boundary(source).await {
            Ok(boundary) => boundary,
            Err(e) => {
                let store_down = e.is_retryable();
                let message = e.report_message();
                error!(alias = %source.alias, error = %message, "boundary resolution failed");
                reporter.register_error(&format!("{}: {message}", source.alias));
                fold_step(
                    &mut result,
                    RolloverStep::ResolveBoundary,
                    StepOutcome::Failed { message, rows: 0 },
                    reporter,
                    totals,
                );
                result.finish();
                reporter.add_report(&result.message);
                return (result, store_down);
            }
        };
        fold_step(
            &mut result,
            RolloverStep::ResolveBoundary,
            StepOutcome::done(),
            reporter,
            totals,
        );
        result.boundary = Some(boundary);
        result.partition_name = Some(boundary.partition_name(source.table.as_str()));
        info!(alias = %source.alias, boundary = %boundary, "next boundary resolved");

        result.enter(RolloverState::MigratingPhaseA);
        self.migrate(source, &boundary, MigrationPhase::PreCreate, &mut result, reporter, totals)
            .await;

        result.enter(RolloverState::CreatingPartition);
        let created = match self.creator.create_partition(source, &boundary, reporter).await {
            CreationOutcome::Created { .. } => StepOutcome::done(),
            CreationOutcome::Failed { message, .. } => StepOutcome::Warning { message },
        };
        fold_step(&mut result, RolloverStep::CreatePartition, created, reporter, totals);

        result.enter(RolloverState::MigratingPhaseB);
        self.migrate(source, &boundary, MigrationPhase::PostCreate, &mut result, reporter, totals)
            .await;

        result.finish();
        reporter.add_report(&result.message);
        if result.success {
            info!(alias = %source.alias, "source rollover done");
        } else {
            warn!(alias = %source.alias, summary = %result.message, "source rollover failed");
        }
        (result, false)
    }

    async fn migrate(
        &self,
        source: &PartitionSource,
        boundary: &PartitionBoundary,
        phase: MigrationPhase,
        result: &mut PartitionRunResult,
        reporter: &mut dyn JobReporter,
        totals: &mut ItemCounters,
    ) {
        let pair = self
            .planner
            .plan_phase(source, boundary, phase, &self.settings.targets);
        let update = ChunkedUpdate::native(
            format!("{} {phase}", source.alias),
            &pair,
            self.settings.chunk_size,
        );

        let outcome = match self.executor.execute(&update, reporter).await {
            Ok(progress) => {
                info!(
                    alias = %source.alias,
                    %phase,
                    target = pair.partition_target_id,
                    rows = progress.rows,
                    chunks = progress.chunks,
                    "migration pass done"
                );
                reporter.register_success();
                StepOutcome::Completed {
                    rows: progress.rows,
                    chunks: progress.chunks,
                }
            }
            Err(e) => {
                let message = e.report_message();
                let rows = e.committed_rows();
                error!(
                    alias = %source.alias,
                    %phase,
                    committed_rows = rows,
                    error = %message,
                    "migration pass failed"
                );
                reporter.register_error(&format!("{} {phase}: {message}", source.alias));
                StepOutcome::Failed { message, rows }
            }
        };
        fold_step(result, RolloverStep::Migrate(phase), outcome, reporter, totals);
    }
}

/// Records a step and republishes the run's cumulative counters.
fn fold_step(
    result: &mut PartitionRunResult,
    step: RolloverStep,
    outcome: StepOutcome,
    reporter: &mut dyn JobReporter,
    totals: &mut ItemCounters,
) {
    let delta = result.record(step, outcome);
    totals.absorb(delta);
    totals.publish(reporter);
}
