use super::report::JobReporter;
use partition_rollover_core::{EntityKind, MigrationPhase, PartitionBoundary, PartitionSource};
use serde::Serialize;
use std::fmt;

/// Where one source's rollover currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RolloverState {
    Idle,
    ResolvingBoundary,
    MigratingPhaseA,
    CreatingPartition,
    MigratingPhaseB,
    Done { success: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RolloverStep {
    ResolveBoundary,
    Migrate(MigrationPhase),
    CreatePartition,
}

impl fmt::Display for RolloverStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RolloverStep::ResolveBoundary => f.write_str("boundary resolution"),
            RolloverStep::Migrate(phase) => write!(f, "migration {phase}"),
            RolloverStep::CreatePartition => f.write_str("partition creation"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StepOutcome {
    Completed { rows: u64, chunks: u64 },
    /// Recorded but does not fail the rollover.
    Warning { message: String },
    /// `rows` were committed before the step stopped.
    Failed { message: String, rows: u64 },
}

impl StepOutcome {
    pub fn done() -> Self {
        StepOutcome::Completed { rows: 0, chunks: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub step: RolloverStep,
    pub outcome: StepOutcome,
}

/// Item counters in job-framework terms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ItemCounters {
    pub processed: u64,
    pub ok: u64,
    pub error: u64,
    pub warning: u64,
}

impl ItemCounters {
    pub fn absorb(&mut self, other: ItemCounters) {
        self.processed += other.processed;
        self.ok += other.ok;
        self.error += other.error;
        self.warning += other.warning;
    }

    pub fn publish(&self, reporter: &mut dyn JobReporter) {
        reporter.set_nb_items_to_process(self.processed);
        reporter.set_nb_items_correct(self.ok);
        reporter.set_nb_items_error(self.error);
        reporter.set_nb_items_warning(self.warning);
    }
}

/// Outcome of one rollover attempt for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionRunResult {
    /// Alias of the source.
    pub source: String,
    pub kind: EntityKind,
    pub success: bool,
    pub message: String,
    pub items_processed: u64,
    pub items_ok: u64,
    pub items_error: u64,
    pub items_warning: u64,
    pub boundary: Option<PartitionBoundary>,
    pub partition_name: Option<String>,
    pub state: RolloverState,
    pub steps: Vec<StepRecord>,
}

impl PartitionRunResult {
    pub fn start(source: &PartitionSource) -> Self {
        Self {
            source: source.alias.to_string(),
            kind: source.kind,
            success: true,
            message: String::new(),
            items_processed: 0,
            items_ok: 0,
            items_error: 0,
            items_warning: 0,
            boundary: None,
            partition_name: None,
            state: RolloverState::Idle,
            steps: Vec::new(),
        }
    }

    /// Folds one step into the result and returns the counter delta it caused.
    ///
    /// Migrated rows count as processed and correct items, including rows a
    /// failed migration committed before stopping. A warning or a failure
    /// also counts as one item of that kind. Only failures clear `success`.
    pub fn record(&mut self, step: RolloverStep, outcome: StepOutcome) -> ItemCounters {
        let mut delta = ItemCounters::default();
        match &outcome {
            StepOutcome::Completed { rows, .. } => {
                if matches!(step, RolloverStep::Migrate(_)) {
                    delta.processed = *rows;
                    delta.ok = *rows;
                }
            }
            StepOutcome::Warning { .. } => delta.warning = 1,
            StepOutcome::Failed { rows, .. } => {
                if matches!(step, RolloverStep::Migrate(_)) {
                    delta.processed = *rows;
                    delta.ok = *rows;
                }
                delta.error = 1;
                self.success = false;
            }
        }

        self.items_processed += delta.processed;
        self.items_ok += delta.ok;
        self.items_error += delta.error;
        self.items_warning += delta.warning;
        self.steps.push(StepRecord { step, outcome });
        delta
    }

    pub fn enter(&mut self, state: RolloverState) {
        self.state = state;
    }

    /// Moves to `Done` and writes the summary message.
    pub fn finish(&mut self) {
        self.state = RolloverState::Done {
            success: self.success,
        };

        let notes: Vec<String> = self.steps.iter().map(StepRecord::note).collect();
        let range = self
            .boundary
            .map_or_else(|| "unresolved".to_string(), |b| b.to_string());
        let status = if self.success { "done" } else { "failed" };
        self.message = format!("{} {range} {status}: {}", self.source, notes.join("; "));
    }

    pub fn counters(&self) -> ItemCounters {
        ItemCounters {
            processed: self.items_processed,
            ok: self.items_ok,
            error: self.items_error,
            warning: self.items_warning,
        }
    }

    pub fn outcome_of(&self, step: RolloverStep) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|record| record.step == step)
            .map(|record| &record.outcome)
    }

    /// Rows moved by a migration phase, if it completed.
    pub fn migrated_rows(&self, phase: MigrationPhase) -> Option<u64> {
        match self.outcome_of(RolloverStep::Migrate(phase)) {
            Some(StepOutcome::Completed { rows, .. }) => Some(*rows),
            _ => None,
        }
    }
}

impl StepRecord {
    fn note(&self) -> String {
        match &self.outcome {
            StepOutcome::Completed { rows, chunks } => match self.step {
                RolloverStep::Migrate(_) => {
                    format!("{} moved {rows} row(s) in {chunks} chunk(s)", self.step)
                }
                _ => format!("{} ok", self.step),
            },
            StepOutcome::Warning { message } => format!("{} warning: {message}", self.step),
            StepOutcome::Failed { message, rows: 0 } => {
                format!("{} failed: {message}", self.step)
            }
            StepOutcome::Failed { message, rows } => {
                format!("{} failed after {rows} row(s): {message}", self.step)
            }
        }
    }
}
