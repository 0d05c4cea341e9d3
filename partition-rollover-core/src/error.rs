use chrono::NaiveDate;
use thiserror::Error as ThisError;

/// Validation and planning failures. None of these touch the store.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum PlanError {
    #[error("Invalid SQL identifier for {what}: {value:?}")]
    InvalidIdentifier { what: &'static str, value: String },

    #[error("Template arity mismatch: expected {expected}, got {found}")]
    TemplateArity { expected: usize, found: usize },

    #[error("Unsupported template directive {directive:?} at byte {position}")]
    UnsupportedDirective { directive: String, position: usize },

    #[error("Cannot add {months} month(s) to {from}")]
    DateOverflow { from: NaiveDate, months: u32 },

    #[error("Boundary is inverted: {from} > {to}")]
    InvertedBoundary { from: NaiveDate, to: NaiveDate },

    #[error("Unparseable store date: {0:?}")]
    InvalidDate(String),

    #[error("No partition log entry and no seed boundary for alias {alias}")]
    MissingSeed { alias: String },

    #[error("Rollover period must be at least one month for alias {alias}")]
    ZeroPeriod { alias: String },

    #[error("Alias registered twice: {0}")]
    DuplicateAlias(String),

    #[error("Entity kind registered twice: {0}")]
    DuplicateKind(String),

    #[error("Unknown entity kind: {0:?}")]
    UnknownEntityKind(String),

    #[error("Entity kind {0} is not registered")]
    UnregisteredKind(String),

    #[error("Chunk size must be greater than zero")]
    ZeroChunkSize,
}
