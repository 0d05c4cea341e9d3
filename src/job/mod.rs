//! Job-framework side of a rollover: the reporter seam and per-source results.

pub mod report;
pub mod result;

pub use report::{JobExecutionResult, JobReporter};
pub use result::{
    ItemCounters, PartitionRunResult, RolloverState, RolloverStep, StepOutcome, StepRecord,
};
