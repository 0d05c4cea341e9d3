pub mod config;
pub mod db;
pub mod error;
pub mod job;
pub mod rollover;
pub mod utils;

pub use config::Config;
pub use db::{PartitionStore, SqlPartitionStore};
pub use error::RolloverError;
pub use job::{JobExecutionResult, JobReporter, PartitionRunResult};
pub use rollover::{PartitionRunCoordinator, RolloverActorHandle, RolloverRun};
