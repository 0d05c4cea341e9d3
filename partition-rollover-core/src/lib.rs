pub mod boundary;
pub mod chunk;
pub mod error;
pub mod planner;
pub mod source;
pub mod template;

pub use boundary::{PartitionBoundary, PartitionLogEntry, next_boundary, parse_store_date};
pub use chunk::{IdBounds, IdWindow};
pub use error::PlanError;
pub use planner::{
    CURRENT_PARTITION_ID, MigrationPhase, MigrationPlanner, MigrationQueryPair, OPEN_STATUS,
    PROVISIONAL_PARTITION_ID, PartitionTargets,
};
pub use source::{EntityKind, OperationSelector, PartitionSource, PartitionSourceRegistry};
pub use template::{SqlIdent, StatementTemplate};
