//! One rollover cycle per partition source.
//!
//! Boundary resolution, migration pass A, partition creation, migration
//! pass B, in that order, sequentially over the selected sources.

pub mod actor;
pub mod coordinator;
pub mod creator;
pub mod executor;
pub mod resolver;

pub use actor::{RolloverActorHandle, RolloverRun, spawn};
pub use coordinator::{PartitionRunCoordinator, RolloverSettings};
pub use creator::{CREATION_TEMPLATE_SLOTS, CreationOutcome, PartitionCreator};
pub use executor::{ChunkProgress, ChunkedExecutor, ChunkedUpdate, SqlChunkedExecutor};
pub use resolver::BoundaryResolver;
