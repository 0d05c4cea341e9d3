use partition_rollover_core::PlanError;
use thiserror::Error as ThisError;

use super::IsRetryable;

#[derive(Debug, ThisError)]
pub enum RolloverError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    /// The store received the statement and rejected it.
    #[error("Store rejected statement: {message}")]
    StoreNative {
        message: String,
        code: Option<String>,
    },

    #[error("Chunked executor error: {0}")]
    Executor(String),

    /// A chunk failed after earlier chunks were already committed.
    #[error("Stopped after {rows} row(s) in {chunks} chunk(s): {source}")]
    PartialMigration {
        chunks: u64,
        rows: u64,
        source: Box<RolloverError>,
    },

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("Store unreachable for all {sources} selected source(s)")]
    StoreUnavailable { sources: usize },

    #[error("Unexpected error: {0}")]
    UnexpectedError(String),
}

impl RolloverError {
    /// Raw message of a store-side rejection, if this is one.
    pub fn native_message(&self) -> Option<&str> {
        match self {
            RolloverError::StoreNative { message, .. } => Some(message.as_str()),
            RolloverError::PartialMigration { source, .. } => source.native_message(),
            _ => None,
        }
    }

    /// Rows committed before the failure; zero unless this is a partial migration.
    pub fn committed_rows(&self) -> u64 {
        match self {
            RolloverError::PartialMigration { rows, .. } => *rows,
            _ => 0,
        }
    }

    /// Text recorded in job reports: the store's own words when available.
    pub fn report_message(&self) -> String {
        self.native_message()
            .map_or_else(|| self.to_string(), str::to_string)
    }
}

impl From<sqlx::Error> for RolloverError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(db) => RolloverError::StoreNative {
                message: db.message().to_string(),
                code: db.code().map(|c| c.into_owned()),
            },
            other => RolloverError::DatabaseError(other),
        }
    }
}

impl From<figment::Error> for RolloverError {
    fn from(e: figment::Error) -> Self {
        RolloverError::Config(e.to_string())
    }
}

impl IsRetryable for RolloverError {
    fn is_retryable(&self) -> bool {
        match self {
            RolloverError::DatabaseError(e) => matches!(
                e,
                sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            ),
            RolloverError::StoreUnavailable { .. } => true,
            RolloverError::PartialMigration { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}
