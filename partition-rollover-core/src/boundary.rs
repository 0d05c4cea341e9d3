use crate::error::PlanError;
use crate::source::PartitionSource;
use chrono::{Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date rendering used inside statement text.
pub const SQL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Suffix appended to the source table to name a partition.
pub const PARTITION_SUFFIX_FORMAT: &str = "%Y%m";

/// Latest range recorded by the store for one alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionLogEntry {
    pub alias: String,
    pub range_from: NaiveDate,
    pub range_to: NaiveDate,
    pub created_at: Option<NaiveDateTime>,
}

/// Half-open date range `[from, to)` of one partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionBoundary {
    from: NaiveDate,
    to: NaiveDate,
}

impl PartitionBoundary {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, PlanError> {
        if from > to {
            return Err(PlanError::InvertedBoundary { from, to });
        }
        Ok(Self { from, to })
    }

    /// The range starting at `from` and spanning `months` calendar months.
    pub fn spanning(from: NaiveDate, months: u32) -> Result<Self, PlanError> {
        let to = from
            .checked_add_months(Months::new(months))
            .ok_or(PlanError::DateOverflow { from, months })?;
        Ok(Self { from, to })
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }

    pub fn from_sql(&self) -> String {
        self.from.format(SQL_DATE_FORMAT).to_string()
    }

    pub fn to_sql(&self) -> String {
        self.to.format(SQL_DATE_FORMAT).to_string()
    }

    /// `{table}_{yyyyMM(from)}`.
    pub fn partition_name(&self, table: &str) -> String {
        format!("{table}_{}", self.from.format(PARTITION_SUFFIX_FORMAT))
    }
}

impl fmt::Display for PartitionBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.from_sql(), self.to_sql())
    }
}

/// Next partition for `source`: it starts where the latest logged partition
/// ended. Without any log entry the configured seed is the lower bound.
pub fn next_boundary(
    latest: Option<&PartitionLogEntry>,
    source: &PartitionSource,
) -> Result<PartitionBoundary, PlanError> {
    let from = match latest {
        Some(entry) => entry.range_to,
        None => source.seed_boundary.ok_or_else(|| PlanError::MissingSeed {
            alias: source.alias.to_string(),
        })?,
    };
    PartitionBoundary::spanning(from, source.rollover_period_months)
}

/// Accepts `yyyy-MM-dd` as well as timestamp text that starts with it.
pub fn parse_store_date(raw: &str) -> Result<NaiveDate, PlanError> {
    let trimmed = raw.trim();
    let head = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(head, SQL_DATE_FORMAT)
        .map_err(|_| PlanError::InvalidDate(raw.to_string()))
}
