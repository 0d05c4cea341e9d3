use crate::boundary::PartitionBoundary;
use crate::source::PartitionSource;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rows in this status are still being rated/billed and must stay where they are.
pub const OPEN_STATUS: &str = "OPEN";

/// Target of the pre-creation pass.
///
/// Store-side meaning of this id is not confirmed; it is kept as a distinct,
/// configurable value so the two-pass shape survives unchanged.
pub const PROVISIONAL_PARTITION_ID: i64 = 1;

/// Target of the post-creation pass ("current" slot).
pub const CURRENT_PARTITION_ID: i64 = 0;

/// Partition ids used by the two migration passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionTargets {
    pub provisional: i64,
    pub current: i64,
}

impl Default for PartitionTargets {
    fn default() -> Self {
        Self {
            provisional: PROVISIONAL_PARTITION_ID,
            current: CURRENT_PARTITION_ID,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MigrationPhase {
    /// Phase A, before the partition-creation call.
    PreCreate,
    /// Phase B, after the partition-creation call.
    PostCreate,
}

impl MigrationPhase {
    pub fn target(&self, targets: &PartitionTargets) -> i64 {
        match self {
            MigrationPhase::PreCreate => targets.provisional,
            MigrationPhase::PostCreate => targets.current,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MigrationPhase::PreCreate => "phase A",
            MigrationPhase::PostCreate => "phase B",
        }
    }
}

impl fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationQueryPair {
    pub bounding_query: String,
    pub mutating_query: String,
    pub partition_target_id: i64,
}

/// Builds the statements that move finalized rows of one date range.
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationPlanner;

impl MigrationPlanner {
    pub fn plan(
        &self,
        source: &PartitionSource,
        boundary: &PartitionBoundary,
        partition_target_id: i64,
    ) -> MigrationQueryPair {
        let filter = Self::eligibility_filter(source, boundary);
        let table = &source.table;

        MigrationQueryPair {
            bounding_query: format!("SELECT min(id), max(id) FROM {table} WHERE {filter}"),
            mutating_query: format!(
                "UPDATE {table} SET partition_id = {partition_target_id} WHERE {filter}"
            ),
            partition_target_id,
        }
    }

    pub fn plan_phase(
        &self,
        source: &PartitionSource,
        boundary: &PartitionBoundary,
        phase: MigrationPhase,
        targets: &PartitionTargets,
    ) -> MigrationQueryPair {
        self.plan(source, boundary, phase.target(targets))
    }

    fn eligibility_filter(source: &PartitionSource, boundary: &PartitionBoundary) -> String {
        let column = &source.date_column;
        format!(
            "status <> '{OPEN_STATUS}' AND {column} >= '{from}' AND {column} < '{to}'",
            from = boundary.from_sql(),
            to = boundary.to_sql(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::EntityKind;
    use chrono::NaiveDate;

    fn feb_2024() -> PartitionBoundary {
        PartitionBoundary::spanning(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), 1).unwrap()
    }

    #[test]
    fn post_create_update_matches_expected_text() {
        let source = EntityKind::RatedTransaction.default_source();
        let pair = MigrationPlanner.plan_phase(
            &source,
            &feb_2024(),
            MigrationPhase::PostCreate,
            &PartitionTargets::default(),
        );

        assert_eq!(
            pair.mutating_query,
            "UPDATE billing_rated_transaction_other_default SET partition_id = 0 WHERE status <> 'OPEN' AND usage_date >= '2024-02-01' AND usage_date < '2024-03-01'"
        );
        assert_eq!(
            pair.bounding_query,
            "SELECT min(id), max(id) FROM billing_rated_transaction_other_default WHERE status <> 'OPEN' AND usage_date >= '2024-02-01' AND usage_date < '2024-03-01'"
        );
        assert_eq!(pair.partition_target_id, 0);
    }

    #[test]
    fn pre_create_targets_provisional_id() {
        let source = EntityKind::WalletOperation.default_source();
        let pair = MigrationPlanner.plan_phase(
            &source,
            &feb_2024(),
            MigrationPhase::PreCreate,
            &PartitionTargets::default(),
        );
        assert_eq!(pair.partition_target_id, 1);
        assert!(
            pair.mutating_query
                .starts_with("UPDATE billing_wallet_operation_other_default SET partition_id = 1 WHERE")
        );
    }

    #[test]
    fn open_rows_are_excluded_for_every_range() {
        let day = NaiveDate::from_ymd_opt(2024, 7, 15).unwrap();
        let ranges = [
            PartitionBoundary::new(day, day).unwrap(),
            PartitionBoundary::spanning(day, 1).unwrap(),
            PartitionBoundary::spanning(day, 12).unwrap(),
        ];

        for kind in EntityKind::ALL {
            let source = kind.default_source();
            for range in &ranges {
                let pair = MigrationPlanner.plan(&source, range, 7);
                let where_clause = pair.mutating_query.split(" WHERE ").nth(1).unwrap();
                assert!(where_clause.starts_with("status <> 'OPEN' AND "));
                assert!(pair.bounding_query.contains("WHERE status <> 'OPEN' AND "));
            }
        }
    }

    #[test]
    fn empty_range_is_planned_like_any_other() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let source = EntityKind::UsageDetail.default_source();
        let pair = MigrationPlanner.plan(&source, &PartitionBoundary::new(day, day).unwrap(), 0);
        assert_eq!(
            pair.mutating_query,
            "UPDATE rating_edr_other_default SET partition_id = 0 WHERE status <> 'OPEN' AND event_date >= '2024-02-01' AND event_date < '2024-02-01'"
        );
    }

    #[test]
    fn custom_targets_are_honoured() {
        let targets = PartitionTargets {
            provisional: 9,
            current: 3,
        };
        assert_eq!(MigrationPhase::PreCreate.target(&targets), 9);
        assert_eq!(MigrationPhase::PostCreate.target(&targets), 3);
    }
}
