use chrono::NaiveDateTime;
use partition_rollover_core::{PartitionLogEntry, PlanError, parse_store_date};
use serde::{Deserialize, Serialize};

/// Latest log range as text, exactly as the log query returns it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LogRangeRow {
    pub range_from: Option<String>,
    pub range_to: Option<String>,
    pub created_at: Option<String>,
}

impl LogRangeRow {
    /// `None` when the store has no entry for the alias (aggregates came back NULL).
    pub fn into_entry(self, alias: &str) -> Result<Option<PartitionLogEntry>, PlanError> {
        let (Some(from), Some(to)) = (self.range_from, self.range_to) else {
            return Ok(None);
        };

        let created_at = self.created_at.as_deref().and_then(parse_store_timestamp);

        Ok(Some(PartitionLogEntry {
            alias: alias.to_string(),
            range_from: parse_store_date(&from)?,
            range_to: parse_store_date(&to)?,
            created_at,
        }))
    }
}

fn parse_store_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn null_aggregates_mean_no_entry() {
        let row = LogRangeRow::default();
        assert_eq!(row.into_entry("rt").unwrap(), None);
    }

    #[test]
    fn text_dates_are_parsed() {
        let row = LogRangeRow {
            range_from: Some("2024-01-01".to_string()),
            range_to: Some("2024-02-01 00:00:00".to_string()),
            created_at: Some("2024-01-31 23:59:58.123456".to_string()),
        };
        let entry = row.into_entry("rt").unwrap().unwrap();
        assert_eq!(entry.alias, "rt");
        assert_eq!(entry.range_to, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert!(entry.created_at.is_some());
    }

    #[test]
    fn garbage_dates_are_errors() {
        let row = LogRangeRow {
            range_from: Some("yesterday".to_string()),
            range_to: Some("2024-02-01".to_string()),
            created_at: None,
        };
        assert!(row.into_entry("rt").is_err());
    }
}
