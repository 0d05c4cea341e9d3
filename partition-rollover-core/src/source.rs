use crate::error::PlanError;
use crate::template::SqlIdent;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt, str::FromStr};

/// Fact-table families that are partitioned by date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    #[serde(rename = "EDR", alias = "edr", alias = "usage_detail")]
    UsageDetail,
    #[serde(rename = "WO", alias = "wo", alias = "wallet_operation")]
    WalletOperation,
    #[serde(rename = "RT", alias = "rt", alias = "rated_transaction")]
    RatedTransaction,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [
        EntityKind::UsageDetail,
        EntityKind::WalletOperation,
        EntityKind::RatedTransaction,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            EntityKind::UsageDetail => "EDR",
            EntityKind::WalletOperation => "WO",
            EntityKind::RatedTransaction => "RT",
        }
    }

    pub fn snake_name(&self) -> &'static str {
        match self {
            EntityKind::UsageDetail => "usage_detail",
            EntityKind::WalletOperation => "wallet_operation",
            EntityKind::RatedTransaction => "rated_transaction",
        }
    }

    fn default_alias(&self) -> &'static str {
        match self {
            EntityKind::UsageDetail => "edr",
            EntityKind::WalletOperation => "wo",
            EntityKind::RatedTransaction => "rt",
        }
    }

    fn default_table(&self) -> &'static str {
        match self {
            EntityKind::UsageDetail => "rating_edr_other_default",
            EntityKind::WalletOperation => "billing_wallet_operation_other_default",
            EntityKind::RatedTransaction => "billing_rated_transaction_other_default",
        }
    }

    fn default_date_column(&self) -> &'static str {
        match self {
            EntityKind::UsageDetail => "event_date",
            EntityKind::WalletOperation => "operation_date",
            EntityKind::RatedTransaction => "usage_date",
        }
    }

    /// Stock catalog entry for this kind: one-month period, no seed.
    pub fn default_source(&self) -> PartitionSource {
        PartitionSource {
            kind: *self,
            table: SqlIdent(self.default_table().to_string()),
            date_column: SqlIdent(self.default_date_column().to_string()),
            alias: SqlIdent(self.default_alias().to_string()),
            rollover_period_months: 1,
            seed_boundary: None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for EntityKind {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        EntityKind::ALL
            .into_iter()
            .find(|kind| {
                [kind.code(), kind.default_alias(), kind.snake_name()]
                    .iter()
                    .any(|name| name.eq_ignore_ascii_case(needle))
            })
            .ok_or_else(|| PlanError::UnknownEntityKind(s.to_string()))
    }
}

/// Which sources one invocation rolls over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OperationSelector {
    All,
    Only(EntityKind),
}

impl FromStr for OperationSelector {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("ALL") {
            Ok(OperationSelector::All)
        } else {
            s.parse().map(OperationSelector::Only)
        }
    }
}

impl TryFrom<String> for OperationSelector {
    type Error = PlanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OperationSelector> for String {
    fn from(selector: OperationSelector) -> Self {
        selector.to_string()
    }
}

impl fmt::Display for OperationSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationSelector::All => f.write_str("ALL"),
            OperationSelector::Only(kind) => kind.fmt(f),
        }
    }
}

/// One partitioned fact table and how it rolls over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSource {
    pub kind: EntityKind,
    pub table: SqlIdent,
    pub date_column: SqlIdent,
    /// Key into the partition log and first argument of the creation call.
    pub alias: SqlIdent,
    pub rollover_period_months: u32,
    /// Lower bound used when the store has no log entry for `alias` yet.
    #[serde(default)]
    pub seed_boundary: Option<NaiveDate>,
}

/// Read-only catalog of partition sources, in registry order.
#[derive(Debug, Clone)]
pub struct PartitionSourceRegistry {
    sources: Vec<PartitionSource>,
}

impl PartitionSourceRegistry {
    pub fn new(sources: Vec<PartitionSource>) -> Result<Self, PlanError> {
        let mut aliases = HashSet::new();
        let mut kinds = HashSet::new();

        for source in &sources {
            if source.rollover_period_months == 0 {
                return Err(PlanError::ZeroPeriod {
                    alias: source.alias.to_string(),
                });
            }
            if !aliases.insert(source.alias.as_str()) {
                return Err(PlanError::DuplicateAlias(source.alias.to_string()));
            }
            if !kinds.insert(source.kind) {
                return Err(PlanError::DuplicateKind(source.kind.to_string()));
            }
        }

        Ok(Self { sources })
    }

    /// The three billing fact tables with their stock settings.
    pub fn with_defaults() -> Self {
        Self {
            sources: EntityKind::ALL.iter().map(EntityKind::default_source).collect(),
        }
    }

    pub fn get(&self, kind: EntityKind) -> Option<&PartitionSource> {
        self.sources.iter().find(|s| s.kind == kind)
    }

    pub fn by_alias(&self, alias: &str) -> Option<&PartitionSource> {
        self.sources.iter().find(|s| s.alias.as_str() == alias)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PartitionSource> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Sources targeted by `selector`; `All` keeps registry order.
    pub fn select(&self, selector: OperationSelector) -> Result<Vec<&PartitionSource>, PlanError> {
        match selector {
            OperationSelector::All => Ok(self.sources.iter().collect()),
            OperationSelector::Only(kind) => self
                .get(kind)
                .map(|source| vec![source])
                .ok_or_else(|| PlanError::UnregisteredKind(kind.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_kind_parses_codes_aliases_and_names() {
        assert_eq!("RT".parse::<EntityKind>().unwrap(), EntityKind::RatedTransaction);
        assert_eq!("wo".parse::<EntityKind>().unwrap(), EntityKind::WalletOperation);
        assert_eq!(
            " Usage_Detail ".parse::<EntityKind>().unwrap(),
            EntityKind::UsageDetail
        );
        assert!("invoice".parse::<EntityKind>().is_err());
    }

    #[test]
    fn selector_parses_all_case_insensitively() {
        assert_eq!("ALL".parse::<OperationSelector>().unwrap(), OperationSelector::All);
        assert_eq!("all".parse::<OperationSelector>().unwrap(), OperationSelector::All);
        assert_eq!(
            "edr".parse::<OperationSelector>().unwrap(),
            OperationSelector::Only(EntityKind::UsageDetail)
        );
        assert_eq!(OperationSelector::Only(EntityKind::WalletOperation).to_string(), "WO");
    }

    #[test]
    fn defaults_cover_every_kind_in_order() {
        let registry = PartitionSourceRegistry::with_defaults();
        let kinds: Vec<_> = registry.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, EntityKind::ALL.to_vec());

        let rt = registry.by_alias("rt").unwrap();
        assert_eq!(rt.table.as_str(), "billing_rated_transaction_other_default");
        assert_eq!(rt.date_column.as_str(), "usage_date");
    }

    #[test]
    fn duplicate_alias_is_rejected() {
        let mut wo = EntityKind::WalletOperation.default_source();
        wo.alias = SqlIdent::new("rt").unwrap();
        let err = PartitionSourceRegistry::new(vec![
            EntityKind::RatedTransaction.default_source(),
            wo,
        ])
        .unwrap_err();
        assert_eq!(err, PlanError::DuplicateAlias("rt".to_string()));
    }

    #[test]
    fn zero_period_is_rejected() {
        let mut rt = EntityKind::RatedTransaction.default_source();
        rt.rollover_period_months = 0;
        assert!(matches!(
            PartitionSourceRegistry::new(vec![rt]),
            Err(PlanError::ZeroPeriod { .. })
        ));
    }

    #[test]
    fn selecting_an_unregistered_kind_fails() {
        let registry =
            PartitionSourceRegistry::new(vec![EntityKind::RatedTransaction.default_source()])
                .unwrap();
        assert_eq!(registry.select(OperationSelector::All).unwrap().len(), 1);
        assert!(
            registry
                .select(OperationSelector::Only(EntityKind::UsageDetail))
                .is_err()
        );
    }
}
