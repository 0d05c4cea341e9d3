//! SQLite stand-in for the billing database.
//! Production runs against Postgres, where the fact tables, the partition log
//! and `create_new_partition` are owned by the database itself.

/// SQLite schema includes:
/// - the three default-partition fact tables (EDR, WO, RT)
/// - `partition_log` (one row per created partition)
/// - `partition_registry` (unique partition names, the "already exists" signal)
/// - `partition_period` (per-alias range length in months, one month when absent)
/// - a trigger that logs each registered partition for its alias's period
pub const SQLITE_DEV_SCHEMA: &str = r#"
-- ---------------------------------------------------------------------------
-- Fact tables (default partitions)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS rating_edr_other_default (
    id INTEGER PRIMARY KEY NOT NULL,
    status TEXT NOT NULL,
    event_date TEXT NOT NULL, -- yyyy-MM-dd[ HH:mm:ss]
    partition_id INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS billing_wallet_operation_other_default (
    id INTEGER PRIMARY KEY NOT NULL,
    status TEXT NOT NULL,
    operation_date TEXT NOT NULL,
    partition_id INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS billing_rated_transaction_other_default (
    id INTEGER PRIMARY KEY NOT NULL,
    status TEXT NOT NULL,
    usage_date TEXT NOT NULL,
    partition_id INTEGER NOT NULL DEFAULT 0
);

-- ---------------------------------------------------------------------------
-- Partition bookkeeping
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS partition_log (
    id INTEGER PRIMARY KEY NOT NULL,
    alias TEXT NOT NULL,
    from_date TEXT NOT NULL, -- yyyy-MM-dd
    to_date TEXT NOT NULL, -- yyyy-MM-dd
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_partition_log_alias ON partition_log(alias);

CREATE TABLE IF NOT EXISTS partition_registry (
    id INTEGER PRIMARY KEY NOT NULL,
    alias TEXT NOT NULL,
    source_table TEXT NOT NULL,
    name TEXT NOT NULL UNIQUE,
    boundary TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS partition_period (
    alias TEXT PRIMARY KEY NOT NULL,
    months INTEGER NOT NULL
);

CREATE TRIGGER IF NOT EXISTS partition_registry_log
AFTER INSERT ON partition_registry
BEGIN
    INSERT INTO partition_log (alias, from_date, to_date)
    VALUES (
        NEW.alias,
        NEW.boundary,
        date(
            NEW.boundary,
            '+' || COALESCE((SELECT months FROM partition_period WHERE alias = NEW.alias), 1) || ' months'
        )
    );
END;
"#;

/// Creation statement matching [`SQLITE_DEV_SCHEMA`].
///
/// The template only carries the lower bound; the logged upper bound comes
/// from `partition_period`, filled by `SqlPartitionStore::register_dev_periods`.
pub const SQLITE_DEV_CREATION_TEMPLATE: &str = "INSERT INTO partition_registry (alias, source_table, name, boundary) VALUES ('%s', '%s', '%s', '%s') RETURNING id";
