#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Months, NaiveDate};
use partition_rollover::config::DEFAULT_CREATION_TEMPLATE;
use partition_rollover::db::PartitionStore;
use partition_rollover::error::RolloverError;
use partition_rollover::job::JobReporter;
use partition_rollover::rollover::{
    ChunkProgress, ChunkedExecutor, ChunkedUpdate, PartitionRunCoordinator, RolloverSettings,
};
use partition_rollover_core::{
    IdBounds, PartitionLogEntry, PartitionSourceRegistry, StatementTemplate,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[derive(Default)]
struct FakeState {
    log: HashMap<String, Vec<(NaiveDate, NaiveDate)>>,
    created: HashSet<String>,
    creation_calls: Vec<String>,
    bounding_queries: Vec<String>,
    mutations: Vec<String>,
}

/// In-memory store: a partition log per alias plus a set of created partition names.
///
/// Creation statements are read back by their quoted arguments, so any
/// template of the shape `...('%s', '%s', '%s', '%s')...` works.
pub struct FakeStore {
    state: Mutex<FakeState>,
    unreachable: HashSet<String>,
    append_log: bool,
    id_bounds: Option<IdBounds>,
    rows_per_chunk: u64,
    failing_execute: Option<usize>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            unreachable: HashSet::new(),
            append_log: true,
            id_bounds: None,
            rows_per_chunk: 0,
            failing_execute: None,
        }
    }

    pub fn with_log(self, alias: &str, from: NaiveDate, to: NaiveDate) -> Self {
        self.state
            .lock()
            .unwrap()
            .log
            .entry(alias.to_string())
            .or_default()
            .push((from, to));
        self
    }

    /// Log lookups for `alias` fail like a dropped connection.
    pub fn unreachable_for(mut self, alias: &str) -> Self {
        self.unreachable.insert(alias.to_string());
        self
    }

    /// Creation succeeds but the log does not move, as when the store-side
    /// procedure forgets to record the new range.
    pub fn without_log_append(mut self) -> Self {
        self.append_log = false;
        self
    }

    pub fn with_id_bounds(mut self, min: i64, max: i64, rows_per_chunk: u64) -> Self {
        self.id_bounds = Some(IdBounds { min, max });
        self.rows_per_chunk = rows_per_chunk;
        self
    }

    /// The `nth` mutating statement (1-based, counted over the store's lifetime) is rejected.
    pub fn failing_execute_at(mut self, nth: usize) -> Self {
        self.failing_execute = Some(nth);
        self
    }

    pub fn created(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().unwrap().created.iter().cloned().collect();
        names.sort();
        names
    }

    pub fn creation_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().creation_calls.clone()
    }

    pub fn bounding_queries(&self) -> Vec<String> {
        self.state.lock().unwrap().bounding_queries.clone()
    }

    pub fn mutations(&self) -> Vec<String> {
        self.state.lock().unwrap().mutations.clone()
    }

    pub fn latest(&self, alias: &str) -> Option<(NaiveDate, NaiveDate)> {
        let state = self.state.lock().unwrap();
        state
            .log
            .get(alias)
            .and_then(|ranges| ranges.iter().max_by_key(|(_, to)| *to).copied())
    }
}

fn quoted_args(statement: &str) -> Vec<String> {
    statement
        .split('\'')
        .skip(1)
        .step_by(2)
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl PartitionStore for FakeStore {
    async fn latest_log_entry(
        &self,
        alias: &str,
    ) -> Result<Option<PartitionLogEntry>, RolloverError> {
        if self.unreachable.contains(alias) {
            return Err(RolloverError::DatabaseError(sqlx::Error::PoolTimedOut));
        }
        Ok(self.latest(alias).map(|(from, to)| PartitionLogEntry {
            alias: alias.to_string(),
            range_from: from,
            range_to: to,
            created_at: None,
        }))
    }

    async fn call_scalar(&self, statement: &str) -> Result<(), RolloverError> {
        let mut state = self.state.lock().unwrap();
        state.creation_calls.push(statement.to_string());

        let args = quoted_args(statement);
        let [alias, _table, name, start] = args.as_slice() else {
            return Err(RolloverError::UnexpectedError(format!(
                "unexpected creation statement: {statement}"
            )));
        };

        if state.created.contains(name) {
            return Err(RolloverError::StoreNative {
                message: format!("relation \"{name}\" already exists"),
                code: Some("42P07".to_string()),
            });
        }
        state.created.insert(name.clone());

        if self.append_log {
            let from = NaiveDate::parse_from_str(start, "%Y-%m-%d")
                .map_err(|e| RolloverError::UnexpectedError(e.to_string()))?;
            let to = from
                .checked_add_months(Months::new(1))
                .ok_or_else(|| RolloverError::UnexpectedError("date overflow".to_string()))?;
            state.log.entry(alias.clone()).or_default().push((from, to));
        }
        Ok(())
    }

    async fn fetch_id_bounds(&self, query: &str) -> Result<Option<IdBounds>, RolloverError> {
        self.state
            .lock()
            .unwrap()
            .bounding_queries
            .push(query.to_string());
        Ok(self.id_bounds)
    }

    async fn execute(&self, statement: &str) -> Result<u64, RolloverError> {
        let mut state = self.state.lock().unwrap();
        state.mutations.push(statement.to_string());
        if self.failing_execute == Some(state.mutations.len()) {
            return Err(RolloverError::StoreNative {
                message: "canceling statement due to lock timeout".to_string(),
                code: Some("55P03".to_string()),
            });
        }
        Ok(self.rows_per_chunk)
    }
}

/// Executor that records every update and reports a fixed row count.
pub struct RecordingExecutor {
    updates: Mutex<Vec<ChunkedUpdate>>,
    failing_labels: HashSet<String>,
    rows: u64,
}

impl RecordingExecutor {
    pub fn new(rows: u64) -> Self {
        Self {
            updates: Mutex::new(Vec::new()),
            failing_labels: HashSet::new(),
            rows,
        }
    }

    /// Updates labelled `label` (e.g. `rt phase A`) fail.
    pub fn failing(mut self, label: &str) -> Self {
        self.failing_labels.insert(label.to_string());
        self
    }

    pub fn updates(&self) -> Vec<ChunkedUpdate> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChunkedExecutor for RecordingExecutor {
    async fn execute(
        &self,
        update: &ChunkedUpdate,
        reporter: &mut dyn JobReporter,
    ) -> Result<ChunkProgress, RolloverError> {
        self.updates.lock().unwrap().push(update.clone());
        if self.failing_labels.contains(&update.label) {
            return Err(RolloverError::Executor(format!(
                "{}: lock wait timeout",
                update.label
            )));
        }
        reporter.add_report(&format!("{}: {} row(s)", update.label, self.rows));
        Ok(ChunkProgress {
            chunks: u64::from(self.rows > 0),
            rows: self.rows,
        })
    }
}

/// Executor that sleeps inside every update and tracks how many overlap.
pub struct SlowExecutor {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Duration,
}

impl SlowExecutor {
    pub fn new(delay: Duration) -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            delay,
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChunkedExecutor for SlowExecutor {
    async fn execute(
        &self,
        _update: &ChunkedUpdate,
        _reporter: &mut dyn JobReporter,
    ) -> Result<ChunkProgress, RolloverError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(ChunkProgress::default())
    }
}

pub fn default_template() -> StatementTemplate {
    StatementTemplate::parse(DEFAULT_CREATION_TEMPLATE).expect("default template parses")
}

pub fn coordinator(
    registry: PartitionSourceRegistry,
    store: Arc<FakeStore>,
    executor: Arc<dyn ChunkedExecutor>,
) -> PartitionRunCoordinator {
    PartitionRunCoordinator::new(
        registry,
        store,
        executor,
        default_template(),
        RolloverSettings::default(),
    )
    .expect("coordinator builds")
}
