mod common;

use common::{FakeStore, RecordingExecutor, SlowExecutor, coordinator, date};
use partition_rollover::error::RolloverError;
use partition_rollover::rollover;
use partition_rollover_core::{EntityKind, OperationSelector, PartitionSourceRegistry};
use std::sync::Arc;
use std::time::Duration;

fn store() -> FakeStore {
    FakeStore::new()
        .with_log("edr", date(2024, 1, 1), date(2024, 2, 1))
        .with_log("wo", date(2024, 1, 1), date(2024, 2, 1))
        .with_log("rt", date(2024, 1, 1), date(2024, 2, 1))
}

#[tokio::test]
async fn actor_run_returns_job_and_results() {
    let executor = Arc::new(RecordingExecutor::new(1));
    let coordinator = coordinator(
        PartitionSourceRegistry::with_defaults(),
        Arc::new(store()),
        executor,
    );
    let handle = rollover::spawn(Arc::new(coordinator)).await.expect("spawn");

    let run = handle
        .run(OperationSelector::Only(EntityKind::WalletOperation))
        .await
        .expect("run");

    assert!(run.all_succeeded());
    assert_eq!(run.results.len(), 1);
    assert_eq!(run.results[0].source, "wo");
    assert_eq!(run.job.nb_items_to_process, 2);
    assert_eq!(run.job.report.last(), Some(&run.results[0].message));

    handle.stop();
}

#[tokio::test]
async fn runs_through_the_actor_never_overlap() {
    let executor = Arc::new(SlowExecutor::new(Duration::from_millis(20)));
    let coordinator = coordinator(
        PartitionSourceRegistry::with_defaults(),
        Arc::new(store()),
        executor.clone(),
    );
    let handle = rollover::spawn(Arc::new(coordinator)).await.expect("spawn");

    let (first, second) = tokio::join!(
        handle.run(OperationSelector::All),
        handle.run(OperationSelector::All)
    );

    let first = first.expect("first run");
    let second = second.expect("second run");
    assert_eq!(first.results.len(), 3);
    assert_eq!(second.results.len(), 3);
    assert_eq!(executor.max_in_flight(), 1);

    handle.stop();
}

#[tokio::test]
async fn unreachable_store_still_returns_the_job() {
    let store = store()
        .unreachable_for("edr")
        .unreachable_for("wo")
        .unreachable_for("rt");
    let coordinator = coordinator(
        PartitionSourceRegistry::with_defaults(),
        Arc::new(store),
        Arc::new(RecordingExecutor::new(1)),
    );
    let handle = rollover::spawn(Arc::new(coordinator)).await.expect("spawn");

    let run = handle.run(OperationSelector::All).await.expect("actor reachable");

    assert!(matches!(
        run.failure,
        Some(RolloverError::StoreUnavailable { sources: 3 })
    ));
    assert!(!run.all_succeeded());
    assert!(run.results.is_empty());
    assert_eq!(run.job.errors.len(), 3);
    assert_eq!(run.job.nb_items_error, 3);
    assert!(run.job.errors.iter().any(|line| line.starts_with("rt: ")));

    handle.stop();
}
