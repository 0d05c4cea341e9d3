use mimalloc::MiMalloc;
use partition_rollover::config::Config;
use partition_rollover::db::SqlPartitionStore;
use partition_rollover::rollover::{self, PartitionRunCoordinator, RolloverActorHandle};
use partition_rollover::utils::logging::{init_tracing, with_pretty_json_debug};
use partition_rollover_core::OperationSelector;
use std::sync::Arc;
use tokio::signal;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;
    init_tracing(&cfg.basic.loglevel);

    info!(
        loglevel = %cfg.basic.loglevel,
        operation = %cfg.rollover.operation,
        interval_secs = cfg.rollover.interval_secs,
        run_once = cfg.rollover.run_once,
        chunk_size = cfg.rollover.chunk_size,
        sources = cfg.rollover.sources.len(),
        "configuration loaded"
    );

    let store = SqlPartitionStore::connect(&cfg.basic, cfg.rollover.log_query.clone()).await?;
    if cfg.basic.apply_dev_schema {
        store.register_dev_periods(&cfg.registry()?).await?;
    }
    let coordinator = PartitionRunCoordinator::from_config(&cfg, Arc::new(store))?;
    let handle = rollover::spawn(Arc::new(coordinator)).await?;

    if cfg.rollover.run_once {
        let ok = run_and_log(&handle, cfg.rollover.operation).await;
        handle.stop();
        if !ok {
            return Err("rollover finished with failures".into());
        }
        return Ok(());
    }

    let mut ticker = interval(cfg.rollover.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_and_log(&handle, cfg.rollover.operation).await;
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping scheduler.");
                break;
            }
        }
    }

    handle.stop();
    info!("Rollover scheduler has shut down gracefully.");
    Ok(())
}

/// Returns whether every source rolled over successfully.
async fn run_and_log(handle: &RolloverActorHandle, operation: OperationSelector) -> bool {
    match handle.run(operation).await {
        Ok(run) => {
            with_pretty_json_debug(&run, |pretty| debug!(run = %pretty, "rollover run detail"));
            for result in &run.results {
                if result.success {
                    info!(summary = %result.message, "source finished");
                } else {
                    warn!(summary = %result.message, "source failed");
                }
            }
            if let Some(e) = &run.failure {
                error!(
                    error = %e,
                    errors = run.job.errors.len(),
                    items_error = run.job.nb_items_error,
                    "rollover run failed"
                );
                for line in &run.job.errors {
                    warn!(error = %line, "source error before run failure");
                }
            }
            run.all_succeeded()
        }
        Err(e) => {
            error!(error = %e, "rollover actor unreachable");
            false
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
