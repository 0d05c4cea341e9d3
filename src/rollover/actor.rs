use super::coordinator::PartitionRunCoordinator;
use crate::error::RolloverError;
use crate::job::{JobExecutionResult, PartitionRunResult};
use partition_rollover_core::OperationSelector;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Job result plus per-source outcomes of one run.
///
/// `job` is kept even when the run itself failed, so the error lines and
/// counters recorded before the failure reach the caller.
#[derive(Debug, Serialize)]
pub struct RolloverRun {
    pub job: JobExecutionResult,
    pub results: Vec<PartitionRunResult>,
    /// Run-level failure (unknown selector, store unreachable for every source).
    #[serde(skip)]
    pub failure: Option<RolloverError>,
}

impl RolloverRun {
    pub fn all_succeeded(&self) -> bool {
        self.failure.is_none() && self.results.iter().all(|r| r.success)
    }
}

#[derive(Debug)]
pub enum RolloverActorMessage {
    /// Run one rollover for the selected sources.
    Run(OperationSelector, RpcReplyPort<RolloverRun>),
}

/// Runs queue in the actor's mailbox, so two never overlap in this process.
#[derive(Clone)]
pub struct RolloverActorHandle {
    actor: ActorRef<RolloverActorMessage>,
}

impl RolloverActorHandle {
    /// `Err` only when the actor could not be reached; run failures come back in
    /// [`RolloverRun::failure`].
    pub async fn run(&self, selector: OperationSelector) -> Result<RolloverRun, RolloverError> {
        ractor::call!(self.actor, RolloverActorMessage::Run, selector)
            .map_err(|e| RolloverError::RactorError(format!("RolloverActor Run RPC failed: {e}")))
    }

    pub fn stop(&self) {
        self.actor.stop(None);
    }
}

struct RolloverActorState {
    coordinator: Arc<PartitionRunCoordinator>,
}

struct RolloverActor;

#[ractor::async_trait]
impl Actor for RolloverActor {
    type Msg = RolloverActorMessage;
    type State = RolloverActorState;
    type Arguments = Arc<PartitionRunCoordinator>;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        coordinator: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        info!(
            sources = coordinator.registry().len(),
            "RolloverActor initialized"
        );
        Ok(RolloverActorState { coordinator })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            RolloverActorMessage::Run(selector, reply) => {
                let mut job = JobExecutionResult::new();
                let run = match state.coordinator.run(selector, &mut job).await {
                    Ok(results) => RolloverRun {
                        job,
                        results,
                        failure: None,
                    },
                    Err(e) => RolloverRun {
                        job,
                        results: Vec::new(),
                        failure: Some(e),
                    },
                };
                let _ = reply.send(run);
            }
        }
        Ok(())
    }
}

pub async fn spawn(
    coordinator: Arc<PartitionRunCoordinator>,
) -> Result<RolloverActorHandle, RolloverError> {
    // Unnamed: the registry would refuse a second instance under the same name.
    let (actor, _jh) = Actor::spawn(None, RolloverActor, coordinator)
        .await
        .map_err(|e| RolloverError::RactorError(format!("failed to spawn RolloverActor: {e}")))?;

    Ok(RolloverActorHandle { actor })
}
