use super::retry::CallPolicy;
use super::state::{CommandOutcome, ResourceCell};
use crate::auth::AccountId;
use crate::error::{GantryError, RuntimeError};
use crate::runtime::{ResourceInfo, RuntimeAdapter};
use gantry_schema::{LifecycleAction, ResourceState};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug)]
pub enum LifecycleMessage {
    /// Run one command to completion. The mailbox keeps arrival order.
    Execute(
        LifecycleAction,
        AccountId,
        RpcReplyPort<Result<CommandOutcome, GantryError>>,
    ),
}

pub struct LifecycleArgs {
    pub name: String,
    pub runtime: Arc<dyn RuntimeAdapter>,
    pub cell: ResourceCell,
    pub policy: CallPolicy,
}

/// Single worker for one resource name.
pub struct LifecycleActor;

#[ractor::async_trait]
impl Actor for LifecycleActor {
    type Msg = LifecycleMessage;
    type State = LifecycleArgs;
    type Arguments = LifecycleArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        debug!(
            resource = %args.name,
            backend = args.runtime.backend(),
            "LifecycleActor started"
        );
        Ok(args)
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            LifecycleMessage::Execute(action, requester, reply) => {
                let result = execute(state, action, requester).await;
                if reply.send(result).is_err() {
                    debug!(resource = %state.name, "Command requester went away before the reply");
                }
            }
        }
        Ok(())
    }
}

async fn execute(
    state: &LifecycleArgs,
    action: LifecycleAction,
    requester: AccountId,
) -> Result<CommandOutcome, GantryError> {
    let LifecycleArgs {
        name,
        runtime,
        cell,
        policy,
    } = state;
    let name = name.as_str();

    cell.set(ResourceState::Transitioning, None);

    let before = observe(policy, runtime.as_ref(), cell, name).await?;
    let previous = running_state(before);

    let issued = match action {
        LifecycleAction::Start => policy.run("start", name, || runtime.start(name)).await,
        LifecycleAction::Stop => {
            policy
                .for_stop()
                .run("stop", name, || runtime.stop(name))
                .await
        }
    };
    if let Err(e) = issued {
        return Err(record_failure(cell, e));
    }

    let after = observe(policy, runtime.as_ref(), cell, name).await?;
    let observed = running_state(after);
    let snapshot = cell.set(observed, None);
    let changed = before.running != after.running;

    info!(
        %requester,
        resource = name,
        %action,
        %previous,
        state = %observed,
        changed,
        "Lifecycle command executed"
    );

    if observed != action.target_state() {
        return Err(GantryError::Runtime(format!(
            "{name} is {observed} after {action}"
        )));
    }

    Ok(CommandOutcome {
        action,
        previous,
        snapshot,
        changed,
    })
}

/// Query the runtime; an absent resource ends the command as `not_found`.
async fn observe(
    policy: &CallPolicy,
    runtime: &dyn RuntimeAdapter,
    cell: &ResourceCell,
    name: &str,
) -> Result<ResourceInfo, GantryError> {
    let info = policy
        .run("get", name, || runtime.get(name))
        .await
        .map_err(|e| record_failure(cell, e))?;
    if !info.exists {
        cell.set(ResourceState::NotFound, None);
        return Err(RuntimeError::NotFound(name.to_string()).into());
    }
    Ok(info)
}

fn record_failure(cell: &ResourceCell, e: RuntimeError) -> GantryError {
    match &e {
        RuntimeError::NotFound(_) => {
            cell.set(ResourceState::NotFound, None);
        }
        RuntimeError::Unavailable(_) | RuntimeError::Timeout(_) => {
            cell.set(ResourceState::Unknown, Some(e.to_string()));
        }
        RuntimeError::Rejected(_) => {
            cell.set(ResourceState::Error, Some(e.to_string()));
        }
    }
    e.into()
}

pub(super) fn running_state(info: ResourceInfo) -> ResourceState {
    if !info.exists {
        ResourceState::NotFound
    } else if info.running {
        ResourceState::Running
    } else {
        ResourceState::Stopped
    }
}
