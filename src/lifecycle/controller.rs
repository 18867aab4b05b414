use super::actor::{LifecycleActor, LifecycleArgs, LifecycleMessage, running_state};
use super::retry::CallPolicy;
use super::state::{CommandOutcome, ResourceCell};
use crate::auth::AccountId;
use crate::error::GantryError;
use crate::runtime::RuntimeAdapter;
use ahash::AHashMap;
use gantry_schema::{LifecycleAction, ResourceSnapshot, ResourceState};
use ractor::{Actor, ActorRef};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Clone)]
struct ResourceEntry {
    actor: ActorRef<LifecycleMessage>,
    cell: ResourceCell,
}

struct ControllerInner {
    runtime: Arc<dyn RuntimeAdapter>,
    policy: CallPolicy,
    registry: Mutex<AHashMap<String, ResourceEntry>>,
}

/// Per-resource state machine and command queue.
///
/// Every resource name gets its own actor on first use; commands on one name
/// run one at a time in arrival order, different names never wait on each other.
#[derive(Clone)]
pub struct LifecycleController {
    inner: Arc<ControllerInner>,
}

impl LifecycleController {
    pub fn new(runtime: Arc<dyn RuntimeAdapter>, policy: CallPolicy) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                runtime,
                policy,
                registry: Mutex::new(AHashMap::new()),
            }),
        }
    }

    pub fn backend(&self) -> &'static str {
        self.inner.runtime.backend()
    }

    /// Current state of `name`. Never fails; an unreachable runtime reads as `unknown`.
    pub async fn status(&self, name: &str) -> ResourceSnapshot {
        let cell = match self.entry(name).await {
            Ok(entry) => entry.cell,
            Err(e) => {
                warn!(resource = name, error = %e, "Could not prepare resource for status query");
                let cell = ResourceCell::new(name);
                return cell.set(ResourceState::Unknown, Some(e.to_string()));
            }
        };

        let (current, generation) = cell.begin_observation();
        if current.state == ResourceState::Transitioning {
            return current;
        }

        let runtime = &self.inner.runtime;
        match self.inner.policy.run("get", name, || runtime.get(name)).await {
            Ok(info) => cell.observe(generation, running_state(info), None),
            Err(e) => {
                debug!(resource = name, error = %e, "Status query failed");
                cell.observe(generation, ResourceState::Unknown, Some(e.to_string()))
            }
        }
    }

    /// Queue `action` on `name` and wait for its outcome.
    pub async fn command(
        &self,
        name: &str,
        action: &str,
        requester: AccountId,
    ) -> Result<CommandOutcome, GantryError> {
        let action: LifecycleAction = action.parse().map_err(|_| {
            GantryError::Validation(format!(
                "Invalid action '{action}'. Use 'start' or 'stop'."
            ))
        })?;

        let entry = self.entry(name).await?;
        let result = ractor::call!(entry.actor, LifecycleMessage::Execute, action, requester)
            .map_err(|e| {
                GantryError::RactorError(format!("LifecycleActor Execute RPC failed: {e}"))
            })?;

        if let Err(e) = &result {
            warn!(%requester, resource = name, %action, error = %e, "Lifecycle command failed");
        }
        result
    }

    /// Stop every resource actor after its queued commands.
    pub async fn shutdown(&self, wait: Duration) {
        let entries: Vec<(String, ResourceEntry)> =
            self.inner.registry.lock().await.drain().collect();
        for (name, entry) in entries {
            if let Err(e) = entry.actor.stop_and_wait(None, Some(wait)).await {
                warn!(resource = %name, error = %e, "LifecycleActor did not stop cleanly");
            }
        }
    }

    async fn entry(&self, name: &str) -> Result<ResourceEntry, GantryError> {
        let mut registry = self.inner.registry.lock().await;
        if let Some(entry) = registry.get(name) {
            return Ok(entry.clone());
        }

        let cell = ResourceCell::new(name);
        let (actor, _jh) = Actor::spawn(
            None,
            LifecycleActor,
            LifecycleArgs {
                name: name.to_string(),
                runtime: self.inner.runtime.clone(),
                cell: cell.clone(),
                policy: self.inner.policy,
            },
        )
        .await
        .map_err(|e| GantryError::RactorError(format!("LifecycleActor spawn failed: {e}")))?;

        let entry = ResourceEntry { actor, cell };
        registry.insert(name.to_string(), entry.clone());
        Ok(entry)
    }
}
