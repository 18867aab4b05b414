use chrono::Utc;
use gantry_schema::{LifecycleAction, ResourceSnapshot, ResourceState};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

struct Observed {
    snapshot: ResourceSnapshot,
    /// Bumped by every command write; lets a status query detect that it raced a command.
    generation: u64,
}

/// Last observed state of one resource, shared between its actor and status queries.
#[derive(Clone)]
pub struct ResourceCell {
    inner: Arc<RwLock<Observed>>,
}

impl ResourceCell {
    pub fn new(name: &str) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Observed {
                snapshot: ResourceSnapshot {
                    name: name.to_string(),
                    state: ResourceState::Unknown,
                    observed_at: Utc::now(),
                    detail: None,
                },
                generation: 0,
            })),
        }
    }

    pub fn snapshot(&self) -> ResourceSnapshot {
        self.read().snapshot.clone()
    }

    /// Record a state produced by a command.
    pub fn set(&self, state: ResourceState, detail: Option<String>) -> ResourceSnapshot {
        let mut guard = self.write();
        guard.generation += 1;
        guard.snapshot.state = state;
        guard.snapshot.detail = detail;
        guard.snapshot.observed_at = Utc::now();
        guard.snapshot.clone()
    }

    /// Snapshot plus the generation a later [`Self::observe`] must match.
    pub fn begin_observation(&self) -> (ResourceSnapshot, u64) {
        let guard = self.read();
        (guard.snapshot.clone(), guard.generation)
    }

    /// Record a status query result unless a command wrote since `generation`
    /// or is still in flight. Returns the snapshot now in effect.
    pub fn observe(
        &self,
        generation: u64,
        state: ResourceState,
        detail: Option<String>,
    ) -> ResourceSnapshot {
        let mut guard = self.write();
        if guard.generation == generation && guard.snapshot.state != ResourceState::Transitioning {
            guard.snapshot.state = state;
            guard.snapshot.detail = detail;
            guard.snapshot.observed_at = Utc::now();
        }
        guard.snapshot.clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, Observed> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Observed> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Result of a lifecycle command that reached the runtime.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub action: LifecycleAction,
    pub previous: ResourceState,
    pub snapshot: ResourceSnapshot,
    /// `false` when the resource was already in the target state.
    pub changed: bool,
}

impl CommandOutcome {
    pub fn message(&self) -> String {
        let name = &self.snapshot.name;
        match (self.action, self.changed) {
            (LifecycleAction::Start, true) => format!("{name} started successfully."),
            (LifecycleAction::Start, false) => format!("{name} is already running."),
            (LifecycleAction::Stop, true) => format!("{name} stopped successfully."),
            (LifecycleAction::Stop, false) => format!("{name} is already stopped."),
        }
    }
}
