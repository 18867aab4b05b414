use super::{ResourceInfo, RuntimeAdapter};
use crate::error::RuntimeError;
use ahash::AHashMap;
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// In-process runtime.
///
/// Backs `runtime.backend = "memory"` and doubles as a controllable runtime in
/// tests: it can add latency, fail a number of upcoming calls as unreachable,
/// refuse commands, and it records call counts plus the highest number of
/// calls that were ever in flight at once.
#[derive(Default)]
pub struct MemoryRuntime {
    resources: Mutex<AHashMap<String, bool>>,
    latency_ms: AtomicU64,
    pending_outages: AtomicUsize,
    reject_commands: AtomicBool,
    get_calls: AtomicUsize,
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

struct InFlight<'a> {
    runtime: &'a MemoryRuntime,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.runtime.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource (or overwrite its state).
    pub fn insert(&self, name: &str, running: bool) {
        self.lock().insert(name.to_string(), running);
    }

    pub fn remove(&self, name: &str) {
        self.lock().remove(name);
    }

    pub fn is_running(&self, name: &str) -> Option<bool> {
        self.lock().get(name).copied()
    }

    pub fn set_latency(&self, latency: Duration) {
        let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(ms, Ordering::SeqCst);
    }

    /// Make the next `count` calls fail as if the runtime were unreachable.
    pub fn fail_next(&self, count: usize) {
        self.pending_outages.store(count, Ordering::SeqCst);
    }

    /// Refuse every start/stop until switched off again.
    pub fn reject_commands(&self, reject: bool) {
        self.reject_commands.store(reject, Ordering::SeqCst);
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    /// Highest number of adapter calls observed running concurrently.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, AHashMap<String, bool>> {
        // A poisoned table is still a consistent map of booleans.
        self.resources
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    async fn enter(&self) -> Result<InFlight<'_>, RuntimeError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let guard = InFlight { runtime: self };

        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        let outage = self
            .pending_outages
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if outage {
            return Err(RuntimeError::Unavailable(
                "memory runtime: simulated outage".to_string(),
            ));
        }
        Ok(guard)
    }

    fn transition(&self, name: &str, running: bool) -> Result<(), RuntimeError> {
        if self.reject_commands.load(Ordering::SeqCst) {
            return Err(RuntimeError::Rejected(
                "memory runtime: command refused".to_string(),
            ));
        }
        match self.lock().get_mut(name) {
            Some(state) => {
                *state = running;
                Ok(())
            }
            None => Err(RuntimeError::NotFound(name.to_string())),
        }
    }
}

#[async_trait]
impl RuntimeAdapter for MemoryRuntime {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, name: &str) -> Result<ResourceInfo, RuntimeError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let _guard = self.enter().await?;
        Ok(match self.lock().get(name) {
            Some(&running) => ResourceInfo {
                exists: true,
                running,
            },
            None => ResourceInfo::ABSENT,
        })
    }

    async fn start(&self, name: &str) -> Result<(), RuntimeError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        let _guard = self.enter().await?;
        self.transition(name, true)
    }

    async fn stop(&self, name: &str) -> Result<(), RuntimeError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        let _guard = self.enter().await?;
        self.transition(name, false)
    }
}
