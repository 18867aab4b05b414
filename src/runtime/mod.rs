//! Runtime adapters: the only place that knows how the managed resource is
//! actually started, stopped and inspected.

mod docker;
mod memory;

pub use docker::DockerRuntime;
pub use memory::MemoryRuntime;

use crate::config::{RuntimeBackend, RuntimeConfig};
use crate::error::RuntimeError;
use async_trait::async_trait;
use std::sync::Arc;

/// What the runtime reports about a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceInfo {
    pub exists: bool,
    pub running: bool,
}

impl ResourceInfo {
    pub const ABSENT: ResourceInfo = ResourceInfo {
        exists: false,
        running: false,
    };
}

/// Minimal capability set required from any backing runtime.
///
/// `start` on a running resource and `stop` on a stopped one must succeed.
/// `get` reports absence through [`ResourceInfo::exists`]; `start`/`stop`
/// report it as [`RuntimeError::NotFound`].
#[async_trait]
pub trait RuntimeAdapter: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn get(&self, name: &str) -> Result<ResourceInfo, RuntimeError>;

    async fn start(&self, name: &str) -> Result<(), RuntimeError>;

    async fn stop(&self, name: &str) -> Result<(), RuntimeError>;
}

/// Build the adapter selected by `runtime.backend`.
pub fn from_config(cfg: &RuntimeConfig) -> Arc<dyn RuntimeAdapter> {
    match cfg.backend {
        RuntimeBackend::Docker => Arc::new(DockerRuntime::new(cfg.stop_grace_secs)),
        RuntimeBackend::Memory => {
            let runtime = MemoryRuntime::new();
            runtime.insert(&cfg.resource_name, cfg.memory_initially_running);
            Arc::new(runtime)
        }
    }
}
