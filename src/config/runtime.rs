use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeBackend {
    /// Docker Engine API via the local socket (or `DOCKER_HOST`).
    Docker,
    /// In-process table; nothing outside the server is touched.
    Memory,
}

/// Managed resource and runtime adapter settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuntimeConfig {
    /// TOML: `runtime.backend`. Default: `docker`.
    #[serde(default = "default_backend")]
    pub backend: RuntimeBackend,

    /// Name of the managed resource (container name for Docker).
    /// TOML: `runtime.resource_name`. Default: `data_generator`.
    #[serde(default = "default_resource_name")]
    pub resource_name: String,

    /// Timeout applied to every single adapter call.
    /// TOML: `runtime.call_timeout_ms`. Default: `10000`.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,

    /// Retries after the first attempt for unreachable/timed-out calls.
    /// TOML: `runtime.retry_max_times`. Default: `3`.
    #[serde(default = "default_retry_max_times")]
    pub retry_max_times: usize,

    /// TOML: `runtime.retry_min_delay_ms`. Default: `200`.
    #[serde(default = "default_retry_min_delay_ms")]
    pub retry_min_delay_ms: u64,

    /// TOML: `runtime.retry_max_delay_ms`. Default: `2000`.
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    /// Grace period handed to the runtime before it kills the resource on stop.
    /// Stop calls get this on top of `call_timeout_ms`.
    /// TOML: `runtime.stop_grace_secs`. Default: `10`.
    #[serde(default = "default_stop_grace_secs")]
    pub stop_grace_secs: u32,

    /// Memory backend only: whether the resource starts out running.
    /// TOML: `runtime.memory_initially_running`. Default: `false`.
    #[serde(default)]
    pub memory_initially_running: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            resource_name: default_resource_name(),
            call_timeout_ms: default_call_timeout_ms(),
            retry_max_times: default_retry_max_times(),
            retry_min_delay_ms: default_retry_min_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            stop_grace_secs: default_stop_grace_secs(),
            memory_initially_running: false,
        }
    }
}

impl RuntimeConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_secs(u64::from(self.stop_grace_secs))
    }

    pub fn retry_min_delay(&self) -> Duration {
        Duration::from_millis(self.retry_min_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms.max(self.retry_min_delay_ms))
    }
}

fn default_backend() -> RuntimeBackend {
    RuntimeBackend::Docker
}

fn default_resource_name() -> String {
    "data_generator".to_string()
}

fn default_call_timeout_ms() -> u64 {
    10_000
}

fn default_retry_max_times() -> usize {
    3
}

fn default_retry_min_delay_ms() -> u64 {
    200
}

fn default_retry_max_delay_ms() -> u64 {
    2_000
}

fn default_stop_grace_secs() -> u32 {
    10
}
