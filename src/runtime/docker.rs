use super::{ResourceInfo, RuntimeAdapter};
use crate::error::RuntimeError;
use async_trait::async_trait;
use bollard::Docker;
use bollard::container::{InspectContainerOptions, StartContainerOptions, StopContainerOptions};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Docker Engine backend. The resource name is the container name.
pub struct DockerRuntime {
    /// Cached Docker connection (created on first use).
    docker: RwLock<Option<Docker>>,
    stop_grace_secs: u32,
}

impl DockerRuntime {
    pub fn new(stop_grace_secs: u32) -> Self {
        Self {
            docker: RwLock::new(None),
            stop_grace_secs,
        }
    }

    /// Get or create a Docker connection.
    async fn docker(&self) -> Result<Docker, RuntimeError> {
        {
            let guard = self.docker.read().await;
            if let Some(ref d) = *guard {
                return Ok(d.clone());
            }
        }
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| RuntimeError::Unavailable(format!("docker connect failed: {e}")))?;
        info!("Connected to Docker daemon");
        *self.docker.write().await = Some(docker.clone());
        Ok(docker)
    }
}

#[async_trait]
impl RuntimeAdapter for DockerRuntime {
    fn backend(&self) -> &'static str {
        "docker"
    }

    async fn get(&self, name: &str) -> Result<ResourceInfo, RuntimeError> {
        let docker = self.docker().await?;
        match docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await
        {
            Ok(details) => {
                let running = details
                    .state
                    .as_ref()
                    .and_then(|s| s.running)
                    .unwrap_or(false);
                Ok(ResourceInfo {
                    exists: true,
                    running,
                })
            }
            Err(e) => match map_docker_error(name, e) {
                RuntimeError::NotFound(_) => Ok(ResourceInfo::ABSENT),
                other => Err(other),
            },
        }
    }

    async fn start(&self, name: &str) -> Result<(), RuntimeError> {
        let docker = self.docker().await?;
        match docker
            .start_container(name, None::<StartContainerOptions<String>>)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if is_not_modified(&e) => {
                debug!(container = name, "Container already running");
                Ok(())
            }
            Err(e) => Err(map_docker_error(name, e)),
        }
    }

    async fn stop(&self, name: &str) -> Result<(), RuntimeError> {
        let docker = self.docker().await?;
        let options = StopContainerOptions {
            t: i64::from(self.stop_grace_secs),
        };
        match docker.stop_container(name, Some(options)).await {
            Ok(()) => Ok(()),
            Err(e) if is_not_modified(&e) => {
                debug!(container = name, "Container already stopped");
                Ok(())
            }
            Err(e) => Err(map_docker_error(name, e)),
        }
    }
}

/// The daemon answers 304 when the container is already in the requested state.
fn is_not_modified(e: &bollard::errors::Error) -> bool {
    matches!(
        e,
        bollard::errors::Error::DockerResponseServerError {
            status_code: 304,
            ..
        }
    )
}

fn map_docker_error(name: &str, e: bollard::errors::Error) -> RuntimeError {
    match e {
        bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        } => RuntimeError::NotFound(name.to_string()),
        // The daemon answered; retrying the same request will not change its mind.
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } => RuntimeError::Rejected(format!("docker returned {status_code}: {message}")),
        other => RuntimeError::Unavailable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_error(status_code: u16) -> bollard::errors::Error {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message: "boom".to_string(),
        }
    }

    #[test]
    fn not_found_maps_to_not_found() {
        assert!(matches!(
            map_docker_error("data_generator", server_error(404)),
            RuntimeError::NotFound(name) if name == "data_generator"
        ));
    }

    #[test]
    fn daemon_answers_are_rejections() {
        assert!(matches!(
            map_docker_error("x", server_error(500)),
            RuntimeError::Rejected(_)
        ));
        assert!(matches!(
            map_docker_error("x", server_error(409)),
            RuntimeError::Rejected(_)
        ));
    }

    #[test]
    fn not_modified_is_detected() {
        assert!(is_not_modified(&server_error(304)));
        assert!(!is_not_modified(&server_error(404)));
    }
}
