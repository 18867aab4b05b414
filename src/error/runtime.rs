use super::IsRetryable;
use super::gantry::GantryError;
use std::time::Duration;
use thiserror::Error as ThisError;

/// Failure reported by a runtime adapter call.
#[derive(Debug, Clone, ThisError)]
pub enum RuntimeError {
    #[error("resource `{0}` does not exist in the runtime")]
    NotFound(String),

    #[error("runtime unreachable: {0}")]
    Unavailable(String),

    #[error("runtime call timed out after {0:?}")]
    Timeout(Duration),

    /// The runtime answered but refused the operation.
    #[error("runtime rejected the operation: {0}")]
    Rejected(String),
}

impl IsRetryable for RuntimeError {
    fn is_retryable(&self) -> bool {
        matches!(self, RuntimeError::Unavailable(_) | RuntimeError::Timeout(_))
    }
}

impl From<RuntimeError> for GantryError {
    fn from(e: RuntimeError) -> Self {
        match e {
            RuntimeError::NotFound(name) => {
                GantryError::NotFound(format!("Resource {name} not found."))
            }
            RuntimeError::Unavailable(_) | RuntimeError::Timeout(_) => {
                GantryError::RuntimeUnavailable(e.to_string())
            }
            RuntimeError::Rejected(message) => GantryError::Runtime(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_outages_are_retryable() {
        assert!(RuntimeError::Unavailable("conn refused".into()).is_retryable());
        assert!(RuntimeError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(!RuntimeError::NotFound("x".into()).is_retryable());
        assert!(!RuntimeError::Rejected("bad".into()).is_retryable());
    }

    #[test]
    fn not_found_maps_to_not_found() {
        let mapped: GantryError = RuntimeError::NotFound("data_generator".into()).into();
        assert!(matches!(mapped, GantryError::NotFound(msg) if msg.contains("data_generator")));
    }
}
