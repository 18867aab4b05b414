mod gantry;
mod runtime;

pub use gantry::{AuthorizationFailure, GantryError};
pub use runtime::RuntimeError;

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
