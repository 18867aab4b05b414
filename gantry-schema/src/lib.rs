pub mod auth;
pub mod error;
pub mod resource;

pub use auth::{
    LoginRequest, LoginResponse, LogoutResponse, RegisterRequest, RegisterResponse,
};
pub use error::{ApiErrorBody, ApiErrorObject};
pub use resource::{
    CommandResponse, HealthResponse, LifecycleAction, ResourceSnapshot, ResourceState,
    UnknownAction,
};
