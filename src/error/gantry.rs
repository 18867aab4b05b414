use axum::{Json, extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse};
use gantry_schema::ApiErrorBody;
use thiserror::Error as ThisError;
use tracing::{debug, error};

/// Why a bearer token was refused. Logged, never returned to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationFailure {
    MissingHeader,
    UnknownToken,
    Revoked,
    Expired,
}

impl std::fmt::Display for AuthorizationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            AuthorizationFailure::MissingHeader => "missing or malformed bearer header",
            AuthorizationFailure::UnknownToken => "unknown token",
            AuthorizationFailure::Revoked => "token revoked",
            AuthorizationFailure::Expired => "token expired",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, ThisError)]
pub enum GantryError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid username or password")]
    Authentication,

    #[error("Authorization failed: {0}")]
    Authorization(AuthorizationFailure),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Password hashing error: {0}")]
    Password(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unexpected error: {0}")]
    UnexpectedError(String),

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<figment::Error> for GantryError {
    fn from(e: figment::Error) -> Self {
        GantryError::Config(e.to_string())
    }
}

impl From<JsonRejection> for GantryError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(error = %rejection.body_text(), "Rejected request body");
        GantryError::InvalidRequest("Request body must be a valid JSON object.".to_string())
    }
}

impl GantryError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GantryError::Validation(_) | GantryError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GantryError::Conflict(_) => StatusCode::CONFLICT,
            GantryError::Authentication | GantryError::Authorization(_) => {
                StatusCode::UNAUTHORIZED
            }
            GantryError::NotFound(_) => StatusCode::NOT_FOUND,
            GantryError::RuntimeUnavailable(_) | GantryError::Runtime(_) => {
                StatusCode::BAD_GATEWAY
            }
            GantryError::Password(_)
            | GantryError::Config(_)
            | GantryError::UnexpectedError(_)
            | GantryError::RactorError(_)
            | GantryError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GantryError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = match self {
            GantryError::Validation(message) => ApiErrorBody::new("VALIDATION_ERROR", message),
            GantryError::InvalidRequest(message) => ApiErrorBody::new("INVALID_REQUEST", message),
            GantryError::Conflict(message) => ApiErrorBody::new("CONFLICT", message),
            GantryError::Authentication => {
                ApiErrorBody::new("AUTHENTICATION_FAILED", "Invalid username or password.")
            }
            GantryError::Authorization(reason) => {
                debug!(%reason, "Rejected bearer token");
                ApiErrorBody::new("UNAUTHORIZED", "Authorization required or invalid token.")
            }
            GantryError::NotFound(message) => ApiErrorBody::new("NOT_FOUND", message),
            GantryError::RuntimeUnavailable(message) => {
                ApiErrorBody::new("RUNTIME_UNAVAILABLE", message)
            }
            GantryError::Runtime(message) => ApiErrorBody::new("RUNTIME_ERROR", message),
            internal @ (GantryError::Password(_)
            | GantryError::Config(_)
            | GantryError::UnexpectedError(_)
            | GantryError::RactorError(_)
            | GantryError::DatabaseError(_)) => {
                error!(error = %internal, "Internal error while serving request");
                ApiErrorBody::new("INTERNAL_ERROR", "An internal server error occurred.")
            }
        };
        (status, Json(body)).into_response()
    }
}
