use crate::error::GantryError;
use crate::server::guards::auth::bearer_token;
use crate::server::router::GantryState;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    routing::post,
};
use gantry_schema::{
    LoginRequest, LoginResponse, LogoutResponse, RegisterRequest, RegisterResponse,
};
use tracing::debug;

pub fn router() -> Router<GantryState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

async fn register(
    State(state): State<GantryState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), GantryError> {
    let Json(body) = body?;
    let account_id = state.auth.register(&body.username, &body.password).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            account_id: account_id.0,
            message: format!("User {} registered successfully.", body.username),
            username: body.username,
        }),
    ))
}

async fn login(
    State(state): State<GantryState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, GantryError> {
    let Json(body) = body?;
    let issued = state.auth.login(&body.username, &body.password).await?;

    Ok(Json(LoginResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        message: "Login successful.".to_string(),
    }))
}

/// Revoke the caller's token. Unknown or already revoked tokens still succeed.
async fn logout(
    State(state): State<GantryState>,
    headers: HeaderMap,
) -> Result<Json<LogoutResponse>, GantryError> {
    let token = bearer_token(&headers).ok_or_else(|| {
        GantryError::Validation("Authorization: Bearer <token> header is required.".to_string())
    })?;
    state.auth.logout(&token).await?;
    debug!("Logout processed");

    Ok(Json(LogoutResponse {
        message: "Logged out successfully.".to_string(),
    }))
}
