use crate::error::GantryError;
use crate::server::guards::auth::RequireSession;
use crate::server::router::GantryState;
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use gantry_schema::{CommandResponse, ResourceSnapshot};

pub fn router() -> Router<GantryState> {
    Router::new()
        .route("/resource", get(resource_status))
        .route("/resource/{action}", post(resource_command))
}

async fn resource_status(State(state): State<GantryState>) -> Json<ResourceSnapshot> {
    Json(state.lifecycle.status(&state.resource_name).await)
}

async fn resource_command(
    State(state): State<GantryState>,
    RequireSession(account): RequireSession,
    Path(action): Path<String>,
) -> Result<Json<CommandResponse>, GantryError> {
    let outcome = state
        .lifecycle
        .command(&state.resource_name, &action, account)
        .await?;

    Ok(Json(CommandResponse {
        message: outcome.message(),
        status: outcome.snapshot.state,
        resource: outcome.snapshot,
    }))
}
