use crate::server::router::GantryState;
use axum::{Json, Router, routing::get};
use gantry_schema::HealthResponse;

pub fn router() -> Router<GantryState> {
    Router::new().route("/status", get(server_status))
}

/// Liveness of the control plane itself, not of the managed resource.
async fn server_status() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "running".to_string(),
    })
}
