//! Health check endpoint

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub database: bool,
    pub version: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<ApiResponse<Health>> {
    if !state.db.health_check().await {
        return Err(ApiError::new(ErrorCode::DatabaseError, "Database unavailable"));
    }

    Ok(ApiResponse::ok(
        "OK",
        Health {
            status: "ok",
            database: true,
            version: env!("CARGO_PKG_VERSION"),
        },
    ))
}
