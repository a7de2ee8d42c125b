//! Promo routes. `/promo/active` and `/promo/validate` are public.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;

use resto_core::{Promo, Role};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::routes::JsonBody;
use crate::services::promo::{self, CreatePromoRequest, PromoPatch, PromoQuote, ValidatePromoRequest};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/promo/active", get(list_active))
        .route("/promo/validate", post(validate))
        .route("/promo", get(list).post(create))
        .route("/promo/{id}", get(show).put(update).delete(delete))
}

async fn list_active(State(state): State<AppState>) -> ApiResult<ApiResponse<Vec<Promo>>> {
    Ok(ApiResponse::ok("OK", promo::list_active_promos(&state.db).await?))
}

async fn validate(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ValidatePromoRequest>,
) -> ApiResult<ApiResponse<PromoQuote>> {
    let quote = promo::validate_promo(&state.db, req).await?;
    Ok(ApiResponse::ok("Promo code is valid", quote))
}

async fn list(State(state): State<AppState>, user: CurrentUser) -> ApiResult<ApiResponse<Vec<Promo>>> {
    user.require(&[Role::Admin])?;
    Ok(ApiResponse::ok("OK", promo::list_promos(&state.db).await?))
}

async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(req): JsonBody<CreatePromoRequest>,
) -> ApiResult<ApiResponse<Promo>> {
    user.require(&[Role::Admin])?;
    let created = promo::create_promo(&state.db, req).await?;
    Ok(ApiResponse::created("Promo created", created))
}

async fn show(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Promo>> {
    user.require(&[Role::Admin])?;
    Ok(ApiResponse::ok("OK", promo::get_promo(&state.db, &id).await?))
}

async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<PromoPatch>,
) -> ApiResult<ApiResponse<Promo>> {
    user.require(&[Role::Admin])?;
    let updated = promo::update_promo(&state.db, &id, patch).await?;
    Ok(ApiResponse::ok("Promo updated", updated))
}

async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    user.require(&[Role::Admin])?;
    promo::delete_promo(&state.db, &id).await?;
    Ok(ApiResponse::message("Promo deleted"))
}
