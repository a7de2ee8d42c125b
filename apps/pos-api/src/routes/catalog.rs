//! Category and menu routes.

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::Router;

use resto_core::{Category, Menu, Role};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::routes::JsonBody;
use crate::services::catalog::{self, CategoryRequest, MenuRequest};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/category/public", get(list_categories))
        .route("/category", post(create_category))
        .route("/menu/public", get(list_public_menus))
        .route("/menu", get(list_menus).post(create_menu))
        .route("/menu/{id}", put(update_menu).delete(delete_menu))
}

async fn list_categories(State(state): State<AppState>) -> ApiResult<ApiResponse<Vec<Category>>> {
    Ok(ApiResponse::ok("OK", catalog::list_categories(&state.db).await?))
}

async fn create_category(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(req): JsonBody<CategoryRequest>,
) -> ApiResult<ApiResponse<Category>> {
    user.require(&[Role::Admin])?;
    let category = catalog::create_category(&state.db, req).await?;
    Ok(ApiResponse::created("Category created", category))
}

async fn list_public_menus(State(state): State<AppState>) -> ApiResult<ApiResponse<Vec<Menu>>> {
    Ok(ApiResponse::ok("OK", catalog::list_available_menus(&state.db).await?))
}

async fn list_menus(State(state): State<AppState>, user: CurrentUser) -> ApiResult<ApiResponse<Vec<Menu>>> {
    user.require(&[Role::Admin])?;
    Ok(ApiResponse::ok("OK", catalog::list_menus(&state.db).await?))
}

async fn create_menu(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(req): JsonBody<MenuRequest>,
) -> ApiResult<ApiResponse<Menu>> {
    user.require(&[Role::Admin])?;
    let menu = catalog::create_menu(&state.db, req).await?;
    Ok(ApiResponse::created("Menu created", menu))
}

async fn update_menu(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<MenuRequest>,
) -> ApiResult<ApiResponse<Menu>> {
    user.require(&[Role::Admin])?;
    let menu = catalog::update_menu(&state.db, &id, req).await?;
    Ok(ApiResponse::ok("Menu updated", menu))
}

async fn delete_menu(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    user.require(&[Role::Admin])?;
    catalog::delete_menu(&state.db, &id).await?;
    Ok(ApiResponse::message("Menu deleted"))
}
