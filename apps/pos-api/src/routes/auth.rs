//! Login, session and staff account routes.
//!
//! POST   /auth/login            public, sets the `token` cookie
//! GET    /auth/me               authenticated
//! PUT    /auth/change-password  authenticated, own account
//! POST   /auth/register         admin
//! GET    /users                 admin, cashier list
//! DELETE /users/{id}            admin
//!
//! `/user` and `/user/{id}` are accepted as aliases of the `/users` paths.

use axum::extract::{Path, State};
use axum::http::header::SET_COOKIE;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::Router;

use resto_core::{Role, User};

use crate::auth::{CurrentUser, TOKEN_COOKIE};
use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::routes::JsonBody;
use crate::services::account::{self, ChangePasswordRequest, LoginRequest, RegisterRequest};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/auth/change-password", put(change_password))
        .route("/auth/register", post(register))
        .route("/users", get(list_cashiers))
        .route("/users/{id}", delete(delete_user))
        .route("/user", get(list_cashiers))
        .route("/user/{id}", delete(delete_user))
}

fn session_cookie(token: &str, max_age_secs: i64) -> String {
    format!("{TOKEN_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age_secs}")
}

async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let outcome = account::login(&state.db, &state.jwt, req).await?;
    let cookie = session_cookie(&outcome.token, state.jwt.lifetime_secs());

    Ok(([(SET_COOKIE, cookie)], ApiResponse::ok("Login successful", outcome)))
}

async fn me(State(state): State<AppState>, user: CurrentUser) -> ApiResult<ApiResponse<User>> {
    let profile = account::me(&state.db, &user.id).await?;
    Ok(ApiResponse::ok("OK", profile))
}

async fn change_password(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> ApiResult<ApiResponse<()>> {
    account::change_password(&state.db, &user.id, req).await?;
    Ok(ApiResponse::message("Password changed"))
}

async fn register(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> ApiResult<ApiResponse<User>> {
    user.require(&[Role::Admin])?;
    let created = account::register(&state.db, req).await?;
    Ok(ApiResponse::created("User registered", created))
}

async fn list_cashiers(State(state): State<AppState>, user: CurrentUser) -> ApiResult<ApiResponse<Vec<User>>> {
    user.require(&[Role::Admin])?;
    let cashiers = account::list_cashiers(&state.db).await?;
    Ok(ApiResponse::ok("OK", cashiers))
}

async fn delete_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    user.require(&[Role::Admin])?;
    account::delete_user(&state.db, &id).await?;
    Ok(ApiResponse::message("User deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc", 60);
        assert!(cookie.starts_with("token=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.ends_with("Max-Age=60"));
    }
}
