//! Checkout, gateway webhook and order lifecycle routes.
//!
//! ```text
//! POST  /transaction                    public checkout
//! POST  /transaction/notification       gateway webhook
//! GET   /transaction[/{id}]             any staff, list pages with ?limit=&offset=
//! PATCH /transaction/{id}/cash-paid     kasir, admin
//! PATCH /transaction/{id}/order-status  kasir, koki, admin
//! PATCH /transaction/{id}/cancel        kasir, admin
//! ```

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::Router;
use serde::Deserialize;

use resto_core::{OrderStatus, Role, Transaction};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::routes::JsonBody;
use crate::services::checkout::{self, CheckoutOutcome, CheckoutRequest};
use crate::services::order::{self, ListQuery};
use crate::services::payment::{self, Notification, NotificationOutcome};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OrderStatusBody {
    pub order_status: OrderStatus,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/transaction", post(create).get(list))
        .route("/transaction/notification", post(notification))
        .route("/transaction/{id}", get(show))
        .route("/transaction/{id}/cash-paid", patch(cash_paid))
        .route("/transaction/{id}/order-status", patch(order_status))
        .route("/transaction/{id}/cancel", patch(cancel))
}

async fn create(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CheckoutRequest>,
) -> ApiResult<ApiResponse<CheckoutOutcome>> {
    let outcome =
        checkout::create_transaction(&state.db, state.gateway.as_ref(), &state.config.payment, req).await?;
    Ok(ApiResponse::created("Transaction created", outcome))
}

async fn notification(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Notification>,
) -> ApiResult<ApiResponse<NotificationOutcome>> {
    let outcome = payment::handle_notification(&state.db, state.gateway.as_ref(), body).await?;
    Ok(ApiResponse::ok("Notification processed", outcome))
}

async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<ApiResponse<Vec<Transaction>>> {
    Ok(ApiResponse::ok("OK", order::list_transactions(&state.db, query).await?))
}

async fn show(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Transaction>> {
    Ok(ApiResponse::ok("OK", order::get_transaction(&state.db, &id).await?))
}

async fn cash_paid(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Transaction>> {
    user.require(&[Role::Kasir, Role::Admin])?;
    let tx = order::confirm_cash_paid(&state.db, &id, &user.id).await?;
    Ok(ApiResponse::ok("Payment confirmed", tx))
}

async fn order_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<OrderStatusBody>,
) -> ApiResult<ApiResponse<Transaction>> {
    user.require(&[Role::Kasir, Role::Koki, Role::Admin])?;
    let tx = order::update_order_status(&state.db, &id, user.role, Some(&user.id), body.order_status).await?;
    Ok(ApiResponse::ok("Order status updated", tx))
}

async fn cancel(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Transaction>> {
    user.require(&[Role::Kasir, Role::Admin])?;
    let tx = order::cancel_order(&state.db, &id, user.role).await?;
    Ok(ApiResponse::ok("Order cancelled", tx))
}
