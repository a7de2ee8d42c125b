//! Cash settlement routes. A cashier always acts on their own account.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use resto_core::{Role, Settlement};

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::routes::JsonBody;
use crate::services::settlement::{self, CashierSettlementStatus, CreateSettlementRequest, SettlementView};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    #[serde(default)]
    pub date: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/settlement", get(show).post(create))
        .route("/settlement/status-by-date", get(status_by_date))
}

async fn show(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<DateQuery>,
) -> ApiResult<ApiResponse<SettlementView>> {
    user.require(&[Role::Kasir, Role::Admin])?;
    let view = settlement::get_settlement(&state.db, &query.date, &user.id).await?;
    Ok(ApiResponse::ok("OK", view))
}

async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(req): JsonBody<CreateSettlementRequest>,
) -> ApiResult<ApiResponse<Settlement>> {
    user.require(&[Role::Kasir, Role::Admin])?;
    let created = settlement::create_settlement(&state.db, &user.id, req).await?;
    Ok(ApiResponse::created("Settlement recorded", created))
}

async fn status_by_date(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<DateQuery>,
) -> ApiResult<ApiResponse<Vec<CashierSettlementStatus>>> {
    user.require(&[Role::Admin])?;
    let rows = settlement::status_by_date(&state.db, &query.date).await?;
    Ok(ApiResponse::ok("OK", rows))
}
