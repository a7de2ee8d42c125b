//! Reporting routes.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;

use resto_core::report::{DailyReport, ReportCharts};
use resto_core::Role;

use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::response::ApiResponse;
use crate::services::report;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub date: String,
    pub cashier_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChartsQuery {
    pub days: Option<u32>,
    pub months: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/report", get(by_date))
        .route("/report/charts", get(charts))
}

async fn by_date(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> ApiResult<ApiResponse<DailyReport>> {
    user.require(&[Role::Kasir, Role::Admin])?;
    let daily = report::report_by_date(&state.db, user.role, &user.id, &query.date, query.cashier_id).await?;
    Ok(ApiResponse::ok("OK", daily))
}

async fn charts(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ChartsQuery>,
) -> ApiResult<ApiResponse<ReportCharts>> {
    user.require(&[Role::Admin])?;
    let today = Utc::now().date_naive();
    let series = report::charts(&state.db, today, query.days, query.months).await?;
    Ok(ApiResponse::ok("OK", series))
}
