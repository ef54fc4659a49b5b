use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use shared::models::Dashboard;
use shared::request::ListQuery;

use crate::auth::Principal;
use crate::services::dashboard;
use crate::state::AppState;

use super::ApiResult;

/// GET /api/dashboard?year=&month=
pub async fn fetch(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ListQuery>,
) -> ApiResult<Dashboard> {
    let summary = dashboard::fetch_dashboard(&state.store, &principal, &query, Utc::now()).await?;
    Ok(Json(summary))
}
