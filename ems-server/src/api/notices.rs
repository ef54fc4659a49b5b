//! Notice endpoints

use axum::{
    Json,
    extract::{Query, State},
};
use shared::models::{ApplyNotice, ApproveNotice, Notice, NoticeListItem, Role};
use shared::pagination::Paginated;
use shared::request::ListQuery;
use validator::Validate;

use crate::auth::Principal;
use crate::db::notices;
use crate::error::ServiceError;
use crate::services::notice;
use crate::state::AppState;

use super::{ApiResult, internal};

/// GET /api/employee/notice
pub async fn own(State(state): State<AppState>, principal: Principal) -> ApiResult<Option<Notice>> {
    Ok(Json(notice::fetch_own_notice(&state.store, &principal).await?))
}

/// POST /api/employee/notice
pub async fn apply(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<ApplyNotice>,
) -> ApiResult<Notice> {
    Ok(Json(notice::apply(&state.store, &principal, &req).await?))
}

/// GET /api/hr/notices
///
/// HR sees Employees' notices; Admin and Manager see those of leads and HR.
pub async fn active(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ListQuery>,
) -> ApiResult<Paginated<NoticeListItem>> {
    query.validate().map_err(ServiceError::from)?;
    let roles: &[Role] = if principal.role == Role::Hr {
        &[Role::Employee]
    } else {
        &[Role::DepartmentLead, Role::Hr]
    };
    let pattern = query.pattern();
    let (rows, total) =
        notices::list_notices(&state.store.pool, roles, query.slice(), pattern.as_deref())
            .await
            .map_err(internal)?;
    Ok(Json(Paginated::new(total, query.page, rows)))
}

/// POST /api/hr/notices/approve
pub async fn approve(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<ApproveNotice>,
) -> ApiResult<Notice> {
    Ok(Json(notice::approve(&state.store, &principal, &req).await?))
}
