//! Leave endpoints for members, leads and managers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use shared::models::{LeaveListItem, MemberLeaves, RequestLeave, Role, UpdateApproval};
use shared::pagination::Paginated;
use shared::request::ListQuery;
use validator::Validate;

use crate::auth::Principal;
use crate::db::{ListFilter, leaves};
use crate::error::ServiceError;
use crate::services::leave;
use crate::state::AppState;

use super::{ApiResult, Created, Message, internal, message};

/// GET /api/employee/leaves
pub async fn own(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ListQuery>,
) -> ApiResult<MemberLeaves> {
    let today = Utc::now().date_naive();
    Ok(Json(
        leave::fetch_own_leaves(&state.store, &principal, &query, today).await?,
    ))
}

/// POST /api/employee/leaves
pub async fn request(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<RequestLeave>,
) -> ApiResult<Created> {
    let id = leave::request_leave(&state.store, &principal, &req).await?;
    Ok(Json(Created { id }))
}

/// PUT /api/employee/leaves/{id}
pub async fn update(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i64>,
    Json(req): Json<RequestLeave>,
) -> ApiResult<Message> {
    leave::update_leave(&state.store, &principal, id, &req).await?;
    Ok(message("leave request updated"))
}

/// DELETE /api/employee/leaves/{id}
pub async fn remove(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i64>,
) -> ApiResult<Message> {
    leave::remove_leave(&state.store, &principal, id).await?;
    Ok(message("leave request removed"))
}

/// PUT /api/lead/leaves/{id}/status
pub async fn set_status(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i64>,
    Json(req): Json<UpdateApproval>,
) -> ApiResult<Message> {
    leave::update_leave_status(&state.store, &principal, id, req, Utc::now()).await?;
    Ok(message(if req.is_approved {
        "leave request approved"
    } else {
        "leave request rejected"
    }))
}

async fn listing(
    state: &AppState,
    query: &ListQuery,
    scope: impl FnOnce(ListFilter) -> ListFilter,
) -> ApiResult<Paginated<LeaveListItem>> {
    query.validate().map_err(ServiceError::from)?;
    let filter = scope(ListFilter::new(query.window(Utc::now().date_naive())))
        .search(query.pattern());
    let (rows, total) = leaves::list_leaves(&state.store.pool, &filter, query.slice())
        .await
        .map_err(internal)?;
    Ok(Json(Paginated::new(total, query.page, rows)))
}

/// GET /api/lead/leaves: Employees of the caller's department
pub async fn department_members(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ListQuery>,
) -> ApiResult<Paginated<LeaveListItem>> {
    let department_id = principal.department()?;
    listing(&state, &query, |f| {
        f.department(department_id).roles(&[Role::Employee])
    })
    .await
}

/// GET /api/manager/lead-leaves
pub async fn leads_and_hr(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Paginated<LeaveListItem>> {
    listing(&state, &query, |f| f.roles(&[Role::DepartmentLead, Role::Hr])).await
}

/// GET /api/manager/leaves
pub async fn all(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Paginated<LeaveListItem>> {
    listing(&state, &query, |f| f).await
}
