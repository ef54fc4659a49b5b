//! Permission endpoints for members, leads and managers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use shared::models::{MemberPermissions, PermissionListItem, RequestPermission, Role, UpdateApproval};
use shared::pagination::Paginated;
use shared::request::ListQuery;
use validator::Validate;

use crate::auth::Principal;
use crate::db::{ListFilter, permissions};
use crate::error::ServiceError;
use crate::services::permission;
use crate::state::AppState;

use super::{ApiResult, Created, Message, internal, message};

/// GET /api/employee/permissions
pub async fn own(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ListQuery>,
) -> ApiResult<MemberPermissions> {
    let today = Utc::now().date_naive();
    Ok(Json(
        permission::fetch_own_permissions(&state.store, &principal, &query, today).await?,
    ))
}

/// POST /api/employee/permissions
pub async fn request(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<RequestPermission>,
) -> ApiResult<Created> {
    let id = permission::request(&state.store, &principal, &req).await?;
    Ok(Json(Created { id }))
}

/// PUT /api/employee/permissions/{id}
pub async fn update(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i64>,
    Json(req): Json<RequestPermission>,
) -> ApiResult<Message> {
    permission::update(&state.store, &principal, id, &req).await?;
    Ok(message("permission request updated"))
}

/// DELETE /api/employee/permissions/{id}
pub async fn remove(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i64>,
) -> ApiResult<Message> {
    permission::remove(&state.store, &principal, id).await?;
    Ok(message("permission request removed"))
}

/// PUT /api/lead/permissions/{id}/status
pub async fn set_status(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<i64>,
    Json(req): Json<UpdateApproval>,
) -> ApiResult<Message> {
    permission::set_status(&state.store, &principal, id, req, Utc::now()).await?;
    Ok(message(if req.is_approved {
        "permission request approved"
    } else {
        "permission request rejected"
    }))
}

async fn listing(
    state: &AppState,
    query: &ListQuery,
    filter: ListFilter,
) -> ApiResult<Paginated<PermissionListItem>> {
    let filter = filter.search(query.pattern());
    let (rows, total) = permissions::list_permissions(&state.store.pool, &filter, query.slice())
        .await
        .map_err(internal)?;
    Ok(Json(Paginated::new(total, query.page, rows)))
}

/// GET /api/lead/permissions: Employees of the caller's department
pub async fn department_members(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ListQuery>,
) -> ApiResult<Paginated<PermissionListItem>> {
    query.validate().map_err(ServiceError::from)?;
    let filter = ListFilter::new(query.window(Utc::now().date_naive()))
        .department(principal.department()?)
        .roles(&[Role::Employee]);
    listing(&state, &query, filter).await
}

/// GET /api/manager/lead-permissions
pub async fn leads_and_hr(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Paginated<PermissionListItem>> {
    query.validate().map_err(ServiceError::from)?;
    let filter = ListFilter::new(query.window(Utc::now().date_naive()))
        .roles(&[Role::DepartmentLead, Role::Hr]);
    listing(&state, &query, filter).await
}
