//! Department endpoints

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::models::{
    CreateDepartment, Department, DepartmentListItem, DepartmentMemberItem, MapUsers, UnmapUser,
    UpdateDepartment,
};
use shared::pagination::Paginated;
use shared::request::ListQuery;
use validator::Validate;

use crate::db::departments;
use crate::error::ServiceError;
use crate::services::department;
use crate::state::AppState;

use super::{ApiResult, Message, internal, message};

/// GET /api/departments
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Paginated<DepartmentListItem>> {
    query.validate().map_err(ServiceError::from)?;
    let pattern = query.pattern();
    let (rows, total) =
        departments::list_departments(&state.store.pool, query.slice(), pattern.as_deref())
            .await
            .map_err(internal)?;
    Ok(Json(Paginated::new(total, query.page, rows)))
}

/// POST /api/departments
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateDepartment>,
) -> ApiResult<Department> {
    Ok(Json(department::create(&state.store, &req).await?))
}

/// PUT /api/departments/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateDepartment>,
) -> ApiResult<Message> {
    department::update(&state.store, id, &req).await?;
    Ok(message("department updated"))
}

/// DELETE /api/departments/{id}
pub async fn remove(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Message> {
    department::remove(&state.store, id).await?;
    Ok(message("department removed"))
}

/// GET /api/departments/{id}/members
pub async fn members(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Paginated<DepartmentMemberItem>> {
    query.validate().map_err(ServiceError::from)?;
    let pattern = query.pattern();
    let (rows, total) =
        departments::department_members(&state.store.pool, id, query.slice(), pattern.as_deref())
            .await
            .map_err(internal)?;
    Ok(Json(Paginated::new(total, query.page, rows)))
}

/// POST /api/departments/{id}/members
pub async fn map_users(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<MapUsers>,
) -> ApiResult<Message> {
    department::map_users(&state.store, id, &req).await?;
    Ok(message("users mapped"))
}

/// POST /api/departments/unmap
pub async fn unmap(
    State(state): State<AppState>,
    Json(req): Json<UnmapUser>,
) -> ApiResult<Message> {
    department::unmap_user(&state.store, &req).await?;
    Ok(message("user unmapped"))
}
