//! User administration, unmapped look-ups and self-service endpoints

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{
    ChangePassword, CreateUser, LastUserCode, ResetPassword, Role, UpdateUser, UpsertUserDetails,
    User, UserDetails, UserListItem, UserRef, member_role,
};
use shared::pagination::Paginated;
use shared::request::UserQuery;
use validator::Validate;

use crate::auth::Principal;
use crate::db::users;
use crate::error::ServiceError;
use crate::services;
use crate::state::AppState;

use super::{ApiResult, Message, internal, message};

/// GET /api/users
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Paginated<UserListItem>> {
    query.validate().map_err(ServiceError::from)?;
    let (rows, total) = users::list_users(&state.store.pool, &query)
        .await
        .map_err(internal)?;
    Ok(Json(Paginated::new(total, query.page, rows)))
}

/// POST /api/users
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateUser>,
) -> ApiResult<User> {
    Ok(Json(services::user::create_user(&state.store, &req).await?))
}

/// GET /api/users/{id}
pub async fn fetch(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<User> {
    Ok(Json(services::user::fetch_user(&state.store, id).await?))
}

/// PUT /api/users/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUser>,
) -> ApiResult<User> {
    Ok(Json(services::user::update_user(&state.store, id, &req).await?))
}

/// DELETE /api/users/{id}
pub async fn remove(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Message> {
    services::user::remove_user(&state.store, id).await?;
    Ok(message("user removed"))
}

/// GET /api/users/last-code
pub async fn last_code(State(state): State<AppState>) -> ApiResult<LastUserCode> {
    let code = users::last_user_code(&state.store.pool)
        .await
        .map_err(internal)?;
    Ok(Json(LastUserCode { code }))
}

async fn unmapped(
    state: &AppState,
    roles: &[Role],
    include: Option<i64>,
) -> ApiResult<Vec<UserRef>> {
    let rows = users::unmapped_users(&state.store.pool, roles, include)
        .await
        .map_err(internal)?;
    Ok(Json(rows))
}

/// GET /api/users/unmapped/leads
pub async fn unmapped_leads(State(state): State<AppState>) -> ApiResult<Vec<UserRef>> {
    unmapped(&state, &[Role::DepartmentLead], None).await
}

/// GET /api/users/unmapped/hr
pub async fn unmapped_hr(State(state): State<AppState>) -> ApiResult<Vec<UserRef>> {
    unmapped(&state, &[Role::Hr], None).await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadQuery {
    pub user_id: Option<i64>,
}

/// GET /api/users/unmapped/heads?userId=
///
/// Candidate heads for an edit screen, the current head included.
pub async fn unmapped_heads(
    State(state): State<AppState>,
    Query(query): Query<HeadQuery>,
) -> ApiResult<Vec<UserRef>> {
    unmapped(&state, &[Role::DepartmentLead, Role::Hr], query.user_id).await
}

/// GET /api/users/unmapped/department/{id}
pub async fn unmapped_for_department(
    State(state): State<AppState>,
    Path(department_id): Path<i64>,
) -> ApiResult<Vec<UserRef>> {
    unmapped(&state, &[member_role(department_id)], None).await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsQuery {
    pub user_id: Option<i64>,
}

/// GET /api/user/details?userId=
pub async fn fetch_details(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<DetailsQuery>,
) -> ApiResult<UserDetails> {
    let details = services::user::fetch_details(&state.store, &principal, query.user_id).await?;
    Ok(Json(details))
}

/// PUT /api/user/details
pub async fn upsert_details(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<UpsertUserDetails>,
) -> ApiResult<UserDetails> {
    let details = services::user::upsert_details(&state.store, &principal, req).await?;
    Ok(Json(details))
}

/// POST /api/user/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<ResetPassword>,
) -> ApiResult<Message> {
    services::user::reset_password(&state.store, &principal, &req).await?;
    Ok(message("password updated, please sign in again"))
}

/// POST /api/user/change-password
pub async fn change_password(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<ChangePassword>,
) -> ApiResult<Message> {
    services::user::change_password(&state.store, &principal, &req).await?;
    Ok(message("password changed, please sign in again"))
}
