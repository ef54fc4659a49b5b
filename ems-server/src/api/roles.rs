use axum::{Json, extract::State};
use shared::models::RoleInfo;

use crate::db::users;
use crate::state::AppState;

use super::{ApiResult, internal};

/// GET /api/roles
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<RoleInfo>> {
    let roles = users::list_roles(&state.store.pool)
        .await
        .map_err(internal)?;
    Ok(Json(roles))
}
