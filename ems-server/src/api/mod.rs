//! HTTP routes for ems-server

pub mod auth;
pub mod dashboard;
pub mod departments;
pub mod health;
pub mod leaves;
pub mod notices;
pub mod permissions;
pub mod roles;
pub mod users;

use axum::routing::{get, post, put};
use axum::{Json, Router, middleware};
use serde::Serialize;
use shared::error::AppError;
use shared::models::RoleSet;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::middleware::{require_auth, require_roles};
use crate::auth::rate_limit::{login_rate_limit, otp_rate_limit};
use crate::error::ServiceError;
use crate::state::AppState;

pub type ApiResult<T> = Result<Json<T>, AppError>;

/// `{"message": ...}` body returned by mutations
pub type Message = serde_json::Value;

pub fn message(text: &str) -> Json<Message> {
    Json(serde_json::json!({ "message": text }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Created {
    pub id: i64,
}

pub(crate) fn internal(e: sqlx::Error) -> AppError {
    ServiceError::from(e).into()
}

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    let login = Router::new()
        .route("/api/auth/login", post(auth::login))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            login_rate_limit,
        ));

    let otp = Router::new()
        .route("/api/auth/forgot-password/send-otp", post(auth::send_otp))
        .route(
            "/api/auth/forgot-password/verify-otp",
            post(auth::verify_otp),
        )
        .layer(middleware::from_fn_with_state(state.clone(), otp_rate_limit));

    // Any signed-in user
    let member = Router::new()
        .route("/api/auth/logout", post(auth::logout))
        .route(
            "/api/user/details",
            get(users::fetch_details).put(users::upsert_details),
        )
        .route("/api/user/reset-password", post(users::reset_password))
        .route("/api/user/change-password", post(users::change_password))
        .route("/api/employee/leaves", get(leaves::own).post(leaves::request))
        .route(
            "/api/employee/leaves/{id}",
            put(leaves::update).delete(leaves::remove),
        )
        .route(
            "/api/employee/permissions",
            get(permissions::own).post(permissions::request),
        )
        .route(
            "/api/employee/permissions/{id}",
            put(permissions::update).delete(permissions::remove),
        )
        .route("/api/employee/notice", get(notices::own).post(notices::apply))
        .route("/api/dashboard", get(dashboard::fetch))
        .layer(middleware::from_fn(require_roles(RoleSet::AUTHENTICATED)));

    let hr = Router::new()
        .route("/api/roles", get(roles::list))
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/last-code", get(users::last_code))
        .route("/api/users/unmapped/leads", get(users::unmapped_leads))
        .route("/api/users/unmapped/hr", get(users::unmapped_hr))
        .route("/api/users/unmapped/heads", get(users::unmapped_heads))
        .route(
            "/api/users/unmapped/department/{id}",
            get(users::unmapped_for_department),
        )
        .route(
            "/api/users/{id}",
            get(users::fetch).put(users::update).delete(users::remove),
        )
        .route(
            "/api/departments",
            get(departments::list).post(departments::create),
        )
        .route("/api/departments/unmap", post(departments::unmap))
        .route(
            "/api/departments/{id}",
            put(departments::update).delete(departments::remove),
        )
        .route(
            "/api/departments/{id}/members",
            get(departments::members).post(departments::map_users),
        )
        .route("/api/hr/notices", get(notices::active))
        .route("/api/hr/notices/approve", post(notices::approve))
        .layer(middleware::from_fn(require_roles(RoleSet::HR)));

    let lead = Router::new()
        .route("/api/lead/leaves", get(leaves::department_members))
        .route("/api/lead/leaves/{id}/status", put(leaves::set_status))
        .route("/api/lead/permissions", get(permissions::department_members))
        .route(
            "/api/lead/permissions/{id}/status",
            put(permissions::set_status),
        )
        .layer(middleware::from_fn(require_roles(RoleSet::LEAD)));

    let manager = Router::new()
        .route("/api/manager/leaves", get(leaves::all))
        .route("/api/manager/lead-leaves", get(leaves::leads_and_hr))
        .route(
            "/api/manager/lead-permissions",
            get(permissions::leads_and_hr),
        )
        .layer(middleware::from_fn(require_roles(RoleSet::MANAGER)));

    let protected = Router::new()
        .merge(member)
        .merge(hr)
        .merge(lead)
        .merge(manager)
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(login)
        .merge(otp)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
