//! Authentication middleware
//!
//! [`require_auth`] resolves the caller on every protected route and stores
//! the [`Principal`] in the request extensions; [`require_roles`] then checks
//! the role set declared for a route group.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::error::AppError;
use shared::models::RoleSet;

use super::gate::{Principal, authenticate, authorize};
use crate::state::AppState;

/// Resolve `Authorization` into a [`Principal`]
///
/// CORS preflight requests pass through untouched.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let principal = authenticate(&state.store, &state.jwt, header).await?;
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

/// Role-set gate for a route group
///
/// ```ignore
/// Router::new()
///     .route("/api/roles", get(roles::list))
///     .layer(middleware::from_fn(require_roles(RoleSet::HR)));
/// ```
pub fn require_roles(
    allowed: RoleSet,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let principal = req
                .extensions()
                .get::<Principal>()
                .ok_or_else(AppError::unauthorized)?;
            authorize(principal, allowed)?;
            Ok(next.run(req).await)
        })
    }
}
