//! Principal extractor for handlers behind [`require_auth`](super::middleware::require_auth)

use axum::{extract::FromRequestParts, http::request::Parts};
use shared::error::AppError;

use super::gate::Principal;

impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .copied()
            .ok_or_else(AppError::unauthorized)
    }
}
