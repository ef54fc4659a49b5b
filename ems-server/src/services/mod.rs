//! Business rules
//!
//! Each operation validates its input, checks the caller's scope and the
//! department and request invariants, then commits through the store traits
//! in [`crate::db`]. Nothing here touches SQL directly.

pub mod auth;
pub mod dashboard;
pub mod department;
pub mod leave;
pub mod notice;
pub mod permission;
pub mod sweep;
pub mod user;

use shared::error::AppError;

/// Password hash or internal error
pub(crate) fn hash(password: &str) -> Result<String, AppError> {
    crate::util::hash_password(password).map_err(|e| {
        tracing::error!(error = %e, "Password hashing failed");
        AppError::internal("password hashing failed")
    })
}
