//! Authorization gate
//!
//! Resolves a bearer credential into a [`Principal`] and checks it against
//! the role set declared by a route. A signed token is only honoured while it
//! is still the user's stored token, so logout and password changes revoke it
//! immediately.

use shared::error::{AppError, ErrorCode};
use shared::models::{Role, RoleSet};

use super::jwt::{JwtError, JwtService};
use crate::db::UserStore;
use crate::error::ServiceResult;

/// Authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub role: Role,
    pub department_id: Option<i64>,
    pub department_member_id: Option<i64>,
}

impl Principal {
    /// Active membership id of the caller; leave, permission and notice
    /// operations act on it
    pub fn member_id(&self) -> Result<i64, AppError> {
        self.department_member_id
            .ok_or_else(|| AppError::new(ErrorCode::NotAssignedToDepartment))
    }

    /// The caller's department, required for department-scoped views
    pub fn department(&self) -> Result<i64, AppError> {
        self.department_id
            .ok_or_else(|| AppError::new(ErrorCode::NotAssignedToDepartment))
    }
}

/// Validate `header` and load the caller it names
pub async fn authenticate<S>(
    store: &S,
    jwt: &JwtService,
    header: Option<&str>,
) -> ServiceResult<Principal>
where
    S: UserStore + ?Sized,
{
    let Some(header) = header else {
        return Err(AppError::unauthorized().into());
    };
    let token = JwtService::extract_from_header(header)
        .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?;

    let claims = jwt.validate_token(token).map_err(|e| {
        tracing::warn!(error = %e, "Token validation failed");
        match e {
            JwtError::ExpiredToken => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid token"),
        }
    })?;

    let user_id: i64 = claims
        .sub
        .parse()
        .map_err(|_| AppError::invalid_token("Malformed token subject"))?;

    let account = store
        .account_by_id(user_id)
        .await?
        .ok_or_else(AppError::unauthorized)?;

    if account.token.as_deref() != Some(token) {
        tracing::warn!(user_id, "Stale session token presented");
        return Err(AppError::session_expired().into());
    }

    let role = Role::from_id(account.role_id)
        .ok_or_else(|| AppError::internal(format!("unknown role id {}", account.role_id)))?;

    Ok(Principal {
        user_id,
        role,
        department_id: account.department_id,
        department_member_id: account.department_member_id,
    })
}

/// Reject callers whose role is outside `allowed`
pub fn authorize(principal: &Principal, allowed: RoleSet) -> Result<(), AppError> {
    if allowed.contains(principal.role) {
        return Ok(());
    }
    tracing::warn!(
        user_id = principal.user_id,
        role = %principal.role,
        "Role not permitted"
    );
    Err(AppError::role_required(principal.role.name()))
}
