//! User administration, passwords and personal details

use shared::error::{AppError, ErrorCode};
use shared::models::{
    ChangePassword, CreateUser, ResetPassword, Role, RoleSet, UpdateUser, UpsertUserDetails, User,
    UserDetails,
};
use validator::Validate;

use super::hash;
use crate::auth::{Principal, authorize};
use crate::db::{DepartmentStore, DetailsField, IdentityField, NewUser, UserStore};
use crate::error::ServiceResult;
use crate::util::verify_password;

/// Roles HR can hand out; Admin and Manager accounts are only seeded
fn assignable_role(role_id: i32) -> Result<Role, AppError> {
    Role::from_id(role_id)
        .filter(|r| matches!(r, Role::Hr | Role::DepartmentLead | Role::Employee))
        .ok_or_else(|| AppError::new(ErrorCode::RoleNotAssignable).with_detail("roleId", role_id))
}

async fn check_identity<S>(
    store: &S,
    code: &str,
    email: &str,
    mobile: &str,
    exclude: Option<i64>,
) -> ServiceResult<()>
where
    S: UserStore + ?Sized,
{
    let conflict = store.identity_conflict(code, email, mobile, exclude).await?;
    match conflict {
        Some(IdentityField::Code) => Err(AppError::new(ErrorCode::UserCodeExists).into()),
        Some(IdentityField::Email) => Err(AppError::new(ErrorCode::UserEmailExists).into()),
        Some(IdentityField::Mobile) => Err(AppError::new(ErrorCode::UserMobileExists).into()),
        None => Ok(()),
    }
}

pub async fn create_user<S>(store: &S, req: &CreateUser) -> ServiceResult<User>
where
    S: UserStore + ?Sized,
{
    req.validate()?;
    let role = assignable_role(req.role_id)?;

    let (code, email, mobile) = (req.code.trim(), req.email.trim(), req.mobile.trim());
    check_identity(store, code, email, mobile, None).await?;

    let user = store
        .insert_user(&NewUser {
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            email: email.to_string(),
            mobile: mobile.to_string(),
            code: code.to_string(),
            password_hash: hash(&req.password)?,
            role,
            manager_id: store.default_manager().await?,
        })
        .await?;

    tracing::info!(user_id = user.id, role = %role, "User created");
    Ok(user)
}

/// Role changes are refused while the user is mapped to a department, so a
/// department never loses its lead through an edit
pub async fn update_user<S>(store: &S, user_id: i64, req: &UpdateUser) -> ServiceResult<User>
where
    S: UserStore + DepartmentStore + ?Sized,
{
    req.validate()?;

    let current = store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    if req.role_id != current.role_id {
        assignable_role(req.role_id)?;
        if store.membership_of(user_id).await?.is_some() {
            return Err(AppError::new(ErrorCode::UserMappedToDepartment).into());
        }
    }

    let update = UpdateUser {
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        email: req.email.trim().to_string(),
        mobile: req.mobile.trim().to_string(),
        code: req.code.trim().to_string(),
        role_id: req.role_id,
    };
    check_identity(store, &update.code, &update.email, &update.mobile, Some(user_id)).await?;

    store
        .update_user(user_id, &update)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound).into())
}

/// Soft-delete a user; leads and HR must be unmapped first
pub async fn remove_user<S>(store: &S, user_id: i64) -> ServiceResult<()>
where
    S: UserStore + DepartmentStore + ?Sized,
{
    let user = store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    let lead_like = user.role().is_some_and(|r| r.is_lead_like());
    if lead_like && store.membership_of(user_id).await?.is_some() {
        return Err(AppError::new(ErrorCode::UserMappedToDepartment).into());
    }

    store.remove_user(user_id).await?;
    tracing::info!(user_id, "User removed");
    Ok(())
}

pub async fn fetch_user<S>(store: &S, user_id: i64) -> ServiceResult<User>
where
    S: UserStore + ?Sized,
{
    store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound).into())
}

/// Set a new password for the caller and end their session
pub async fn reset_password<S>(store: &S, principal: &Principal, req: &ResetPassword) -> ServiceResult<()>
where
    S: UserStore + ?Sized,
{
    req.validate()?;
    store
        .set_password(principal.user_id, &hash(&req.password)?)
        .await?;
    tracing::info!(user_id = principal.user_id, "Password reset");
    Ok(())
}

pub async fn change_password<S>(
    store: &S,
    principal: &Principal,
    req: &ChangePassword,
) -> ServiceResult<()>
where
    S: UserStore + ?Sized,
{
    req.validate()?;

    let account = store
        .account_by_id(principal.user_id)
        .await?
        .ok_or_else(AppError::unauthorized)?;
    if !verify_password(&req.old_password, &account.password_hash) {
        return Err(AppError::new(ErrorCode::PasswordMismatch).into());
    }

    store
        .set_password(principal.user_id, &hash(&req.new_password)?)
        .await?;
    tracing::info!(user_id = principal.user_id, "Password changed");
    Ok(())
}

/// Whose details a request addresses: the caller's own unless an HR-level
/// caller names someone else
fn details_target(principal: &Principal, user_id: Option<i64>) -> Result<i64, AppError> {
    match user_id {
        Some(id) if id != principal.user_id => {
            authorize(principal, RoleSet::HR)?;
            Ok(id)
        }
        _ => Ok(principal.user_id),
    }
}

pub async fn upsert_details<S>(
    store: &S,
    principal: &Principal,
    req: UpsertUserDetails,
) -> ServiceResult<UserDetails>
where
    S: UserStore + ?Sized,
{
    req.validate()?;
    let user_id = details_target(principal, req.user_id)?;

    if store.find_user(user_id).await?.is_none() {
        return Err(AppError::new(ErrorCode::UserNotFound).into());
    }

    let details = req.into_details(user_id);
    let conflict = store
        .details_conflict(user_id, details.aadhar.as_deref(), details.pan.as_deref())
        .await?;
    match conflict {
        Some(DetailsField::Aadhar) => return Err(AppError::new(ErrorCode::AadharExists).into()),
        Some(DetailsField::Pan) => return Err(AppError::new(ErrorCode::PanExists).into()),
        None => {}
    }

    Ok(store.upsert_details(&details).await?)
}

/// Details of a user; an empty record when none were saved yet
pub async fn fetch_details<S>(
    store: &S,
    principal: &Principal,
    user_id: Option<i64>,
) -> ServiceResult<UserDetails>
where
    S: UserStore + ?Sized,
{
    let user_id = details_target(principal, user_id)?;
    Ok(store
        .find_details(user_id)
        .await?
        .unwrap_or_else(|| UserDetails {
            user_id,
            ..Default::default()
        }))
}
