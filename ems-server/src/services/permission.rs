//! Permission (one-hour absence) request lifecycle
//!
//! A member may hold at most [`PERMISSION_QUOTA`] requests per billing cycle,
//! counted against the cycle the requested date falls into, and only one
//! undecided request at a time.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use shared::calendar::{BillingMonth, DateWindow};
use shared::error::{AppError, ErrorCode};
use shared::models::{MemberPermissions, PERMISSION_QUOTA, RequestPermission, Role, UpdateApproval};
use shared::pagination::Paginated;
use shared::request::ListQuery;
use shared::util::{parse_date, parse_time_of_day};
use validator::Validate;

use crate::auth::Principal;
use crate::db::{
    Admission, Approval, DepartmentStore, PermissionSlot, PermissionStore, RequestRecord, Scope,
};
use crate::error::ServiceResult;

/// Parsed slot and the billing window its quota is counted in
pub fn parse_slot(req: &RequestPermission) -> Result<(PermissionSlot, DateWindow), AppError> {
    let date = parse_date(&req.date).ok_or_else(|| {
        AppError::new(ErrorCode::InvalidPermissionDate).with_detail("date", req.date.clone())
    })?;

    let time = |raw: &str, field: &str| {
        parse_time_of_day(raw).ok_or_else(|| {
            AppError::with_message(ErrorCode::InvalidFormat, format!("{field} must be HH:MM"))
                .with_detail("value", raw.to_string())
        })
    };
    let from_time = time(&req.from_time, "fromTime")?;
    let to_time = time(&req.to_time, "toTime")?;

    if to_time.signed_duration_since(from_time) != Duration::hours(1) {
        return Err(AppError::new(ErrorCode::InvalidTimeWindow)
            .with_detail("fromTime", req.from_time.clone())
            .with_detail("toTime", req.to_time.clone()));
    }

    let window = BillingMonth::of_date(date).window().ok_or_else(|| {
        AppError::new(ErrorCode::InvalidPermissionDate).with_detail("date", req.date.clone())
    })?;

    Ok((
        PermissionSlot {
            reason: req.reason.trim().to_string(),
            date,
            from_time,
            to_time,
        },
        window,
    ))
}

fn pending_error(role: Role) -> AppError {
    let message = if role == Role::Employee {
        "last permission request is in the pending state. please contact the TL"
    } else {
        "last permission request is in the pending state. please contact the Manager"
    };
    AppError::with_message(ErrorCode::PermissionRequestPending, message)
}

fn quota_error() -> AppError {
    AppError::new(ErrorCode::PermissionQuotaExceeded).with_detail("quota", PERMISSION_QUOTA)
}

async fn owned_permission<S>(
    store: &S,
    principal: &Principal,
    id: i64,
) -> ServiceResult<RequestRecord>
where
    S: PermissionStore + ?Sized,
{
    let member_id = principal.member_id()?;
    match store.find_permission(id).await? {
        Some(record) if record.department_member_id == member_id => Ok(record),
        _ => Err(AppError::new(ErrorCode::PermissionRequestNotFound).into()),
    }
}

pub async fn request<S>(store: &S, principal: &Principal, req: &RequestPermission) -> ServiceResult<i64>
where
    S: PermissionStore + DepartmentStore + ?Sized,
{
    req.validate()?;
    let member_id = principal.member_id()?;
    store
        .find_membership(member_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MembershipNotFound))?;
    let (slot, window) = parse_slot(req)?;

    match store
        .insert_permission(member_id, &slot, window, PERMISSION_QUOTA)
        .await?
    {
        Admission::Admitted(id) => {
            tracing::info!(permission_id = id, member_id, date = %slot.date, "Permission requested");
            Ok(id)
        }
        Admission::QuotaExceeded => Err(quota_error().into()),
        Admission::PendingExists => Err(pending_error(principal.role).into()),
    }
}

pub async fn update<S>(
    store: &S,
    principal: &Principal,
    id: i64,
    req: &RequestPermission,
) -> ServiceResult<()>
where
    S: PermissionStore + ?Sized,
{
    req.validate()?;
    let record = owned_permission(store, principal, id).await?;
    if record.is_approved == Some(true) {
        return Err(AppError::new(ErrorCode::PermissionRequestApproved).into());
    }
    let (slot, window) = parse_slot(req)?;

    match store
        .update_permission(id, &slot, window, PERMISSION_QUOTA)
        .await?
    {
        Admission::Admitted(()) => {
            tracing::info!(permission_id = id, date = %slot.date, "Permission updated");
            Ok(())
        }
        Admission::QuotaExceeded => Err(quota_error().into()),
        Admission::PendingExists => Err(pending_error(principal.role).into()),
    }
}

pub async fn remove<S>(store: &S, principal: &Principal, id: i64) -> ServiceResult<()>
where
    S: PermissionStore + ?Sized,
{
    let record = owned_permission(store, principal, id).await?;
    if record.is_approved == Some(true) {
        return Err(AppError::new(ErrorCode::PermissionRequestApproved).into());
    }
    store.remove_permission(id).await?;
    tracing::info!(permission_id = id, "Permission removed");
    Ok(())
}

pub async fn set_status<S>(
    store: &S,
    principal: &Principal,
    id: i64,
    req: UpdateApproval,
    now: DateTime<Utc>,
) -> ServiceResult<()>
where
    S: PermissionStore + ?Sized,
{
    let record = store
        .find_permission(id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::PermissionRequestNotFound))?;

    if principal.department_member_id == Some(record.department_member_id) {
        return Err(AppError::permission_denied("cannot decide your own permission request").into());
    }
    if principal.role == Role::DepartmentLead && principal.department()? != record.department_id {
        return Err(AppError::new(ErrorCode::PermissionRequestNotFound).into());
    }

    store
        .set_permission_status(id, principal.user_id, req.is_approved, now)
        .await?;
    tracing::info!(
        permission_id = id,
        approver_id = principal.user_id,
        approved = req.is_approved,
        "Permission decided"
    );
    Ok(())
}

pub async fn fetch_own_permissions<S>(
    store: &S,
    principal: &Principal,
    query: &ListQuery,
    today: NaiveDate,
) -> ServiceResult<MemberPermissions>
where
    S: PermissionStore + ?Sized,
{
    query.validate()?;
    let member_id = principal.member_id()?;
    let window = query.window(today);

    let (items, total) = store
        .member_permissions(member_id, window, query.slice())
        .await?;
    let permission_count = store
        .count_permissions(Scope::Member(member_id), window, Approval::Any)
        .await?;

    Ok(MemberPermissions {
        page: Paginated::new(total, query.page, items),
        permission_count,
    })
}
