//! Leave request lifecycle

use chrono::{DateTime, NaiveDate, Utc};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    LeaveDateInput, LeaveDay, MemberLeaves, RequestLeave, Role, UpdateApproval,
};
use shared::pagination::Paginated;
use shared::request::ListQuery;
use shared::util::parse_date;
use validator::Validate;

use crate::auth::Principal;
use crate::db::{Admission, Approval, DepartmentStore, LeaveStore, RequestRecord, Scope};
use crate::error::ServiceResult;

/// Validate client dates; half days must name their session
pub fn parse_days(inputs: &[LeaveDateInput]) -> Result<Vec<LeaveDay>, AppError> {
    if inputs.is_empty() {
        return Err(AppError::new(ErrorCode::LeaveDatesRequired));
    }

    let mut days: Vec<LeaveDay> = Vec::with_capacity(inputs.len());
    for input in inputs {
        let date = parse_date(&input.date).ok_or_else(|| {
            AppError::new(ErrorCode::InvalidLeaveDate).with_detail("date", input.date.clone())
        })?;
        if days.iter().any(|d| d.date == date) {
            return Err(AppError::new(ErrorCode::InvalidLeaveDate)
                .with_detail("date", input.date.clone())
                .with_detail("reason", "duplicate"));
        }
        if !input.is_full_day && input.session_type.is_none() {
            return Err(AppError::validation("sessionType is required for a half-day leave")
                .with_detail("date", input.date.clone()));
        }
        days.push(LeaveDay {
            date,
            is_full_day: input.is_full_day,
            session_type: if input.is_full_day {
                None
            } else {
                input.session_type
            },
        });
    }
    Ok(days)
}

fn pending_error(role: Role) -> AppError {
    let message = if role == Role::Employee {
        "last leave request is in the pending state, please contact the TL"
    } else {
        "last leave request is in the pending state. please contact the Manager"
    };
    AppError::with_message(ErrorCode::LeaveRequestPending, message)
}

/// Active leave owned by the caller
async fn owned_leave<S>(store: &S, principal: &Principal, id: i64) -> ServiceResult<RequestRecord>
where
    S: LeaveStore + ?Sized,
{
    let member_id = principal.member_id()?;
    let record = store
        .find_leave(id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::LeaveNotFound))?;
    if record.department_member_id != member_id {
        return Err(AppError::new(ErrorCode::LeaveNotFound).into());
    }
    Ok(record)
}

pub async fn request_leave<S>(store: &S, principal: &Principal, req: &RequestLeave) -> ServiceResult<i64>
where
    S: LeaveStore + DepartmentStore + ?Sized,
{
    req.validate()?;
    let member_id = principal.member_id()?;
    store
        .find_membership(member_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MembershipNotFound))?;
    let days = parse_days(&req.dates)?;

    match store.insert_leave(member_id, req.reason.trim(), &days).await? {
        Admission::Admitted(id) => {
            tracing::info!(leave_id = id, member_id, days = days.len(), "Leave requested");
            Ok(id)
        }
        Admission::PendingExists | Admission::QuotaExceeded => {
            Err(pending_error(principal.role).into())
        }
    }
}

/// Replace the reason and date set of an undecided or rejected request
pub async fn update_leave<S>(
    store: &S,
    principal: &Principal,
    id: i64,
    req: &RequestLeave,
) -> ServiceResult<()>
where
    S: LeaveStore + ?Sized,
{
    req.validate()?;
    let record = owned_leave(store, principal, id).await?;
    if record.is_approved == Some(true) {
        return Err(AppError::new(ErrorCode::LeaveAlreadyApproved).into());
    }
    let days = parse_days(&req.dates)?;

    store.replace_leave(id, req.reason.trim(), &days).await?;
    tracing::info!(leave_id = id, days = days.len(), "Leave updated");
    Ok(())
}

pub async fn remove_leave<S>(store: &S, principal: &Principal, id: i64) -> ServiceResult<()>
where
    S: LeaveStore + ?Sized,
{
    let record = owned_leave(store, principal, id).await?;
    if record.is_approved == Some(true) {
        return Err(AppError::with_message(
            ErrorCode::LeaveAlreadyApproved,
            "approved leave request cannot be removed",
        )
        .into());
    }

    store.remove_leave(id).await?;
    tracing::info!(leave_id = id, "Leave removed");
    Ok(())
}

/// Approve or reject; leads decide only within their own department and
/// nobody decides their own request
pub async fn update_leave_status<S>(
    store: &S,
    principal: &Principal,
    id: i64,
    req: UpdateApproval,
    now: DateTime<Utc>,
) -> ServiceResult<()>
where
    S: LeaveStore + ?Sized,
{
    let record = store
        .find_leave(id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::LeaveNotFound))?;

    if principal.department_member_id == Some(record.department_member_id) {
        return Err(AppError::permission_denied("cannot decide your own leave request").into());
    }
    if principal.role == Role::DepartmentLead && principal.department()? != record.department_id {
        return Err(AppError::new(ErrorCode::LeaveNotFound).into());
    }

    store
        .set_leave_status(id, principal.user_id, req.is_approved, now)
        .await?;
    tracing::info!(
        leave_id = id,
        approver_id = principal.user_id,
        approved = req.is_approved,
        "Leave decided"
    );
    Ok(())
}

/// The caller's leaves in the resolved window with their day tally
pub async fn fetch_own_leaves<S>(
    store: &S,
    principal: &Principal,
    query: &ListQuery,
    today: NaiveDate,
) -> ServiceResult<MemberLeaves>
where
    S: LeaveStore + ?Sized,
{
    query.validate()?;
    let member_id = principal.member_id()?;
    let window = query.window(today);

    let (items, total) = store.member_leaves(member_id, window, query.slice()).await?;
    let leave_count = store
        .leave_tally(Scope::Member(member_id), window, Approval::Any)
        .await?;

    Ok(MemberLeaves {
        page: Paginated::new(total, query.page, items),
        leave_count,
    })
}
