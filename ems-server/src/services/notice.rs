//! Notice periods

use chrono::Duration;
use shared::error::{AppError, ErrorCode};
use shared::models::{ApplyNotice, ApproveNotice, Notice, Role};
use validator::Validate;

use crate::auth::Principal;
use crate::db::{DepartmentStore, NoticeStore, UserStore};
use crate::error::ServiceResult;

pub async fn apply<S>(store: &S, principal: &Principal, req: &ApplyNotice) -> ServiceResult<Notice>
where
    S: NoticeStore + DepartmentStore + ?Sized,
{
    req.validate()?;
    let member_id = principal.member_id()?;
    store
        .find_membership(member_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MembershipNotFound))?;

    let notice = store.insert_notice(member_id, req.remarks.trim()).await?;
    tracing::info!(notice_id = notice.id, member_id, "Notice applied");
    Ok(notice)
}

/// Approve the member's latest notice; it ends `serve_days` after it was
/// applied. HR approves Employees only.
pub async fn approve<S>(store: &S, principal: &Principal, req: &ApproveNotice) -> ServiceResult<Notice>
where
    S: NoticeStore + DepartmentStore + UserStore + ?Sized,
{
    if req.serve_days <= 0 {
        return Err(AppError::new(ErrorCode::InvalidServeDays)
            .with_detail("serveDays", req.serve_days)
            .into());
    }
    req.validate()?;

    let membership = store
        .find_membership(req.department_member_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MembershipNotFound))?;

    if membership.user_id == principal.user_id {
        return Err(AppError::permission_denied("cannot approve your own notice").into());
    }
    if principal.role == Role::Hr {
        let target = store.find_user(membership.user_id).await?.and_then(|u| u.role());
        if target != Some(Role::Employee) {
            return Err(AppError::permission_denied("HR approves employee notices only").into());
        }
    }

    let notice = store
        .latest_notice(membership.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::NoticeNotFound))?;
    let end_date = notice.created_at + Duration::days(req.serve_days);

    let approved = store
        .approve_notice(notice.id, principal.user_id, end_date)
        .await?;
    tracing::info!(
        notice_id = approved.id,
        member_id = membership.id,
        approver_id = principal.user_id,
        end_date = %end_date,
        "Notice approved"
    );
    Ok(approved)
}

/// Latest notice of the caller, if any
pub async fn fetch_own_notice<S>(store: &S, principal: &Principal) -> ServiceResult<Option<Notice>>
where
    S: NoticeStore + ?Sized,
{
    let member_id = principal.member_id()?;
    Ok(store.latest_notice(member_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;

    fn principal(store: &MemoryStore, role: Role, tag: &str, dept: i64) -> Principal {
        let user_id = store.add_user(role, tag);
        let member = store.add_member(dept, user_id);
        Principal {
            user_id,
            role,
            department_id: Some(dept),
            department_member_id: Some(member),
        }
    }

    fn remarks(text: &str) -> ApplyNotice {
        ApplyNotice {
            remarks: text.into(),
        }
    }

    fn code(err: crate::error::ServiceError) -> ErrorCode {
        AppError::from(err).code
    }

    #[tokio::test]
    async fn test_approval_sets_end_from_latest_notice() {
        let store = MemoryStore::seeded();
        let dept = store.add_department("Engineering");
        let emp = principal(&store, Role::Employee, "emp", dept);
        let hr = principal(&store, Role::Hr, "hr", shared::models::HR_DEPARTMENT_ID);

        let first = apply(&store, &emp, &remarks("relocating")).await.unwrap();
        store.backdate_notice(first.id, 3);
        let latest = apply(&store, &emp, &remarks("relocating, final")).await.unwrap();

        let approved = approve(
            &store,
            &hr,
            &ApproveNotice {
                department_member_id: emp.department_member_id.unwrap(),
                serve_days: 30,
            },
        )
        .await
        .unwrap();
        assert_eq!(approved.id, latest.id);
        assert!(approved.is_approved);
        assert_eq!(approved.approved_by, Some(hr.user_id));
        assert_eq!(
            approved.notice_end_date,
            Some(latest.created_at + Duration::days(30))
        );

        let own = fetch_own_notice(&store, &emp).await.unwrap().unwrap();
        assert_eq!(own.id, latest.id);
    }

    #[tokio::test]
    async fn test_approval_errors() {
        let store = MemoryStore::seeded();
        let dept = store.add_department("Engineering");
        let emp = principal(&store, Role::Employee, "emp", dept);
        let lead = principal(&store, Role::DepartmentLead, "lead", dept);
        let hr = principal(&store, Role::Hr, "hr", shared::models::HR_DEPARTMENT_ID);
        let member_id = emp.department_member_id.unwrap();

        let err = approve(
            &store,
            &hr,
            &ApproveNotice {
                department_member_id: member_id,
                serve_days: 0,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(code(err), ErrorCode::InvalidServeDays);

        let err = approve(
            &store,
            &hr,
            &ApproveNotice {
                department_member_id: member_id,
                serve_days: 10,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(code(err), ErrorCode::NoticeNotFound);

        let err = approve(
            &store,
            &hr,
            &ApproveNotice {
                department_member_id: 9999,
                serve_days: 10,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(code(err), ErrorCode::MembershipNotFound);

        // HR cannot approve a lead's notice, or their own
        apply(&store, &lead, &remarks("moving on")).await.unwrap();
        let err = approve(
            &store,
            &hr,
            &ApproveNotice {
                department_member_id: lead.department_member_id.unwrap(),
                serve_days: 10,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(code(err), ErrorCode::PermissionDenied);

        apply(&store, &hr, &remarks("leaving")).await.unwrap();
        let err = approve(
            &store,
            &hr,
            &ApproveNotice {
                department_member_id: hr.department_member_id.unwrap(),
                serve_days: 10,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(code(err), ErrorCode::PermissionDenied);
    }

    #[tokio::test]
    async fn test_no_notice_for_unassigned_caller() {
        let store = MemoryStore::seeded();
        let manager = Principal {
            user_id: 1,
            role: Role::Manager,
            department_id: None,
            department_member_id: None,
        };
        let err = apply(&store, &manager, &remarks("x")).await.unwrap_err();
        assert_eq!(code(err), ErrorCode::NotAssignedToDepartment);
    }
}
