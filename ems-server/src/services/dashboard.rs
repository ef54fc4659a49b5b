//! Role-tagged dashboard summaries

use chrono::{DateTime, Utc};
use shared::calendar::DateWindow;
use shared::models::{
    Dashboard, DepartmentSummary, MemberSummary, OrganizationSummary, Role,
};
use shared::request::ListQuery;
use validator::Validate;

use crate::auth::Principal;
use crate::db::{Approval, Scope, Store};
use crate::error::ServiceResult;

pub async fn fetch_dashboard<S>(
    store: &S,
    principal: &Principal,
    query: &ListQuery,
    now: DateTime<Utc>,
) -> ServiceResult<Dashboard>
where
    S: Store + ?Sized,
{
    query.validate()?;
    let window = query.window(now.date_naive());

    let dashboard = match principal.role {
        Role::Admin | Role::Manager | Role::Hr => {
            Dashboard::Organization(organization(store, window, now).await?)
        }
        Role::DepartmentLead => {
            let department_id = principal.department()?;
            let member = member(store, principal.member_id()?, window).await?;
            Dashboard::Department(DepartmentSummary {
                member_count: store.count_members(department_id).await?,
                on_notice_count: store
                    .count_on_notice(Scope::Department(department_id), now)
                    .await?,
                leave_count: member.leave_count,
                approved_leave_count: member.approved_leave_count,
                permission_count: member.permission_count,
                approved_permission_count: member.approved_permission_count,
            })
        }
        Role::Employee => Dashboard::Member(member(store, principal.member_id()?, window).await?),
    };
    Ok(dashboard)
}

async fn organization<S>(
    store: &S,
    window: DateWindow,
    now: DateTime<Utc>,
) -> ServiceResult<OrganizationSummary>
where
    S: Store + ?Sized,
{
    let scope = Scope::Organization;
    Ok(OrganizationSummary {
        employee_count: store.count_staff().await?,
        on_notice_count: store.count_on_notice(scope, now).await?,
        leave_count: store.leave_tally(scope, window, Approval::Any).await?,
        approved_leave_count: store.leave_tally(scope, window, Approval::Approved).await?,
        pending_leave_count: store.leave_tally(scope, window, Approval::Pending).await?,
        permission_count: store.count_permissions(scope, window, Approval::Any).await?,
        approved_permission_count: store
            .count_permissions(scope, window, Approval::Approved)
            .await?,
        pending_permission_count: store
            .count_permissions(scope, window, Approval::Pending)
            .await?,
    })
}

async fn member<S>(store: &S, member_id: i64, window: DateWindow) -> ServiceResult<MemberSummary>
where
    S: Store + ?Sized,
{
    let scope = Scope::Member(member_id);
    Ok(MemberSummary {
        leave_count: store.leave_tally(scope, window, Approval::Any).await?,
        approved_leave_count: store.leave_tally(scope, window, Approval::Approved).await?,
        permission_count: store.count_permissions(scope, window, Approval::Any).await?,
        approved_permission_count: store
            .count_permissions(scope, window, Approval::Approved)
            .await?,
    })
}
