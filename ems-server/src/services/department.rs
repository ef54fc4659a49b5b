//! Department lifecycle and membership rules
//!
//! Every ordinary department has exactly one active DepartmentLead member;
//! the reserved HR department always keeps at least one HR member. The
//! operations below check those rules before handing the write to the store,
//! which applies each multi-row change in a single transaction.

use shared::error::{AppError, ErrorCode};
use shared::models::{
    CreateDepartment, Department, HR_DEPARTMENT_ID, MapUsers, Role, UnmapUser, UpdateDepartment,
    lead_role, member_role,
};
use validator::Validate;

use crate::db::{DepartmentStore, UserStore};
use crate::error::ServiceResult;

fn not_found() -> AppError {
    AppError::new(ErrorCode::DepartmentNotFound)
}

async fn ensure_lead_available<S>(
    store: &S,
    user_id: i64,
    role: Role,
    department_id: Option<i64>,
) -> ServiceResult<()>
where
    S: DepartmentStore + ?Sized,
{
    if store.is_assignable(user_id, role, department_id).await? {
        Ok(())
    } else {
        Err(AppError::new(ErrorCode::LeadNotAvailable)
            .with_detail("userId", user_id)
            .into())
    }
}

pub async fn create<S>(store: &S, req: &CreateDepartment) -> ServiceResult<Department>
where
    S: DepartmentStore + ?Sized,
{
    req.validate()?;

    if store.department_name_taken(&req.name, None).await? {
        return Err(AppError::new(ErrorCode::DepartmentNameExists).into());
    }
    ensure_lead_available(store, req.lead_id, Role::DepartmentLead, None).await?;

    let department = store.create_department(&req.name, req.lead_id).await?;
    tracing::info!(
        department_id = department.id,
        lead_id = req.lead_id,
        "Department created"
    );
    Ok(department)
}

/// Rename a department and make `lead_id` its only active member
pub async fn update<S>(store: &S, id: i64, req: &UpdateDepartment) -> ServiceResult<()>
where
    S: DepartmentStore + ?Sized,
{
    req.validate()?;

    store.find_department(id).await?.ok_or_else(not_found)?;
    if store.department_name_taken(&req.name, Some(id)).await? {
        return Err(AppError::new(ErrorCode::DepartmentNameExists).into());
    }
    ensure_lead_available(store, req.lead_id, lead_role(id), Some(id)).await?;

    store.reassign_lead(id, &req.name, req.lead_id).await?;
    tracing::info!(department_id = id, lead_id = req.lead_id, "Department updated");
    Ok(())
}

pub async fn remove<S>(store: &S, id: i64) -> ServiceResult<()>
where
    S: DepartmentStore + ?Sized,
{
    if id == HR_DEPARTMENT_ID {
        return Err(AppError::new(ErrorCode::ReservedDepartment).into());
    }
    store.find_department(id).await?.ok_or_else(not_found)?;

    store.remove_department(id).await?;
    tracing::info!(department_id = id, "Department removed");
    Ok(())
}

/// Map unmapped users of the department's member role; all or nothing
pub async fn map_users<S>(store: &S, id: i64, req: &MapUsers) -> ServiceResult<()>
where
    S: DepartmentStore + ?Sized,
{
    req.validate()?;
    store.find_department(id).await?.ok_or_else(not_found)?;

    let mut user_ids = req.user_ids.clone();
    user_ids.sort_unstable();
    user_ids.dedup();
    if user_ids.len() != req.user_ids.len() {
        return Err(AppError::new(ErrorCode::UsersNotAssignable).into());
    }

    let assignable = store.count_assignable(&user_ids, member_role(id)).await?;
    if assignable != user_ids.len() as i64 {
        return Err(AppError::new(ErrorCode::UsersNotAssignable)
            .with_detail("assignable", assignable)
            .with_detail("requested", user_ids.len())
            .into());
    }

    store.map_users(id, &user_ids).await?;
    tracing::info!(department_id = id, count = user_ids.len(), "Users mapped");
    Ok(())
}

/// Remove a user from their department, swapping in a replacement when the
/// department would otherwise lose its head
pub async fn unmap_user<S>(store: &S, req: &UnmapUser) -> ServiceResult<()>
where
    S: DepartmentStore + UserStore + ?Sized,
{
    let membership = store
        .membership_of(req.user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::MembershipNotFound))?;
    let role = store
        .find_user(req.user_id)
        .await?
        .and_then(|u| u.role())
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    let needs_replacement = match role {
        Role::DepartmentLead => true,
        Role::Hr => store.count_members(membership.department_id).await? <= 1,
        _ => false,
    };

    let replacement = if needs_replacement {
        let lead_id = req
            .lead_id
            .ok_or_else(|| AppError::new(ErrorCode::ReplacementLeadRequired))?;
        ensure_lead_available(store, lead_id, role, None).await?;
        Some(lead_id)
    } else {
        None
    };

    store.unmap(membership, replacement).await?;
    tracing::info!(
        user_id = req.user_id,
        department_id = membership.department_id,
        replacement = ?replacement,
        "User unmapped"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;

    fn code(err: crate::error::ServiceError) -> ErrorCode {
        AppError::from(err).code
    }

    fn create_req(name: &str, lead_id: i64) -> CreateDepartment {
        CreateDepartment {
            name: name.into(),
            lead_id,
        }
    }

    #[tokio::test]
    async fn test_engineering_scenario() {
        let store = MemoryStore::seeded();
        let lead = store.add_user(Role::DepartmentLead, "lead");

        let dept = create(&store, &create_req("Engineering", lead)).await.unwrap();
        assert_eq!(store.active_user_ids(dept.id), vec![lead]);

        let err = create(&store, &create_req("engineering", lead)).await.unwrap_err();
        assert_eq!(code(err), ErrorCode::DepartmentNameExists);

        let err = create(&store, &create_req("Platform", lead)).await.unwrap_err();
        assert_eq!(code(err), ErrorCode::LeadNotAvailable);
    }

    #[tokio::test]
    async fn test_create_requires_department_lead_role() {
        let store = MemoryStore::seeded();
        let emp = store.add_user(Role::Employee, "emp");
        let err = create(&store, &create_req("Sales", emp)).await.unwrap_err();
        assert_eq!(code(err), ErrorCode::LeadNotAvailable);
    }

    #[tokio::test]
    async fn test_update_leaves_only_new_lead() {
        let store = MemoryStore::seeded();
        let lead = store.add_user(Role::DepartmentLead, "lead");
        let next = store.add_user(Role::DepartmentLead, "next");
        let emp = store.add_user(Role::Employee, "emp");
        let dept = create(&store, &create_req("Engineering", lead)).await.unwrap();
        store.add_member(dept.id, emp);

        update(
            &store,
            dept.id,
            &UpdateDepartment {
                name: "Engineering".into(),
                lead_id: next,
            },
        )
        .await
        .unwrap();
        assert_eq!(store.active_user_ids(dept.id), vec![next]);

        // keeping the current lead is allowed and inserts nothing new
        update(
            &store,
            dept.id,
            &UpdateDepartment {
                name: "Core Engineering".into(),
                lead_id: next,
            },
        )
        .await
        .unwrap();
        assert_eq!(store.active_user_ids(dept.id), vec![next]);
        let saved = store.find_department(dept.id).await.unwrap().unwrap();
        assert_eq!(saved.name, "Core Engineering");
    }

    #[tokio::test]
    async fn test_rename_onto_other_department_name_is_rejected() {
        let store = MemoryStore::seeded();
        let lead_a = store.add_user(Role::DepartmentLead, "lead-a");
        let lead_b = store.add_user(Role::DepartmentLead, "lead-b");
        let a = create(&store, &create_req("Engineering", lead_a)).await.unwrap();
        let b = create(&store, &create_req("Sales", lead_b)).await.unwrap();

        let err = update(
            &store,
            b.id,
            &UpdateDepartment {
                name: "ENGINEERING".into(),
                lead_id: lead_b,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(code(err), ErrorCode::DepartmentNameExists);
        let saved = store.find_department(b.id).await.unwrap().unwrap();
        assert_eq!(saved.name, "Sales");

        // a department may keep its own name
        update(
            &store,
            a.id,
            &UpdateDepartment {
                name: "Engineering".into(),
                lead_id: lead_a,
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_update_hr_department_validates_hr_role() {
        let store = MemoryStore::seeded();
        let lead = store.add_user(Role::DepartmentLead, "lead");
        let err = update(
            &store,
            HR_DEPARTMENT_ID,
            &UpdateDepartment {
                name: "Human Resource".into(),
                lead_id: lead,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(code(err), ErrorCode::LeadNotAvailable);

        let err = update(
            &store,
            999,
            &UpdateDepartment {
                name: "Ghost".into(),
                lead_id: lead,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(code(err), ErrorCode::DepartmentNotFound);
    }

    #[tokio::test]
    async fn test_hr_department_cannot_be_removed() {
        let store = MemoryStore::seeded();
        let err = remove(&store, HR_DEPARTMENT_ID).await.unwrap_err();
        assert_eq!(code(err), ErrorCode::ReservedDepartment);
        assert!(store.find_department(HR_DEPARTMENT_ID).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_remove_deactivates_members() {
        let store = MemoryStore::seeded();
        let lead = store.add_user(Role::DepartmentLead, "lead");
        let dept = create(&store, &create_req("Engineering", lead)).await.unwrap();

        remove(&store, dept.id).await.unwrap();
        assert!(store.active_user_ids(dept.id).is_empty());
        assert!(store.membership_of(lead).await.unwrap().is_none());

        let err = remove(&store, dept.id).await.unwrap_err();
        assert_eq!(code(err), ErrorCode::DepartmentNotFound);
    }

    #[tokio::test]
    async fn test_map_users_is_all_or_nothing() {
        let store = MemoryStore::seeded();
        let lead = store.add_user(Role::DepartmentLead, "lead");
        let a = store.add_user(Role::Employee, "a");
        let b = store.add_user(Role::Employee, "b");
        let hr = store.add_user(Role::Hr, "hr");
        let dept = create(&store, &create_req("Engineering", lead)).await.unwrap();

        let err = map_users(&store, dept.id, &MapUsers { user_ids: vec![a, hr] })
            .await
            .unwrap_err();
        assert_eq!(code(err), ErrorCode::UsersNotAssignable);
        assert_eq!(store.active_user_ids(dept.id), vec![lead]);

        let err = map_users(&store, dept.id, &MapUsers { user_ids: vec![a, a] })
            .await
            .unwrap_err();
        assert_eq!(code(err), ErrorCode::UsersNotAssignable);

        map_users(&store, dept.id, &MapUsers { user_ids: vec![a, b] })
            .await
            .unwrap();
        assert_eq!(store.active_user_ids(dept.id), vec![lead, a, b]);

        // HR users belong in the HR department
        map_users(&store, HR_DEPARTMENT_ID, &MapUsers { user_ids: vec![hr] })
            .await
            .unwrap();
        assert_eq!(store.active_user_ids(HR_DEPARTMENT_ID), vec![hr]);
    }

    #[tokio::test]
    async fn test_unmap_lead_requires_replacement() {
        let store = MemoryStore::seeded();
        let lead = store.add_user(Role::DepartmentLead, "lead");
        let next = store.add_user(Role::DepartmentLead, "next");
        let dept = create(&store, &create_req("Engineering", lead)).await.unwrap();

        let err = unmap_user(&store, &UnmapUser { user_id: lead, lead_id: None })
            .await
            .unwrap_err();
        assert_eq!(code(err), ErrorCode::ReplacementLeadRequired);

        let emp = store.add_user(Role::Employee, "emp");
        let err = unmap_user(
            &store,
            &UnmapUser {
                user_id: lead,
                lead_id: Some(emp),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(code(err), ErrorCode::LeadNotAvailable);
        assert_eq!(store.active_user_ids(dept.id), vec![lead]);

        unmap_user(
            &store,
            &UnmapUser {
                user_id: lead,
                lead_id: Some(next),
            },
        )
        .await
        .unwrap();
        assert_eq!(store.active_user_ids(dept.id), vec![next]);
    }

    #[tokio::test]
    async fn test_unmap_last_hr_requires_replacement() {
        let store = MemoryStore::seeded();
        let hr = store.add_user(Role::Hr, "hr");
        let other = store.add_user(Role::Hr, "other");
        store.add_member(HR_DEPARTMENT_ID, hr);

        let err = unmap_user(&store, &UnmapUser { user_id: hr, lead_id: None })
            .await
            .unwrap_err();
        assert_eq!(code(err), ErrorCode::ReplacementLeadRequired);

        store.add_member(HR_DEPARTMENT_ID, other);
        unmap_user(&store, &UnmapUser { user_id: hr, lead_id: None })
            .await
            .unwrap();
        assert_eq!(store.active_user_ids(HR_DEPARTMENT_ID), vec![other]);
    }

    #[tokio::test]
    async fn test_unmap_employee_and_missing_membership() {
        let store = MemoryStore::seeded();
        let lead = store.add_user(Role::DepartmentLead, "lead");
        let emp = store.add_user(Role::Employee, "emp");
        let dept = create(&store, &create_req("Engineering", lead)).await.unwrap();
        store.add_member(dept.id, emp);

        unmap_user(&store, &UnmapUser { user_id: emp, lead_id: None })
            .await
            .unwrap();
        assert_eq!(store.active_user_ids(dept.id), vec![lead]);

        let err = unmap_user(&store, &UnmapUser { user_id: emp, lead_id: None })
            .await
            .unwrap_err();
        assert_eq!(code(err), ErrorCode::MembershipNotFound);
    }
}
