//! Department Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::role::Role;

/// Reserved department every HR user belongs to; it can never be removed
pub const HR_DEPARTMENT_ID: i64 = 1;
pub const HR_DEPARTMENT_NAME: &str = "Human Resource";

/// Role that heads `department_id`: HR for the HR department, a
/// DepartmentLead everywhere else
pub const fn lead_role(department_id: i64) -> Role {
    if department_id == HR_DEPARTMENT_ID {
        Role::Hr
    } else {
        Role::DepartmentLead
    }
}

/// Role of the rank-and-file members mapped into `department_id`
pub const fn member_role(department_id: i64) -> Role {
    if department_id == HR_DEPARTMENT_ID {
        Role::Hr
    } else {
        Role::Employee
    }
}

/// Department entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Department {
    pub fn is_hr(&self) -> bool {
        self.id == HR_DEPARTMENT_ID
    }
}

/// Active user-to-department assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub id: i64,
    pub department_id: i64,
    pub user_id: i64,
}

/// Department with its lead and head count (for list views)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct DepartmentListItem {
    pub id: i64,
    pub name: String,
    pub lead_id: Option<i64>,
    pub lead_first_name: Option<String>,
    pub lead_last_name: Option<String>,
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Department member row, lead first
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct DepartmentMemberItem {
    pub department_member_id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub code: String,
    pub email: String,
    pub role_id: i32,
    pub is_lead: bool,
}

/// Create department payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDepartment {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub lead_id: i64,
}

/// Update department payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDepartment {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub lead_id: i64,
}

/// Map users payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MapUsers {
    #[validate(length(min = 1))]
    pub user_ids: Vec<i64>,
}

/// Unmap user payload
///
/// `lead_id` names the replacement when the user being unmapped heads the
/// department.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmapUser {
    pub user_id: i64,
    pub lead_id: Option<i64>,
}
