//! Permission (short absence) Request Model

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::pagination::Paginated;

/// Maximum permission requests per member per billing month
pub const PERMISSION_QUOTA: i64 = 3;

/// Permission request entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct PermissionRequest {
    pub id: i64,
    pub department_member_id: i64,
    pub reason: String,
    pub date: NaiveDate,
    pub from_time: NaiveTime,
    pub to_time: NaiveTime,
    pub is_approved: Option<bool>,
    pub approved_by: Option<i64>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Permission request with requester info (for list views)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct PermissionListItem {
    pub id: i64,
    pub department_member_id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub code: String,
    pub department_name: String,
    pub reason: String,
    pub date: NaiveDate,
    pub from_time: NaiveTime,
    pub to_time: NaiveTime,
    pub is_approved: Option<bool>,
    pub approved_by: Option<i64>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A member's own permissions plus the count for the window
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPermissions {
    #[serde(flatten)]
    pub page: Paginated<PermissionListItem>,
    pub permission_count: i64,
}

/// Request/update permission payload; date and times are validated server-side
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RequestPermission {
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
    pub date: String,
    pub from_time: String,
    pub to_time: String,
}
