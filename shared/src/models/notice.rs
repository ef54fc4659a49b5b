//! Notice Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Notice entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub id: i64,
    pub department_member_id: i64,
    pub remarks: String,
    pub notice_end_date: Option<DateTime<Utc>>,
    pub is_approved: bool,
    pub approved_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Notice with member info (for list views)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct NoticeListItem {
    pub id: i64,
    pub department_member_id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub code: String,
    pub role_id: i32,
    pub department_name: String,
    pub remarks: String,
    pub notice_end_date: Option<DateTime<Utc>>,
    pub is_approved: bool,
    pub approved_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplyNotice {
    #[validate(length(min = 1, max = 1000))]
    pub remarks: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApproveNotice {
    pub department_member_id: i64,
    #[validate(range(min = 1, max = 365))]
    pub serve_days: i64,
}
