//! Leave Request Model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::pagination::Paginated;

/// Half-day session marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i16", try_from = "i16")]
#[repr(i16)]
pub enum SessionType {
    Morning = 1,
    Afternoon = 2,
}

impl From<SessionType> for i16 {
    fn from(s: SessionType) -> Self {
        s as i16
    }
}

impl TryFrom<i16> for SessionType {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(SessionType::Morning),
            2 => Ok(SessionType::Afternoon),
            other => Err(format!("unknown session type: {other}")),
        }
    }
}

/// A single day of leave
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveDay {
    pub date: NaiveDate,
    pub is_full_day: bool,
    pub session_type: Option<SessionType>,
}

impl LeaveDay {
    /// Contribution to a leave tally: a full day is 1.0, a half day 0.5
    pub fn weight(&self) -> f64 {
        if self.is_full_day { 1.0 } else { 0.5 }
    }
}

/// Sum of day weights
pub fn leave_day_tally<'a>(days: impl IntoIterator<Item = &'a LeaveDay>) -> f64 {
    days.into_iter().map(LeaveDay::weight).sum()
}

/// Leave date row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct LeaveDateRow {
    pub leave_request_id: i64,
    pub date: NaiveDate,
    pub is_full_day: bool,
    pub session_type: Option<i16>,
}

impl From<LeaveDateRow> for LeaveDay {
    fn from(row: LeaveDateRow) -> Self {
        Self {
            date: row.date,
            is_full_day: row.is_full_day,
            session_type: row.session_type.and_then(|s| SessionType::try_from(s).ok()),
        }
    }
}

/// Leave request entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    pub id: i64,
    pub department_member_id: i64,
    pub reason: String,
    pub is_approved: Option<bool>,
    pub approved_by: Option<i64>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Leave request with requester and dates (for list views)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct LeaveListItem {
    pub id: i64,
    pub department_member_id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub code: String,
    pub department_name: String,
    pub reason: String,
    pub is_approved: Option<bool>,
    pub approved_by: Option<i64>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Every active date of the request, including those outside the listed window
    #[cfg_attr(feature = "db", sqlx(skip))]
    pub dates: Vec<LeaveDay>,
    /// Fractional day count of the dates inside the listed window
    #[cfg_attr(feature = "db", sqlx(skip))]
    pub leave_days: f64,
}

/// A member's own leaves plus the fractional tally for the window
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberLeaves {
    #[serde(flatten)]
    pub page: Paginated<LeaveListItem>,
    pub leave_count: f64,
}

/// Leave date as sent by clients; the date is validated server-side
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveDateInput {
    pub date: String,
    #[serde(default)]
    pub is_full_day: bool,
    pub session_type: Option<SessionType>,
}

/// Request/update leave payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RequestLeave {
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
    pub dates: Vec<LeaveDateInput>,
}

/// Approve/reject payload shared by leave and permission requests
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApproval {
    pub is_approved: bool,
}
