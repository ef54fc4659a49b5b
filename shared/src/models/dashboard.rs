//! Dashboard Model
//!
//! Each role sees a different summary; the variant tag tells clients which
//! one they got.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum Dashboard {
    /// Admin, Manager and HR
    Organization(OrganizationSummary),
    /// DepartmentLead
    Department(DepartmentSummary),
    /// Employee
    Member(MemberSummary),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSummary {
    pub employee_count: i64,
    pub on_notice_count: i64,
    pub leave_count: f64,
    pub approved_leave_count: f64,
    pub pending_leave_count: f64,
    pub permission_count: i64,
    pub approved_permission_count: i64,
    pub pending_permission_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSummary {
    pub member_count: i64,
    pub on_notice_count: i64,
    pub leave_count: f64,
    pub approved_leave_count: f64,
    pub permission_count: i64,
    pub approved_permission_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub leave_count: f64,
    pub approved_leave_count: f64,
    pub permission_count: i64,
    pub approved_permission_count: i64,
}
