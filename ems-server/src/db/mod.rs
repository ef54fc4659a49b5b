//! Database access layer
//!
//! Business rules talk to storage through the store traits below so they can
//! be exercised against [`memory::MemoryStore`] in tests. [`PgStore`] is the
//! production implementation; every multi-statement write it performs runs in
//! one transaction. Read-only list views are plain functions over `&PgPool`
//! in the per-entity modules.

pub mod departments;
pub mod leaves;
#[cfg(test)]
pub mod memory;
pub mod notices;
pub mod otp;
pub mod permissions;
pub mod seed;
pub mod users;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use shared::calendar::DateWindow;
use shared::models::{
    Department, LeaveDay, LeaveListItem, Membership, Notice, PermissionListItem, Role, UpdateUser,
    User, UserDetails,
};
use shared::pagination::PageSlice;
use sqlx::PgPool;

pub type DbResult<T> = Result<T, sqlx::Error>;

/// Postgres-backed store
#[derive(Clone)]
pub struct PgStore {
    pub pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Outcome of an insert guarded by a per-member rule checked in the same
/// transaction as the write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission<T> {
    Admitted(T),
    /// The member already has an undecided request
    PendingExists,
    /// The member reached the per-cycle quota
    QuotaExceeded,
}

/// Population a report count is taken over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Organization,
    Department(i64),
    Member(i64),
}

/// Approval-state filter for report counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approval {
    Any,
    Approved,
    Pending,
}

impl Scope {
    pub(crate) fn member_id(self) -> Option<i64> {
        match self {
            Scope::Member(id) => Some(id),
            _ => None,
        }
    }

    pub(crate) fn department_id(self) -> Option<i64> {
        match self {
            Scope::Department(id) => Some(id),
            _ => None,
        }
    }
}

impl Approval {
    pub(crate) fn matches(self, is_approved: Option<bool>) -> bool {
        match self {
            Approval::Any => true,
            Approval::Approved => is_approved == Some(true),
            Approval::Pending => is_approved.is_none(),
        }
    }

    /// Bind value understood by the count queries
    pub(crate) fn code(self) -> i32 {
        match self {
            Approval::Any => 0,
            Approval::Approved => 1,
            Approval::Pending => 2,
        }
    }
}

/// Filter shared by the leave and permission list views
#[derive(Debug, Clone, PartialEq)]
pub struct ListFilter {
    pub window: DateWindow,
    pub member_id: Option<i64>,
    pub department_id: Option<i64>,
    /// Requester role ids; `None` means any role
    pub roles: Option<Vec<i32>>,
    /// Bound `ILIKE` pattern over requester name and code
    pub pattern: Option<String>,
}

impl ListFilter {
    pub fn new(window: DateWindow) -> Self {
        Self {
            window,
            member_id: None,
            department_id: None,
            roles: None,
            pattern: None,
        }
    }

    pub fn member(mut self, member_id: i64) -> Self {
        self.member_id = Some(member_id);
        self
    }

    pub fn department(mut self, department_id: i64) -> Self {
        self.department_id = Some(department_id);
        self
    }

    pub fn roles(mut self, roles: &[Role]) -> Self {
        self.roles = Some(roles.iter().map(Role::id).collect());
        self
    }

    pub fn search(mut self, pattern: Option<String>) -> Self {
        self.pattern = pattern;
        self
    }
}

/// Active user joined with their credentials and current assignment
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role_id: i32,
    pub password_hash: String,
    pub token: Option<String>,
    pub department_id: Option<i64>,
    pub department_member_id: Option<i64>,
}

/// Unique user field that collided with another active user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    Code,
    Email,
    Mobile,
}

/// Unique user-details field that collided with another user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailsField {
    Aadhar,
    Pan,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub code: String,
    pub password_hash: String,
    pub role: Role,
    pub manager_id: Option<i64>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OtpRecord {
    pub id: i64,
    pub user_id: i64,
    pub otp: String,
    pub created_at: DateTime<Utc>,
}

/// Ownership and approval state of a leave or permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct RequestRecord {
    pub id: i64,
    pub department_member_id: i64,
    pub department_id: i64,
    pub is_approved: Option<bool>,
}

/// Permission fields written on request and update
#[derive(Debug, Clone)]
pub struct PermissionSlot {
    pub reason: String,
    pub date: NaiveDate,
    pub from_time: NaiveTime,
    pub to_time: NaiveTime,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn account_by_email(&self, email: &str) -> DbResult<Option<Account>>;
    async fn account_by_id(&self, user_id: i64) -> DbResult<Option<Account>>;
    /// Last writer wins
    async fn set_token(&self, user_id: i64, token: Option<&str>) -> DbResult<()>;
    /// Replaces the password hash and signs the user out
    async fn set_password(&self, user_id: i64, password_hash: &str) -> DbResult<()>;
    async fn find_user(&self, user_id: i64) -> DbResult<Option<User>>;
    async fn identity_conflict(
        &self,
        code: &str,
        email: &str,
        mobile: &str,
        exclude: Option<i64>,
    ) -> DbResult<Option<IdentityField>>;
    async fn default_manager(&self) -> DbResult<Option<i64>>;
    async fn insert_user(&self, user: &NewUser) -> DbResult<User>;
    async fn update_user(&self, user_id: i64, update: &UpdateUser) -> DbResult<Option<User>>;
    /// Soft-deletes the user together with their memberships
    async fn remove_user(&self, user_id: i64) -> DbResult<()>;
    async fn find_details(&self, user_id: i64) -> DbResult<Option<UserDetails>>;
    async fn details_conflict(
        &self,
        user_id: i64,
        aadhar: Option<&str>,
        pan: Option<&str>,
    ) -> DbResult<Option<DetailsField>>;
    async fn upsert_details(&self, details: &UserDetails) -> DbResult<UserDetails>;
    /// Active users other than Admin
    async fn count_staff(&self) -> DbResult<i64>;
}

#[async_trait]
pub trait OtpStore: Send + Sync {
    async fn insert_otp(&self, user_id: i64, email: &str, otp: &str) -> DbResult<()>;
    /// Most recent unused OTP issued for `email`
    async fn latest_otp(&self, email: &str) -> DbResult<Option<OtpRecord>>;
    async fn mark_otp_used(&self, otp_id: i64) -> DbResult<()>;
}

#[async_trait]
pub trait DepartmentStore: Send + Sync {
    async fn find_department(&self, id: i64) -> DbResult<Option<Department>>;
    async fn department_name_taken(&self, name: &str, exclude: Option<i64>) -> DbResult<bool>;
    async fn find_membership(&self, member_id: i64) -> DbResult<Option<Membership>>;
    async fn membership_of(&self, user_id: i64) -> DbResult<Option<Membership>>;
    /// Active user holding `role` who is unmapped, or already mapped to
    /// `department_id` when given
    async fn is_assignable(
        &self,
        user_id: i64,
        role: Role,
        department_id: Option<i64>,
    ) -> DbResult<bool>;
    /// How many of `user_ids` are active, unmapped and hold `role`
    async fn count_assignable(&self, user_ids: &[i64], role: Role) -> DbResult<i64>;
    async fn count_members(&self, department_id: i64) -> DbResult<i64>;
    async fn create_department(&self, name: &str, lead_id: i64) -> DbResult<Department>;
    /// Renames the department and leaves `lead_id` as its only active member
    async fn reassign_lead(&self, id: i64, name: &str, lead_id: i64) -> DbResult<()>;
    async fn remove_department(&self, id: i64) -> DbResult<()>;
    async fn map_users(&self, id: i64, user_ids: &[i64]) -> DbResult<()>;
    /// Deactivates a membership, mapping `replacement` into the same
    /// department in the same transaction
    async fn unmap(&self, membership: Membership, replacement: Option<i64>) -> DbResult<()>;
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    /// Inserts the request and its dates unless the member has one pending
    async fn insert_leave(
        &self,
        member_id: i64,
        reason: &str,
        days: &[LeaveDay],
    ) -> DbResult<Admission<i64>>;
    async fn find_leave(&self, id: i64) -> DbResult<Option<RequestRecord>>;
    /// Updates the reason and swaps the active date set for `days`
    async fn replace_leave(&self, id: i64, reason: &str, days: &[LeaveDay]) -> DbResult<()>;
    async fn remove_leave(&self, id: i64) -> DbResult<()>;
    async fn set_leave_status(
        &self,
        id: i64,
        approver_id: i64,
        approved: bool,
        at: DateTime<Utc>,
    ) -> DbResult<()>;
    /// Requests of a member with at least one date in `window`, newest first
    async fn member_leaves(
        &self,
        member_id: i64,
        window: DateWindow,
        slice: PageSlice,
    ) -> DbResult<(Vec<LeaveListItem>, i64)>;
    /// Fractional day tally of active dates inside `window`
    async fn leave_tally(
        &self,
        scope: Scope,
        window: DateWindow,
        approval: Approval,
    ) -> DbResult<f64>;
}

#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Inserts the request unless the member is at `quota` within `window`
    /// or already has one pending
    async fn insert_permission(
        &self,
        member_id: i64,
        slot: &PermissionSlot,
        window: DateWindow,
        quota: i64,
    ) -> DbResult<Admission<i64>>;
    async fn find_permission(&self, id: i64) -> DbResult<Option<RequestRecord>>;
    /// Rewrites the request unless the member's other requests in `window`
    /// already reach `quota`
    async fn update_permission(
        &self,
        id: i64,
        slot: &PermissionSlot,
        window: DateWindow,
        quota: i64,
    ) -> DbResult<Admission<()>>;
    async fn remove_permission(&self, id: i64) -> DbResult<()>;
    async fn set_permission_status(
        &self,
        id: i64,
        approver_id: i64,
        approved: bool,
        at: DateTime<Utc>,
    ) -> DbResult<()>;
    async fn member_permissions(
        &self,
        member_id: i64,
        window: DateWindow,
        slice: PageSlice,
    ) -> DbResult<(Vec<PermissionListItem>, i64)>;
    async fn count_permissions(
        &self,
        scope: Scope,
        window: DateWindow,
        approval: Approval,
    ) -> DbResult<i64>;
}

#[async_trait]
pub trait NoticeStore: Send + Sync {
    async fn insert_notice(&self, member_id: i64, remarks: &str) -> DbResult<Notice>;
    async fn latest_notice(&self, member_id: i64) -> DbResult<Option<Notice>>;
    async fn approve_notice(
        &self,
        notice_id: i64,
        approver_id: i64,
        end_date: DateTime<Utc>,
    ) -> DbResult<Notice>;
    /// Active members serving an approved notice that ends after `now`
    async fn count_on_notice(&self, scope: Scope, now: DateTime<Utc>) -> DbResult<i64>;
    /// Deactivates members whose notice ended before `now`, and their users.
    /// Returns the deactivated membership ids.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> DbResult<Vec<i64>>;
}

/// Everything the services need from storage
pub trait Store:
    UserStore + OtpStore + DepartmentStore + LeaveStore + PermissionStore + NoticeStore
{
}

impl<T> Store for T where
    T: UserStore + OtpStore + DepartmentStore + LeaveStore + PermissionStore + NoticeStore
{
}
