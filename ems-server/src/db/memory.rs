//! In-memory store for service tests
//!
//! Mirrors the soft-delete semantics of the Postgres schema closely enough for
//! the business rules to be exercised without a database.

use std::sync::{Mutex, MutexGuard, OnceLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::calendar::DateWindow;
use shared::models::{
    Department, HR_DEPARTMENT_ID, HR_DEPARTMENT_NAME, LeaveDay, LeaveListItem, Membership,
    Notice, PermissionListItem, Role, UpdateUser, User, UserDetails, leave_day_tally,
};
use shared::pagination::PageSlice;

use super::{
    Account, Admission, Approval, DbResult, DepartmentStore, DetailsField, IdentityField,
    LeaveStore, NewUser, NoticeStore, OtpRecord, OtpStore, PermissionSlot, PermissionStore,
    RequestRecord, Scope, UserStore,
};

struct UserRow {
    user: User,
    password_hash: String,
    token: Option<String>,
}

struct MemberRow {
    id: i64,
    department_id: i64,
    user_id: i64,
    active: bool,
}

struct OtpRow {
    record: OtpRecord,
    email: String,
    used: bool,
}

struct DayRow {
    day: LeaveDay,
    active: bool,
}

struct LeaveRow {
    id: i64,
    member_id: i64,
    reason: String,
    is_approved: Option<bool>,
    approved_by: Option<i64>,
    approved_at: Option<DateTime<Utc>>,
    active: bool,
    created_at: DateTime<Utc>,
    days: Vec<DayRow>,
}

struct PermissionRow {
    id: i64,
    member_id: i64,
    slot: PermissionSlot,
    is_approved: Option<bool>,
    approved_by: Option<i64>,
    approved_at: Option<DateTime<Utc>>,
    active: bool,
    created_at: DateTime<Utc>,
}

struct NoticeRow {
    notice: Notice,
    active: bool,
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<UserRow>,
    details: Vec<UserDetails>,
    otps: Vec<OtpRow>,
    departments: Vec<Department>,
    members: Vec<MemberRow>,
    leaves: Vec<LeaveRow>,
    permissions: Vec<PermissionRow>,
    notices: Vec<NoticeRow>,
}

impl Tables {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn active_user(&self, user_id: i64) -> Option<&UserRow> {
        self.users
            .iter()
            .find(|u| u.user.id == user_id && u.user.is_active)
    }

    fn active_member(&self, member_id: i64) -> Option<&MemberRow> {
        self.members.iter().find(|m| m.id == member_id && m.active)
    }

    fn membership_of(&self, user_id: i64) -> Option<&MemberRow> {
        self.members.iter().find(|m| m.user_id == user_id && m.active)
    }

    fn insert_member(&mut self, department_id: i64, user_id: i64) -> i64 {
        let id = self.id();
        self.members.push(MemberRow {
            id,
            department_id,
            user_id,
            active: true,
        });
        id
    }

    fn in_scope(&self, member_id: i64, scope: Scope) -> bool {
        match scope {
            Scope::Organization => true,
            Scope::Member(id) => member_id == id,
            Scope::Department(department_id) => self
                .active_member(member_id)
                .is_some_and(|m| m.department_id == department_id),
        }
    }

    fn account(&self, row: &UserRow) -> Account {
        let membership = self.membership_of(row.user.id);
        Account {
            id: row.user.id,
            first_name: row.user.first_name.clone(),
            last_name: row.user.last_name.clone(),
            email: row.user.email.clone(),
            role_id: row.user.role_id,
            password_hash: row.password_hash.clone(),
            token: row.token.clone(),
            department_id: membership.map(|m| m.department_id),
            department_member_id: membership.map(|m| m.id),
        }
    }

    /// Requester user and department name of a membership, active or not
    fn requester(&self, member_id: i64) -> Option<(&User, String)> {
        let member = self.members.iter().find(|m| m.id == member_id)?;
        let user = &self.users.iter().find(|u| u.user.id == member.user_id)?.user;
        let department = self
            .departments
            .iter()
            .find(|d| d.id == member.department_id)
            .map(|d| d.name.clone())
            .unwrap_or_default();
        Some((user, department))
    }

    fn pending_permission(&self, member_id: i64) -> bool {
        self.permissions
            .iter()
            .any(|p| p.member_id == member_id && p.active && p.is_approved.is_none())
    }

    fn permissions_in_window(&self, member_id: i64, window: DateWindow, exclude: Option<i64>) -> i64 {
        self.permissions
            .iter()
            .filter(|p| p.member_id == member_id && p.active && window.contains(p.slot.date))
            .filter(|p| Some(p.id) != exclude)
            .count() as i64
    }
}

pub const TEST_PASSWORD: &str = "secret";

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding the reserved HR department and the seeded Manager
    pub fn seeded() -> Self {
        let store = Self::new();
        {
            let mut t = store.lock();
            t.departments.push(Department {
                id: HR_DEPARTMENT_ID,
                name: HR_DEPARTMENT_NAME.to_string(),
                is_active: true,
                created_at: Utc::now(),
            });
            t.next_id = 100;
        }
        store.add_user(Role::Manager, "seed");
        store
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Active user with `{tag}@ems.test`, code `{tag}`, a unique mobile and
    /// the password [`TEST_PASSWORD`]
    pub fn add_user(&self, role: Role, tag: &str) -> i64 {
        static HASH: OnceLock<String> = OnceLock::new();
        let hash = HASH.get_or_init(|| crate::util::hash_password(TEST_PASSWORD).unwrap());
        self.add_user_with(role, tag, hash)
    }

    pub fn add_user_with(&self, role: Role, tag: &str, password_hash: &str) -> i64 {
        let mut t = self.lock();
        let id = t.id();
        t.users.push(UserRow {
            user: User {
                id,
                first_name: tag.to_string(),
                last_name: "Test".to_string(),
                email: format!("{tag}@ems.test"),
                mobile: format!("{:010}", 9_000_000_000_i64 + id),
                code: tag.to_uppercase(),
                role_id: role.id(),
                manager_id: None,
                is_active: true,
                created_at: Utc::now(),
            },
            password_hash: password_hash.to_string(),
            token: None,
        });
        id
    }

    pub fn add_department(&self, name: &str) -> i64 {
        let mut t = self.lock();
        let id = t.id();
        t.departments.push(Department {
            id,
            name: name.to_string(),
            is_active: true,
            created_at: Utc::now(),
        });
        id
    }

    /// Maps `user_id` into `department_id`, returning the membership id
    pub fn add_member(&self, department_id: i64, user_id: i64) -> i64 {
        self.lock().insert_member(department_id, user_id)
    }

    pub fn token_of(&self, user_id: i64) -> Option<String> {
        self.lock()
            .users
            .iter()
            .find(|u| u.user.id == user_id)
            .and_then(|u| u.token.clone())
    }

    pub fn user_is_active(&self, user_id: i64) -> bool {
        self.lock().active_user(user_id).is_some()
    }

    pub fn member_is_active(&self, member_id: i64) -> bool {
        self.lock().active_member(member_id).is_some()
    }

    /// User ids actively mapped into a department
    pub fn active_user_ids(&self, department_id: i64) -> Vec<i64> {
        self.lock()
            .members
            .iter()
            .filter(|m| m.department_id == department_id && m.active)
            .map(|m| m.user_id)
            .collect()
    }

    pub fn leave_is_active(&self, id: i64) -> bool {
        self.lock().leaves.iter().any(|l| l.id == id && l.active)
    }

    /// Active and inactive date counts of a leave request
    pub fn leave_date_counts(&self, id: i64) -> (usize, usize) {
        let t = self.lock();
        let Some(leave) = t.leaves.iter().find(|l| l.id == id) else {
            return (0, 0);
        };
        let active = leave.days.iter().filter(|d| d.active).count();
        (active, leave.days.len() - active)
    }

    /// Backdates a notice, as if it had been applied `days` ago
    pub fn backdate_notice(&self, notice_id: i64, days: i64) {
        let mut t = self.lock();
        if let Some(row) = t.notices.iter_mut().find(|n| n.notice.id == notice_id) {
            row.notice.created_at -= chrono::Duration::days(days);
        }
    }

    /// Backdates an OTP by `minutes`
    pub fn backdate_otp(&self, email: &str, minutes: i64) {
        let mut t = self.lock();
        for row in t.otps.iter_mut().filter(|o| o.email == email) {
            row.record.created_at -= chrono::Duration::minutes(minutes);
        }
    }

    pub fn latest_otp_code(&self, email: &str) -> Option<String> {
        self.lock()
            .otps
            .iter()
            .rev()
            .find(|o| o.email == email && !o.used)
            .map(|o| o.record.otp.clone())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn account_by_email(&self, email: &str) -> DbResult<Option<Account>> {
        let t = self.lock();
        let row = t
            .users
            .iter()
            .find(|u| u.user.is_active && u.user.email.eq_ignore_ascii_case(email));
        Ok(row.map(|u| t.account(u)))
    }

    async fn account_by_id(&self, user_id: i64) -> DbResult<Option<Account>> {
        let t = self.lock();
        Ok(t.active_user(user_id).map(|u| t.account(u)))
    }

    async fn set_token(&self, user_id: i64, token: Option<&str>) -> DbResult<()> {
        let mut t = self.lock();
        if let Some(row) = t.users.iter_mut().find(|u| u.user.id == user_id) {
            row.token = token.map(str::to_string);
        }
        Ok(())
    }

    async fn set_password(&self, user_id: i64, password_hash: &str) -> DbResult<()> {
        let mut t = self.lock();
        if let Some(row) = t.users.iter_mut().find(|u| u.user.id == user_id) {
            row.password_hash = password_hash.to_string();
            row.token = None;
        }
        Ok(())
    }

    async fn find_user(&self, user_id: i64) -> DbResult<Option<User>> {
        Ok(self.lock().active_user(user_id).map(|u| u.user.clone()))
    }

    async fn identity_conflict(
        &self,
        code: &str,
        email: &str,
        mobile: &str,
        exclude: Option<i64>,
    ) -> DbResult<Option<IdentityField>> {
        let t = self.lock();
        let conflict = t
            .users
            .iter()
            .filter(|u| u.user.is_active && Some(u.user.id) != exclude)
            .find_map(|u| {
                if u.user.code == code {
                    Some(IdentityField::Code)
                } else if u.user.email.eq_ignore_ascii_case(email) {
                    Some(IdentityField::Email)
                } else if u.user.mobile == mobile {
                    Some(IdentityField::Mobile)
                } else {
                    None
                }
            });
        Ok(conflict)
    }

    async fn default_manager(&self) -> DbResult<Option<i64>> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.user.is_active && u.user.role_id == Role::Manager.id())
            .map(|u| u.user.id))
    }

    async fn insert_user(&self, user: &NewUser) -> DbResult<User> {
        let mut t = self.lock();
        let id = t.id();
        let row = User {
            id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            mobile: user.mobile.clone(),
            code: user.code.clone(),
            role_id: user.role.id(),
            manager_id: user.manager_id,
            is_active: true,
            created_at: Utc::now(),
        };
        t.users.push(UserRow {
            user: row.clone(),
            password_hash: user.password_hash.clone(),
            token: None,
        });
        Ok(row)
    }

    async fn update_user(&self, user_id: i64, update: &UpdateUser) -> DbResult<Option<User>> {
        let mut t = self.lock();
        let Some(row) = t
            .users
            .iter_mut()
            .find(|u| u.user.id == user_id && u.user.is_active)
        else {
            return Ok(None);
        };
        row.user.first_name = update.first_name.clone();
        row.user.last_name = update.last_name.clone();
        row.user.email = update.email.clone();
        row.user.mobile = update.mobile.clone();
        row.user.code = update.code.clone();
        row.user.role_id = update.role_id;
        Ok(Some(row.user.clone()))
    }

    async fn remove_user(&self, user_id: i64) -> DbResult<()> {
        let mut t = self.lock();
        if let Some(row) = t.users.iter_mut().find(|u| u.user.id == user_id) {
            row.user.is_active = false;
            row.token = None;
        }
        for member in t.members.iter_mut().filter(|m| m.user_id == user_id) {
            member.active = false;
        }
        Ok(())
    }

    async fn find_details(&self, user_id: i64) -> DbResult<Option<UserDetails>> {
        Ok(self
            .lock()
            .details
            .iter()
            .find(|d| d.user_id == user_id)
            .cloned())
    }

    async fn details_conflict(
        &self,
        user_id: i64,
        aadhar: Option<&str>,
        pan: Option<&str>,
    ) -> DbResult<Option<DetailsField>> {
        let t = self.lock();
        let conflict = t
            .details
            .iter()
            .filter(|d| d.user_id != user_id)
            .find_map(|d| {
                if aadhar.is_some() && d.aadhar.as_deref() == aadhar {
                    Some(DetailsField::Aadhar)
                } else if let (Some(a), Some(b)) = (pan, d.pan.as_deref())
                    && a.eq_ignore_ascii_case(b)
                {
                    Some(DetailsField::Pan)
                } else {
                    None
                }
            });
        Ok(conflict)
    }

    async fn upsert_details(&self, details: &UserDetails) -> DbResult<UserDetails> {
        let mut t = self.lock();
        t.details.retain(|d| d.user_id != details.user_id);
        t.details.push(details.clone());
        Ok(details.clone())
    }

    async fn count_staff(&self) -> DbResult<i64> {
        Ok(self
            .lock()
            .users
            .iter()
            .filter(|u| u.user.is_active && u.user.role_id != Role::Admin.id())
            .count() as i64)
    }
}

#[async_trait]
impl OtpStore for MemoryStore {
    async fn insert_otp(&self, user_id: i64, email: &str, otp: &str) -> DbResult<()> {
        let mut t = self.lock();
        let id = t.id();
        t.otps.push(OtpRow {
            record: OtpRecord {
                id,
                user_id,
                otp: otp.to_string(),
                created_at: Utc::now(),
            },
            email: email.to_string(),
            used: false,
        });
        Ok(())
    }

    async fn latest_otp(&self, email: &str) -> DbResult<Option<OtpRecord>> {
        Ok(self
            .lock()
            .otps
            .iter()
            .rev()
            .find(|o| !o.used && o.email.eq_ignore_ascii_case(email))
            .map(|o| o.record.clone()))
    }

    async fn mark_otp_used(&self, otp_id: i64) -> DbResult<()> {
        let mut t = self.lock();
        if let Some(row) = t.otps.iter_mut().find(|o| o.record.id == otp_id) {
            row.used = true;
        }
        Ok(())
    }
}

#[async_trait]
impl DepartmentStore for MemoryStore {
    async fn find_department(&self, id: i64) -> DbResult<Option<Department>> {
        Ok(self
            .lock()
            .departments
            .iter()
            .find(|d| d.id == id && d.is_active)
            .cloned())
    }

    async fn department_name_taken(&self, name: &str, exclude: Option<i64>) -> DbResult<bool> {
        let name = name.trim();
        Ok(self.lock().departments.iter().any(|d| {
            d.is_active && Some(d.id) != exclude && d.name.eq_ignore_ascii_case(name)
        }))
    }

    async fn find_membership(&self, member_id: i64) -> DbResult<Option<Membership>> {
        Ok(self.lock().active_member(member_id).map(|m| Membership {
            id: m.id,
            department_id: m.department_id,
            user_id: m.user_id,
        }))
    }

    async fn membership_of(&self, user_id: i64) -> DbResult<Option<Membership>> {
        Ok(self.lock().membership_of(user_id).map(|m| Membership {
            id: m.id,
            department_id: m.department_id,
            user_id: m.user_id,
        }))
    }

    async fn is_assignable(
        &self,
        user_id: i64,
        role: Role,
        department_id: Option<i64>,
    ) -> DbResult<bool> {
        let t = self.lock();
        let Some(user) = t.active_user(user_id) else {
            return Ok(false);
        };
        let blocked = t
            .membership_of(user_id)
            .is_some_and(|m| Some(m.department_id) != department_id);
        Ok(user.user.role_id == role.id() && !blocked)
    }

    async fn count_assignable(&self, user_ids: &[i64], role: Role) -> DbResult<i64> {
        let t = self.lock();
        Ok(t.users
            .iter()
            .filter(|u| user_ids.contains(&u.user.id))
            .filter(|u| u.user.is_active && u.user.role_id == role.id())
            .filter(|u| t.membership_of(u.user.id).is_none())
            .count() as i64)
    }

    async fn count_members(&self, department_id: i64) -> DbResult<i64> {
        Ok(self
            .lock()
            .members
            .iter()
            .filter(|m| m.department_id == department_id && m.active)
            .count() as i64)
    }

    async fn create_department(&self, name: &str, lead_id: i64) -> DbResult<Department> {
        let mut t = self.lock();
        let id = t.id();
        let department = Department {
            id,
            name: name.trim().to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        t.departments.push(department.clone());
        t.insert_member(id, lead_id);
        Ok(department)
    }

    async fn reassign_lead(&self, id: i64, name: &str, lead_id: i64) -> DbResult<()> {
        let mut t = self.lock();
        if let Some(department) = t.departments.iter_mut().find(|d| d.id == id) {
            department.name = name.trim().to_string();
        }
        let mut kept = false;
        for member in t.members.iter_mut().filter(|m| m.department_id == id && m.active) {
            if member.user_id == lead_id {
                kept = true;
            } else {
                member.active = false;
            }
        }
        if !kept {
            t.insert_member(id, lead_id);
        }
        Ok(())
    }

    async fn remove_department(&self, id: i64) -> DbResult<()> {
        let mut t = self.lock();
        if let Some(department) = t.departments.iter_mut().find(|d| d.id == id) {
            department.is_active = false;
        }
        for member in t.members.iter_mut().filter(|m| m.department_id == id) {
            member.active = false;
        }
        Ok(())
    }

    async fn map_users(&self, id: i64, user_ids: &[i64]) -> DbResult<()> {
        let mut t = self.lock();
        for &user_id in user_ids {
            t.insert_member(id, user_id);
        }
        Ok(())
    }

    async fn unmap(&self, membership: Membership, replacement: Option<i64>) -> DbResult<()> {
        let mut t = self.lock();
        if let Some(member) = t.members.iter_mut().find(|m| m.id == membership.id) {
            member.active = false;
        }
        if let Some(user_id) = replacement {
            t.insert_member(membership.department_id, user_id);
        }
        Ok(())
    }
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn insert_leave(
        &self,
        member_id: i64,
        reason: &str,
        days: &[LeaveDay],
    ) -> DbResult<Admission<i64>> {
        let mut t = self.lock();
        if t
            .leaves
            .iter()
            .any(|l| l.member_id == member_id && l.active && l.is_approved.is_none())
        {
            return Ok(Admission::PendingExists);
        }
        let id = t.id();
        t.leaves.push(LeaveRow {
            id,
            member_id,
            reason: reason.to_string(),
            is_approved: None,
            approved_by: None,
            approved_at: None,
            active: true,
            created_at: Utc::now(),
            days: days
                .iter()
                .map(|&day| DayRow { day, active: true })
                .collect(),
        });
        Ok(Admission::Admitted(id))
    }

    async fn find_leave(&self, id: i64) -> DbResult<Option<RequestRecord>> {
        let t = self.lock();
        Ok(t.leaves
            .iter()
            .find(|l| l.id == id && l.active)
            .and_then(|l| {
                let member = t.members.iter().find(|m| m.id == l.member_id)?;
                Some(RequestRecord {
                    id: l.id,
                    department_member_id: l.member_id,
                    department_id: member.department_id,
                    is_approved: l.is_approved,
                })
            }))
    }

    async fn replace_leave(&self, id: i64, reason: &str, days: &[LeaveDay]) -> DbResult<()> {
        let mut t = self.lock();
        if let Some(leave) = t.leaves.iter_mut().find(|l| l.id == id) {
            leave.reason = reason.to_string();
            for day in &mut leave.days {
                day.active = false;
            }
            leave
                .days
                .extend(days.iter().map(|&day| DayRow { day, active: true }));
        }
        Ok(())
    }

    async fn remove_leave(&self, id: i64) -> DbResult<()> {
        let mut t = self.lock();
        if let Some(leave) = t.leaves.iter_mut().find(|l| l.id == id) {
            leave.active = false;
            for day in &mut leave.days {
                day.active = false;
            }
        }
        Ok(())
    }

    async fn set_leave_status(
        &self,
        id: i64,
        approver_id: i64,
        approved: bool,
        at: DateTime<Utc>,
    ) -> DbResult<()> {
        let mut t = self.lock();
        if let Some(leave) = t.leaves.iter_mut().find(|l| l.id == id) {
            leave.is_approved = Some(approved);
            leave.approved_by = Some(approver_id);
            leave.approved_at = Some(at);
        }
        Ok(())
    }

    async fn member_leaves(
        &self,
        member_id: i64,
        window: DateWindow,
        slice: PageSlice,
    ) -> DbResult<(Vec<LeaveListItem>, i64)> {
        let t = self.lock();
        let mut items: Vec<LeaveListItem> = t
            .leaves
            .iter()
            .filter(|l| l.member_id == member_id && l.active)
            .filter(|l| l.days.iter().any(|d| d.active && window.contains(d.day.date)))
            .filter_map(|l| {
                let (user, department_name) = t.requester(l.member_id)?;
                let dates: Vec<LeaveDay> =
                    l.days.iter().filter(|d| d.active).map(|d| d.day).collect();
                Some(LeaveListItem {
                    id: l.id,
                    department_member_id: l.member_id,
                    user_id: user.id,
                    first_name: user.first_name.clone(),
                    last_name: user.last_name.clone(),
                    code: user.code.clone(),
                    department_name,
                    reason: l.reason.clone(),
                    is_approved: l.is_approved,
                    approved_by: l.approved_by,
                    approved_at: l.approved_at,
                    created_at: l.created_at,
                    leave_days: leave_day_tally(
                        dates.iter().filter(|d| window.contains(d.date)),
                    ),
                    dates,
                })
            })
            .collect();
        items.reverse();
        let total = items.len() as i64;
        Ok((slice.apply(items), total))
    }

    async fn leave_tally(
        &self,
        scope: Scope,
        window: DateWindow,
        approval: Approval,
    ) -> DbResult<f64> {
        let t = self.lock();
        Ok(t.leaves
            .iter()
            .filter(|l| l.active && approval.matches(l.is_approved))
            .filter(|l| t.in_scope(l.member_id, scope))
            .flat_map(|l| l.days.iter())
            .filter(|d| d.active && window.contains(d.day.date))
            .map(|d| d.day.weight())
            .sum())
    }
}

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn insert_permission(
        &self,
        member_id: i64,
        slot: &PermissionSlot,
        window: DateWindow,
        quota: i64,
    ) -> DbResult<Admission<i64>> {
        let mut t = self.lock();
        if t.permissions_in_window(member_id, window, None) >= quota {
            return Ok(Admission::QuotaExceeded);
        }
        if t.pending_permission(member_id) {
            return Ok(Admission::PendingExists);
        }
        let id = t.id();
        t.permissions.push(PermissionRow {
            id,
            member_id,
            slot: slot.clone(),
            is_approved: None,
            approved_by: None,
            approved_at: None,
            active: true,
            created_at: Utc::now(),
        });
        Ok(Admission::Admitted(id))
    }

    async fn find_permission(&self, id: i64) -> DbResult<Option<RequestRecord>> {
        let t = self.lock();
        Ok(t.permissions
            .iter()
            .find(|p| p.id == id && p.active)
            .and_then(|p| {
                let member = t.members.iter().find(|m| m.id == p.member_id)?;
                Some(RequestRecord {
                    id: p.id,
                    department_member_id: p.member_id,
                    department_id: member.department_id,
                    is_approved: p.is_approved,
                })
            }))
    }

    async fn update_permission(
        &self,
        id: i64,
        slot: &PermissionSlot,
        window: DateWindow,
        quota: i64,
    ) -> DbResult<Admission<()>> {
        let mut t = self.lock();
        let Some(member_id) = t.permissions.iter().find(|p| p.id == id).map(|p| p.member_id)
        else {
            return Err(sqlx::Error::RowNotFound);
        };
        if t.permissions_in_window(member_id, window, Some(id)) >= quota {
            return Ok(Admission::QuotaExceeded);
        }
        if let Some(row) = t.permissions.iter_mut().find(|p| p.id == id) {
            row.slot = slot.clone();
        }
        Ok(Admission::Admitted(()))
    }

    async fn remove_permission(&self, id: i64) -> DbResult<()> {
        let mut t = self.lock();
        if let Some(row) = t.permissions.iter_mut().find(|p| p.id == id) {
            row.active = false;
        }
        Ok(())
    }

    async fn set_permission_status(
        &self,
        id: i64,
        approver_id: i64,
        approved: bool,
        at: DateTime<Utc>,
    ) -> DbResult<()> {
        let mut t = self.lock();
        if let Some(row) = t.permissions.iter_mut().find(|p| p.id == id) {
            row.is_approved = Some(approved);
            row.approved_by = Some(approver_id);
            row.approved_at = Some(at);
        }
        Ok(())
    }

    async fn member_permissions(
        &self,
        member_id: i64,
        window: DateWindow,
        slice: PageSlice,
    ) -> DbResult<(Vec<PermissionListItem>, i64)> {
        let t = self.lock();
        let mut items: Vec<PermissionListItem> = t
            .permissions
            .iter()
            .filter(|p| p.member_id == member_id && p.active && window.contains(p.slot.date))
            .filter_map(|p| {
                let (user, department_name) = t.requester(p.member_id)?;
                Some(PermissionListItem {
                    id: p.id,
                    department_member_id: p.member_id,
                    user_id: user.id,
                    first_name: user.first_name.clone(),
                    last_name: user.last_name.clone(),
                    code: user.code.clone(),
                    department_name,
                    reason: p.slot.reason.clone(),
                    date: p.slot.date,
                    from_time: p.slot.from_time,
                    to_time: p.slot.to_time,
                    is_approved: p.is_approved,
                    approved_by: p.approved_by,
                    approved_at: p.approved_at,
                    created_at: p.created_at,
                })
            })
            .collect();
        items.reverse();
        let total = items.len() as i64;
        Ok((slice.apply(items), total))
    }

    async fn count_permissions(
        &self,
        scope: Scope,
        window: DateWindow,
        approval: Approval,
    ) -> DbResult<i64> {
        let t = self.lock();
        Ok(t.permissions
            .iter()
            .filter(|p| p.active && window.contains(p.slot.date))
            .filter(|p| approval.matches(p.is_approved))
            .filter(|p| t.in_scope(p.member_id, scope))
            .count() as i64)
    }
}

#[async_trait]
impl NoticeStore for MemoryStore {
    async fn insert_notice(&self, member_id: i64, remarks: &str) -> DbResult<Notice> {
        let mut t = self.lock();
        let id = t.id();
        let notice = Notice {
            id,
            department_member_id: member_id,
            remarks: remarks.to_string(),
            notice_end_date: None,
            is_approved: false,
            approved_by: None,
            created_at: Utc::now(),
        };
        t.notices.push(NoticeRow {
            notice: notice.clone(),
            active: true,
        });
        Ok(notice)
    }

    async fn latest_notice(&self, member_id: i64) -> DbResult<Option<Notice>> {
        Ok(self
            .lock()
            .notices
            .iter()
            .filter(|n| n.active && n.notice.department_member_id == member_id)
            .max_by_key(|n| (n.notice.created_at, n.notice.id))
            .map(|n| n.notice.clone()))
    }

    async fn approve_notice(
        &self,
        notice_id: i64,
        approver_id: i64,
        end_date: DateTime<Utc>,
    ) -> DbResult<Notice> {
        let mut t = self.lock();
        let row = t
            .notices
            .iter_mut()
            .find(|n| n.notice.id == notice_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        row.notice.notice_end_date = Some(end_date);
        row.notice.is_approved = true;
        row.notice.approved_by = Some(approver_id);
        Ok(row.notice.clone())
    }

    async fn count_on_notice(&self, scope: Scope, now: DateTime<Utc>) -> DbResult<i64> {
        let t = self.lock();
        let mut members: Vec<i64> = t
            .notices
            .iter()
            .filter(|n| n.active && n.notice.is_approved)
            .filter(|n| n.notice.notice_end_date.is_some_and(|end| end > now))
            .map(|n| n.notice.department_member_id)
            .filter(|&id| t.active_member(id).is_some() && t.in_scope(id, scope))
            .collect();
        members.sort_unstable();
        members.dedup();
        Ok(members.len() as i64)
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> DbResult<Vec<i64>> {
        let mut t = self.lock();
        let expired: Vec<(i64, i64)> = t
            .members
            .iter()
            .filter(|m| m.active)
            .filter(|m| {
                t.notices.iter().any(|n| {
                    n.active
                        && n.notice.is_approved
                        && n.notice.department_member_id == m.id
                        && n.notice.notice_end_date.is_some_and(|end| end < now)
                })
            })
            .map(|m| (m.id, m.user_id))
            .collect();

        for &(member_id, user_id) in &expired {
            if let Some(member) = t.members.iter_mut().find(|m| m.id == member_id) {
                member.active = false;
            }
            if let Some(user) = t.users.iter_mut().find(|u| u.user.id == user_id) {
                user.user.is_active = false;
                user.token = None;
            }
        }
        Ok(expired.into_iter().map(|(member_id, _)| member_id).collect())
    }
}
