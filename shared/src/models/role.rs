//! Role Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed role enumeration, persisted by id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
#[repr(i32)]
pub enum Role {
    Admin = 1,
    Manager = 2,
    Hr = 3,
    DepartmentLead = 4,
    Employee = 5,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Manager,
        Role::Hr,
        Role::DepartmentLead,
        Role::Employee,
    ];

    #[inline]
    pub const fn id(&self) -> i32 {
        *self as i32
    }

    pub fn from_id(id: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.id() == id)
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::Hr => "HR",
            Role::DepartmentLead => "Department Lead",
            Role::Employee => "Employee",
        }
    }

    /// Roles that must belong to a department before they can sign in
    pub const fn requires_department(&self) -> bool {
        matches!(self, Role::Hr | Role::DepartmentLead | Role::Employee)
    }

    /// Roles that can head a department (HR heads the reserved HR department)
    pub const fn is_lead_like(&self) -> bool {
        matches!(self, Role::Hr | Role::DepartmentLead)
    }
}

impl From<Role> for i32 {
    fn from(role: Role) -> Self {
        role.id()
    }
}

impl TryFrom<i32> for Role {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Role::from_id(value).ok_or_else(|| format!("unknown role id: {value}"))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declarative set of roles allowed to call an operation family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSet(&'static [Role]);

impl RoleSet {
    /// Any authenticated user
    pub const AUTHENTICATED: RoleSet = RoleSet(&Role::ALL);
    /// Admin, Manager and DepartmentLead (approvals of department requests)
    pub const LEAD: RoleSet = RoleSet(&[Role::Admin, Role::Manager, Role::DepartmentLead]);
    /// Admin, Manager and HR (people administration)
    pub const HR: RoleSet = RoleSet(&[Role::Admin, Role::Manager, Role::Hr]);
    /// Admin and Manager only
    pub const MANAGER: RoleSet = RoleSet(&[Role::Admin, Role::Manager]);

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn roles(&self) -> &'static [Role] {
        self.0
    }
}

/// Role as listed to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct RoleInfo {
    pub id: i32,
    pub name: String,
}

impl From<Role> for RoleInfo {
    fn from(role: Role) -> Self {
        Self {
            id: role.id(),
            name: role.name().to_string(),
        }
    }
}
