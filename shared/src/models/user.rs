//! User Model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::role::Role;

/// User entity (password hash and session token never leave the server)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub code: String,
    pub role_id: i32,
    pub manager_id: Option<i64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> Option<Role> {
        Role::from_id(self.role_id)
    }
}

/// User with role and department info (for list views)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct UserListItem {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub code: String,
    pub role_id: i32,
    pub role_name: String,
    pub department_id: Option<i64>,
    pub department_name: Option<String>,
}

/// Minimal user reference used by the department mapping screens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub code: String,
    pub role_id: i32,
}

/// Create user payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 10, max = 15))]
    pub mobile: String,
    #[validate(length(min = 1, max = 20))]
    pub code: String,
    pub role_id: i32,
    #[validate(length(min = 3, max = 128))]
    pub password: String,
}

/// Update user payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 10, max = 15))]
    pub mobile: String,
    #[validate(length(min = 1, max = 20))]
    pub code: String,
    pub role_id: i32,
}

/// Personal and employment details attached to a user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    pub user_id: i64,
    pub date_of_joining: Option<NaiveDate>,
    pub designation: Option<String>,
    pub experience: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub aadhar: Option<String>,
    pub pan: Option<String>,
    pub bank_account: Option<String>,
    pub ifsc: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub degree: Option<String>,
    pub college: Option<String>,
}

/// Upsert user details payload
///
/// `user_id` is only honoured for HR-level callers; everyone else edits their
/// own record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertUserDetails {
    pub user_id: Option<i64>,
    pub date_of_joining: Option<NaiveDate>,
    #[validate(length(max = 100))]
    pub designation: Option<String>,
    #[validate(length(max = 50))]
    pub experience: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[validate(length(equal = 12))]
    pub aadhar: Option<String>,
    #[validate(length(equal = 10))]
    pub pan: Option<String>,
    #[validate(length(max = 30))]
    pub bank_account: Option<String>,
    #[validate(length(max = 15))]
    pub ifsc: Option<String>,
    #[validate(length(max = 255))]
    pub address: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub degree: Option<String>,
    #[validate(length(max = 150))]
    pub college: Option<String>,
}

impl UpsertUserDetails {
    pub fn into_details(self, user_id: i64) -> UserDetails {
        UserDetails {
            user_id,
            date_of_joining: self.date_of_joining,
            designation: self.designation,
            experience: self.experience,
            date_of_birth: self.date_of_birth,
            aadhar: self.aadhar,
            pan: self.pan,
            bank_account: self.bank_account,
            ifsc: self.ifsc,
            address: self.address,
            city: self.city,
            degree: self.degree,
            college: self.college,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPassword {
    #[validate(length(min = 3, max = 128))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePassword {
    #[validate(length(min = 1))]
    pub old_password: String,
    #[validate(length(min = 3, max = 128))]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastUserCode {
    pub code: Option<String>,
}
