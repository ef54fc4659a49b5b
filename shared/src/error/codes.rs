//! Unified error codes for the employee management service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Authorization errors
//! - 3xxx: Department errors
//! - 4xxx: Leave request errors
//! - 5xxx: Permission request errors
//! - 6xxx: Notice errors
//! - 7xxx: User errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so clients can switch on
/// a stable number instead of parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid format
    InvalidFormat = 6,
    /// Business rule violation
    BusinessRuleViolation = 9,
    /// Too many requests from one client
    TooManyRequests = 10,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Session was replaced or logged out
    SessionExpired = 1005,
    /// Account is disabled
    AccountDisabled = 1007,
    /// User has no department assignment
    NotAssignedToDepartment = 1008,
    /// One-time password does not match
    OtpInvalid = 1009,
    /// One-time password is too old
    OtpExpired = 1010,

    // ==================== 2xxx: Authorization ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Role not allowed for this operation
    RoleRequired = 2002,

    // ==================== 3xxx: Department ====================
    /// Department not found
    DepartmentNotFound = 3001,
    /// Department name already in use
    DepartmentNameExists = 3002,
    /// Reserved department cannot be removed
    ReservedDepartment = 3003,
    /// Lead is not an unmapped user of the required role
    LeadNotAvailable = 3004,
    /// Unmapping requires a replacement lead
    ReplacementLeadRequired = 3005,
    /// Department membership not found
    MembershipNotFound = 3006,
    /// Users cannot be mapped to the department
    UsersNotAssignable = 3007,
    /// User is still mapped to a department
    UserMappedToDepartment = 3008,

    // ==================== 4xxx: Leave ====================
    /// Leave request not found
    LeaveNotFound = 4001,
    /// A leave request is still pending
    LeaveRequestPending = 4002,
    /// Approved leave requests are immutable
    LeaveAlreadyApproved = 4003,
    /// Leave date is not a calendar date
    InvalidLeaveDate = 4004,
    /// At least one leave date is required
    LeaveDatesRequired = 4005,

    // ==================== 5xxx: Permission request ====================
    /// Permission request not found
    PermissionRequestNotFound = 5001,
    /// A permission request is still pending
    PermissionRequestPending = 5002,
    /// Approved permission requests are immutable
    PermissionRequestApproved = 5003,
    /// Billing cycle quota reached
    PermissionQuotaExceeded = 5004,
    /// Time window is not exactly one hour
    InvalidTimeWindow = 5005,
    /// Permission date is not a calendar date
    InvalidPermissionDate = 5006,

    // ==================== 6xxx: Notice ====================
    /// Notice not found
    NoticeNotFound = 6001,
    /// Served days must be positive
    InvalidServeDays = 6002,

    // ==================== 7xxx: User ====================
    /// User not found
    UserNotFound = 7001,
    /// Employee code already exists
    UserCodeExists = 7002,
    /// Email already exists
    UserEmailExists = 7003,
    /// Mobile number already exists
    UserMobileExists = 7004,
    /// Aadhar number already exists
    AadharExists = 7005,
    /// PAN already exists
    PanExists = 7006,
    /// Current password does not match
    PasswordMismatch = 7007,
    /// Role cannot be assigned through this operation
    RoleNotAssignable = 7008,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,
    /// Outbound email could not be delivered
    MailDeliveryFailed = 9006,
}

impl ErrorCode {
    /// Get the numeric code
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::BusinessRuleViolation => "Business rule violation",
            ErrorCode::TooManyRequests => "Too many requests, please retry later",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::SessionExpired => "Session has expired, please login again",
            ErrorCode::AccountDisabled => "Account is disabled",
            ErrorCode::NotAssignedToDepartment => {
                "you are not assigned to any department, please contact HR"
            }
            ErrorCode::OtpInvalid => "Invalid OTP",
            ErrorCode::OtpExpired => "OTP has expired",

            // Authorization
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Your role is not allowed to perform this operation",

            // Department
            ErrorCode::DepartmentNotFound => "department not found",
            ErrorCode::DepartmentNameExists => "department name already exists",
            ErrorCode::ReservedDepartment => "the Human Resource department cannot be removed",
            ErrorCode::LeadNotAvailable => "lead not found",
            ErrorCode::ReplacementLeadRequired => "a replacement lead is required",
            ErrorCode::MembershipNotFound => "department member not found",
            ErrorCode::UsersNotAssignable => "users not found",
            ErrorCode::UserMappedToDepartment => {
                "user mapped to department. Kindly unmap from department"
            }

            // Leave
            ErrorCode::LeaveNotFound => "leave not found",
            ErrorCode::LeaveRequestPending => "last leave request is in the pending state",
            ErrorCode::LeaveAlreadyApproved => "approved leave cannot be changed",
            ErrorCode::InvalidLeaveDate => "invalid date format",
            ErrorCode::LeaveDatesRequired => "at least one leave date is required",

            // Permission request
            ErrorCode::PermissionRequestNotFound => "permission not found",
            ErrorCode::PermissionRequestPending => {
                "last permission request is in the pending state"
            }
            ErrorCode::PermissionRequestApproved => "approved permission cannot be changed",
            ErrorCode::PermissionQuotaExceeded => {
                "permission limit exceeded: maximum of 3 permissions reached for this month"
            }
            ErrorCode::InvalidTimeWindow => {
                "the difference between fromTime and toTime must be exactly 1 hour"
            }
            ErrorCode::InvalidPermissionDate => "invalid date format",

            // Notice
            ErrorCode::NoticeNotFound => "notice not found for the user",
            ErrorCode::InvalidServeDays => "serve days must be greater than zero",

            // User
            ErrorCode::UserNotFound => "user not found",
            ErrorCode::UserCodeExists => "code already exists",
            ErrorCode::UserEmailExists => "email already exists",
            ErrorCode::UserMobileExists => "mobile already exists",
            ErrorCode::AadharExists => "aadhar already exists",
            ErrorCode::PanExists => "pan already exists",
            ErrorCode::PasswordMismatch => "old password is incorrect",
            ErrorCode::RoleNotAssignable => "role cannot be assigned",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::MailDeliveryFailed => "Failed to send email",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            6 => Ok(ErrorCode::InvalidFormat),
            9 => Ok(ErrorCode::BusinessRuleViolation),
            10 => Ok(ErrorCode::TooManyRequests),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::SessionExpired),
            1007 => Ok(ErrorCode::AccountDisabled),
            1008 => Ok(ErrorCode::NotAssignedToDepartment),
            1009 => Ok(ErrorCode::OtpInvalid),
            1010 => Ok(ErrorCode::OtpExpired),

            // Authorization
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),

            // Department
            3001 => Ok(ErrorCode::DepartmentNotFound),
            3002 => Ok(ErrorCode::DepartmentNameExists),
            3003 => Ok(ErrorCode::ReservedDepartment),
            3004 => Ok(ErrorCode::LeadNotAvailable),
            3005 => Ok(ErrorCode::ReplacementLeadRequired),
            3006 => Ok(ErrorCode::MembershipNotFound),
            3007 => Ok(ErrorCode::UsersNotAssignable),
            3008 => Ok(ErrorCode::UserMappedToDepartment),

            // Leave
            4001 => Ok(ErrorCode::LeaveNotFound),
            4002 => Ok(ErrorCode::LeaveRequestPending),
            4003 => Ok(ErrorCode::LeaveAlreadyApproved),
            4004 => Ok(ErrorCode::InvalidLeaveDate),
            4005 => Ok(ErrorCode::LeaveDatesRequired),

            // Permission request
            5001 => Ok(ErrorCode::PermissionRequestNotFound),
            5002 => Ok(ErrorCode::PermissionRequestPending),
            5003 => Ok(ErrorCode::PermissionRequestApproved),
            5004 => Ok(ErrorCode::PermissionQuotaExceeded),
            5005 => Ok(ErrorCode::InvalidTimeWindow),
            5006 => Ok(ErrorCode::InvalidPermissionDate),

            // Notice
            6001 => Ok(ErrorCode::NoticeNotFound),
            6002 => Ok(ErrorCode::InvalidServeDays),

            // User
            7001 => Ok(ErrorCode::UserNotFound),
            7002 => Ok(ErrorCode::UserCodeExists),
            7003 => Ok(ErrorCode::UserEmailExists),
            7004 => Ok(ErrorCode::UserMobileExists),
            7005 => Ok(ErrorCode::AadharExists),
            7006 => Ok(ErrorCode::PanExists),
            7007 => Ok(ErrorCode::PasswordMismatch),
            7008 => Ok(ErrorCode::RoleNotAssignable),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9005 => Ok(ErrorCode::ConfigError),
            9006 => Ok(ErrorCode::MailDeliveryFailed),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
