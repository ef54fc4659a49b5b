//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Authentication errors
/// - 2xxx: Authorization errors
/// - 3xxx: Department errors
/// - 4xxx: Leave request errors
/// - 5xxx: Permission request errors
/// - 6xxx: Notice errors
/// - 7xxx: User errors
/// - 8xxx and above: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Authorization errors (2xxx)
    Permission,
    /// Department errors (3xxx)
    Department,
    /// Leave request errors (4xxx)
    Leave,
    /// Permission request errors (5xxx)
    PermissionRequest,
    /// Notice errors (6xxx)
    Notice,
    /// User errors (7xxx)
    User,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Auth,
            2000..3000 => Self::Permission,
            3000..4000 => Self::Department,
            4000..5000 => Self::Leave,
            5000..6000 => Self::PermissionRequest,
            6000..7000 => Self::Notice,
            7000..8000 => Self::User,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::Department => "department",
            Self::Leave => "leave",
            Self::PermissionRequest => "permission_request",
            Self::Notice => "notice",
            Self::User => "user",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
