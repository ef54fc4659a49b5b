//! Unified error system for the employee management service
//!
//! This module provides:
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`ApiResponse`]: The `{code, message, details?}` error envelope
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Authorization errors
//! - 3xxx: Department errors
//! - 4xxx: Leave request errors
//! - 5xxx: Permission request errors
//! - 6xxx: Notice errors
//! - 7xxx: User errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! let err = AppError::new(ErrorCode::LeaveRequestPending);
//!
//! let err = AppError::with_message(ErrorCode::ValidationFailed, "invalid date format: 2025-13-01");
//!
//! let err = AppError::validation("Missing required field")
//!     .with_detail("field", "reason");
//!
//! let body = ApiResponse::from(&err);
//! assert_eq!(body.code, ErrorCode::ValidationFailed.code());
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
