//! Shared types for the employee management service
//!
//! Error types, response envelopes, domain models, the billing-cycle
//! calendar and pagination helpers used by the server and its clients.

pub mod calendar;
pub mod error;
pub mod models;
pub mod pagination;
pub mod request;
pub mod util;

// Re-exports
pub use axum::Json;
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use http;
pub use serde::{Deserialize, Serialize};
