//! Data models
//!
//! Shared between the server and its clients (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (Postgres BIGSERIAL); role ids are `i32`.

pub mod auth;
pub mod dashboard;
pub mod department;
pub mod leave;
pub mod notice;
pub mod permission;
pub mod role;
pub mod user;

// Re-exports
pub use auth::*;
pub use dashboard::*;
pub use department::*;
pub use leave::*;
pub use notice::*;
pub use permission::*;
pub use role::*;
pub use user::*;
