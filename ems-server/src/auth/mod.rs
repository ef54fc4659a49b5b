//! Authentication and role-based authorization

pub mod extractor;
pub mod gate;
pub mod jwt;
pub mod middleware;
pub mod rate_limit;

pub use gate::{Principal, authenticate, authorize};
pub use jwt::JwtService;
