//! Authentication
//!
//! JWT token service and request extractors. Password hashing lives on
//! the [`crate::db::models::User`] model (argon2).

pub mod extractor;
pub mod jwt;

pub use extractor::AdminUser;
pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
