//! Repositories
//!
//! One repository per entity, each a thin wrapper over the shared
//! pool. Errors are raw `sqlx::Error`; handlers convert them to
//! [`crate::AppError`] (Database) via `?`.

pub mod category;
pub mod order;
pub mod product;
pub mod user;

pub use category::CategoryRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;
pub use user::UserRepository;

/// Repository-level Result type
pub type RepoResult<T> = Result<T, sqlx::Error>;
