//! Utilities
//!
//! Shared error handling, response envelope, logging, slug generation
//! and pagination helpers.

pub mod error;
pub mod logger;
pub mod pagination;
pub mod result;
pub mod slug;

pub use error::{ApiResponse, AppError, PageResponse, ok, ok_with_message, paginated};
pub use pagination::PageParams;
pub use result::AppResult;
pub use slug::generate_slug;
