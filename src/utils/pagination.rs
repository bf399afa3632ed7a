//! Pagination Parameters
//!
//! Shared offset/limit parameters for all list endpoints.

use serde::Deserialize;

use crate::utils::AppError;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Offset/limit pagination, 1-based pages
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageParams {
    /// Validate bounds: page >= 1, page_size in 1..=100
    pub fn validate(&self) -> Result<(), AppError> {
        if self.page < 1 {
            return Err(AppError::validation("page must be >= 1"));
        }
        if self.page_size < 1 || self.page_size > MAX_PAGE_SIZE {
            return Err(AppError::validation(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(())
    }

    /// Row offset for the current page
    ///
    /// Widened before multiplying; `page` is unbounded above, so the
    /// product can exceed u32.
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    /// Row limit for the current page
    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = PageParams::default();
        assert_eq!(p.page, 1);
        assert_eq!(p.page_size, 10);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 10);
    }

    #[test]
    fn test_offset_for_later_pages() {
        let p = PageParams {
            page: 3,
            page_size: 25,
        };
        assert_eq!(p.offset(), 50);
        assert_eq!(p.limit(), 25);
    }

    #[test]
    fn test_offset_at_maximum_page() {
        let p = PageParams {
            page: u32::MAX,
            page_size: MAX_PAGE_SIZE,
        };
        assert!(p.validate().is_ok());
        assert_eq!(p.offset(), (u32::MAX as i64 - 1) * MAX_PAGE_SIZE as i64);
    }

    #[test]
    fn test_bounds() {
        assert!(PageParams { page: 0, page_size: 10 }.validate().is_err());
        assert!(PageParams { page: 1, page_size: 0 }.validate().is_err());
        assert!(PageParams { page: 1, page_size: 101 }.validate().is_err());
        assert!(PageParams { page: 1, page_size: 100 }.validate().is_ok());
    }
}
