//! Shared Types
//!
//! Common query types used by the handlers

use serde::Deserialize;

use crate::utils::{AppError, AppResult};

/// Largest page a list endpoint serves
pub const MAX_PAGE_LIMIT: u32 = 50;

/// Pagination query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u32,

    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PaginationParams {
    /// `page >= 1`, `1 <= limit <= 50`
    pub fn checked(&self) -> AppResult<(u32, u32)> {
        if self.page == 0 {
            return Err(AppError::validation("page must be at least 1"));
        }
        if self.limit == 0 || self.limit > MAX_PAGE_LIMIT {
            return Err(AppError::validation(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}"
            )));
        }
        Ok((self.page, self.limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(PaginationParams::default().checked().unwrap(), (1, 20));
    }

    #[test]
    fn test_bounds() {
        let p = |page, limit| PaginationParams { page, limit }.checked();
        assert!(p(0, 20).is_err());
        assert!(p(1, 0).is_err());
        assert!(p(1, 51).is_err());
        assert_eq!(p(3, 50).unwrap(), (3, 50));
    }
}
