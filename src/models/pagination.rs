//! Page/offset helpers shared by list endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

const DEFAULT_PAGE_SIZE: u64 = 20;
const MAX_PAGE_SIZE: u64 = 100;
// keeps `offset()` well inside a signed 64-bit OFFSET
const MAX_PAGE: u64 = 1_000_000;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: Some(1),
            page_size: Some(DEFAULT_PAGE_SIZE),
        }
    }
}

impl PaginationParams {
    /// 1-based page, never zero.
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).clamp(1, MAX_PAGE)
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> u64 {
        (self.page() - 1).saturating_mul(self.page_size())
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[aliases(PaginatedNotificationResponse = PaginatedResponse<crate::models::NotificationResponse>)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: u64, page_size: u64, total: u64) -> Self {
        let total_pages = total.div_ceil(page_size.max(1));
        Self {
            data,
            page,
            page_size,
            total,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_page_and_size() {
        let p = PaginationParams {
            page: Some(0),
            page_size: Some(500),
        };
        assert_eq!(p.page(), 1);
        assert_eq!(p.page_size(), MAX_PAGE_SIZE);
        assert_eq!(p.offset(), 0);

        let p = PaginationParams {
            page: Some(3),
            page_size: Some(10),
        };
        assert_eq!(p.offset(), 20);
    }

    #[test]
    fn huge_page_does_not_overflow_offset() {
        let p = PaginationParams {
            page: Some(u64::MAX),
            page_size: Some(20),
        };
        assert_eq!(p.page(), MAX_PAGE);
        assert_eq!(p.offset(), (MAX_PAGE - 1) * 20);
        assert!(p.offset() < i64::MAX as u64);
    }

    #[test]
    fn total_pages_rounds_up() {
        let r: PaginatedResponse<u8> = PaginatedResponse::new(vec![], 1, 20, 41);
        assert_eq!(r.total_pages, 3);
        let r: PaginatedResponse<u8> = PaginatedResponse::new(vec![], 1, 20, 0);
        assert_eq!(r.total_pages, 0);
    }
}
