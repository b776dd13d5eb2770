//! Offset pagination utilities.

use serde::{Deserialize, Serialize};

/// Default page size when the client does not ask for one.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Upper bound on page size.
pub const MAX_PER_PAGE: u32 = 100;

/// Page selection taken from query parameters.
///
/// Out-of-range values are clamped rather than rejected.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageParams {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
        }
    }

    /// One-based page number.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }

    /// SQL `LIMIT` value.
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page())
    }

    /// SQL `OFFSET` value.
    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * self.limit()
    }

    /// Builds response metadata for a result set of `total` rows.
    pub fn info(&self, total: i64) -> PageInfo {
        let per_page = i64::from(self.per_page());
        let total = total.max(0);
        PageInfo {
            page: self.page(),
            per_page: self.per_page(),
            total,
            total_pages: (total + per_page - 1) / per_page,
        }
    }
}

/// Pagination metadata returned alongside list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PageParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), DEFAULT_PER_PAGE);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_offset_for_later_page() {
        let params = PageParams::new(3, 25);
        assert_eq!(params.limit(), 25);
        assert_eq!(params.offset(), 50);
    }

    #[test]
    fn test_clamping() {
        let params = PageParams::new(0, 10_000);
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), MAX_PER_PAGE);

        let params = PageParams::new(2, 0);
        assert_eq!(params.per_page(), 1);
        assert_eq!(params.offset(), 1);
    }

    #[test]
    fn test_info_rounds_pages_up() {
        let info = PageParams::new(1, 20).info(41);
        assert_eq!(info.total, 41);
        assert_eq!(info.total_pages, 3);

        let info = PageParams::new(1, 20).info(40);
        assert_eq!(info.total_pages, 2);
    }

    #[test]
    fn test_info_empty() {
        let info = PageParams::default().info(0);
        assert_eq!(info.total_pages, 0);
        assert_eq!(info.page, 1);
    }

    #[test]
    fn test_deserialize_from_query_shape() {
        let params: PageParams = serde_json::from_str(r#"{"page": 2}"#).unwrap();
        assert_eq!(params.page(), 2);
        assert_eq!(params.per_page(), DEFAULT_PER_PAGE);
    }
}
