//! Shared API request/response types

use serde::{Deserialize, Serialize};

/// Default page size for the public catalog
pub const DEFAULT_CATALOG_LIMIT: i64 = 12;

/// Default page size for admin listings
pub const DEFAULT_ADMIN_LIMIT: i64 = 20;

/// Largest page a client may request
pub const MAX_LIMIT: i64 = 100;

/// Pagination metadata returned alongside every listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// Sanitized page request with derived SQL offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Clamp raw query values: page ≥ 1, limit within 1..=MAX_LIMIT
    ///
    /// ```
    /// use lfdb_common::api::types::PageRequest;
    ///
    /// let p = PageRequest::new(Some(0), Some(500), 12);
    /// assert_eq!((p.page, p.limit), (1, 100));
    /// assert_eq!(p.offset(), 0);
    /// ```
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    pub fn meta(&self, total: i64) -> PaginationMeta {
        PaginationMeta {
            page: self.page,
            limit: self.limit,
            total,
            total_pages: (total + self.limit - 1) / self.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply() {
        let p = PageRequest::new(None, None, DEFAULT_CATALOG_LIMIT);
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 12);
    }

    #[test]
    fn test_offset() {
        let p = PageRequest::new(Some(3), Some(20), DEFAULT_ADMIN_LIMIT);
        assert_eq!(p.offset(), 40);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let p = PageRequest::new(Some(1), Some(12), DEFAULT_CATALOG_LIMIT);
        assert_eq!(p.meta(25).total_pages, 3);
        assert_eq!(p.meta(24).total_pages, 2);
        assert_eq!(p.meta(0).total_pages, 0);
    }

    #[test]
    fn test_negative_values_clamped() {
        let p = PageRequest::new(Some(-4), Some(-1), DEFAULT_CATALOG_LIMIT);
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 1);
    }

    #[test]
    fn test_meta_serializes_camel_case() {
        let json = serde_json::to_value(PageRequest::new(None, None, 12).meta(5)).unwrap();
        assert_eq!(json["totalPages"], 1);
    }
}
