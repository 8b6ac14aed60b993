//! Page search and pagination helpers.
//!
//! This module lives in `core` (zero internal deps) so it can be used by both
//! the API and repository layers.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

/// Default page size for page listings.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size for page listings.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Clamp a user-provided limit to `[1, max]`, defaulting when absent.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a 1-based page number to at least 1.
pub fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

/// Number of pages needed for `total` rows at `page_size` rows per page.
pub fn total_pages(total: i64, page_size: i64) -> i64 {
    if total <= 0 || page_size <= 0 {
        return 0;
    }
    (total + page_size - 1) / page_size
}

/// Row offset of a 1-based page, saturating at `i64::MAX`.
pub fn page_offset(page: i64, page_size: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(page_size.max(0))
}

// ---------------------------------------------------------------------------
// Keyword matching
// ---------------------------------------------------------------------------

/// Build an `ILIKE` pattern matching `keyword` anywhere in a column.
///
/// `%`, `_` and `\` in the keyword are escaped so they match literally.
/// Returns `None` for a blank keyword (no filtering).
pub fn like_pattern(keyword: &str) -> Option<String> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return None;
    }
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    Some(pattern)
}

// ---------------------------------------------------------------------------
// Result envelope
// ---------------------------------------------------------------------------

/// One page of a paginated listing.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, page: i64, page_size: i64) -> Self {
        Self {
            items,
            total,
            page,
            page_size,
            total_pages: total_pages(total, page_size),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- clamp_limit ---------------------------------------------------------

    #[test]
    fn clamp_limit_uses_default_when_none() {
        assert_eq!(clamp_limit(None, 10, 100), 10);
    }

    #[test]
    fn clamp_limit_respects_max() {
        assert_eq!(clamp_limit(Some(500), 10, 100), 100);
    }

    #[test]
    fn clamp_limit_floors_at_one() {
        assert_eq!(clamp_limit(Some(0), 10, 100), 1);
        assert_eq!(clamp_limit(Some(-3), 10, 100), 1);
    }

    // -- clamp_page / page_offset -------------------------------------------

    #[test]
    fn clamp_page_defaults_and_floors() {
        assert_eq!(clamp_page(None), 1);
        assert_eq!(clamp_page(Some(0)), 1);
        assert_eq!(clamp_page(Some(4)), 4);
    }

    #[test]
    fn page_offset_is_zero_based() {
        assert_eq!(page_offset(1, 10), 0);
        assert_eq!(page_offset(3, 10), 20);
    }

    #[test]
    fn page_offset_saturates_on_huge_pages() {
        assert_eq!(page_offset(i64::MAX, MAX_PAGE_SIZE), i64::MAX);
        assert_eq!(page_offset(i64::MAX, 1), i64::MAX - 1);
        assert_eq!(page_offset(i64::MIN, 10), 0);
    }

    // -- total_pages ---------------------------------------------------------

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    // -- like_pattern --------------------------------------------------------

    #[test]
    fn like_pattern_wraps_keyword() {
        assert_eq!(like_pattern(" home ").as_deref(), Some("%home%"));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off").as_deref(), Some("%50\\%\\_off%"));
    }

    #[test]
    fn like_pattern_blank_is_none() {
        assert_eq!(like_pattern("   "), None);
    }

    // -- Paginated -----------------------------------------------------------

    #[test]
    fn paginated_computes_total_pages() {
        let page = Paginated::new(vec![1, 2, 3], 23, 1, 10);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 3);
    }
}
