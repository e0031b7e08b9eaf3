/// List parameters and paged results shared by every list endpoint
///
/// ```
/// use tshare_shared::models::pagination::PageParams;
///
/// let params = PageParams { q: Some("50%".into()), page: Some(3), per_page: Some(500) };
/// assert_eq!(params.per_page(), 100);
/// assert_eq!(params.offset(), 200);
/// assert_eq!(params.search_pattern().as_deref(), Some("%50\\%%"));
/// ```

use serde::{Deserialize, Serialize};

/// Default page size
pub const DEFAULT_PER_PAGE: i64 = 20;

/// Largest accepted page size
pub const MAX_PER_PAGE: i64 = 100;

/// `?q=&page=&per_page=` query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    /// Case-insensitive substring search
    pub q: Option<String>,

    /// 1-based page number
    pub page: Option<i64>,

    /// Page size, clamped to 1..=100
    pub per_page: Option<i64>,
}

impl PageParams {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }

    pub fn limit(&self) -> i64 {
        self.per_page()
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.per_page())
    }

    /// `ILIKE` pattern for `q`, or `None` when no search was given
    ///
    /// `%`, `_` and `\` in the input are escaped so they match literally.
    pub fn search_pattern(&self) -> Option<String> {
        let q = self.q.as_deref()?.trim();
        if q.is_empty() {
            return None;
        }

        let mut escaped = String::with_capacity(q.len() + 2);
        escaped.push('%');
        for c in q.chars() {
            if matches!(c, '%' | '_' | '\\') {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped.push('%');
        Some(escaped)
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, params: &PageParams) -> Self {
        Self {
            items,
            total,
            page: params.page(),
            per_page: params.per_page(),
        }
    }

    /// Converts every item, keeping the paging fields
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
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
        assert!(params.search_pattern().is_none());
    }

    #[test]
    fn test_clamping() {
        let params = PageParams {
            q: None,
            page: Some(-4),
            per_page: Some(0),
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.per_page(), 1);

        let params = PageParams {
            q: None,
            page: Some(2),
            per_page: Some(1000),
        };
        assert_eq!(params.per_page(), MAX_PER_PAGE);
        assert_eq!(params.offset(), MAX_PER_PAGE);
    }

    #[test]
    fn test_search_pattern_escapes_wildcards() {
        let params = PageParams {
            q: Some("  a_b\\c ".to_string()),
            ..Default::default()
        };
        assert_eq!(params.search_pattern().as_deref(), Some("%a\\_b\\\\c%"));

        let blank = PageParams {
            q: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(blank.search_pattern().is_none());
    }

    #[test]
    fn test_page_map() {
        let params = PageParams {
            page: Some(2),
            per_page: Some(5),
            ..Default::default()
        };
        let page = Page::new(vec![1, 2, 3], 8, &params).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20, 30]);
        assert_eq!(page.total, 8);
        assert_eq!(page.page, 2);
        assert_eq!(page.per_page, 5);
    }
}
