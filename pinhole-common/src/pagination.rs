//! Page arithmetic shared by every listing endpoint.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A 1-based page number and page size.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize, Deserialize)]
#[serde(from = "RawPageRequest")]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

#[derive(Copy, Clone, Debug, Default, Deserialize)]
#[serde(default)]
struct RawPageRequest {
    page: u32,
    limit: u32,
}

impl From<RawPageRequest> for PageRequest {
    fn from(raw: RawPageRequest) -> Self {
        Self::new(raw.page, raw.limit)
    }
}

/// The rows a query should return: skip `offset`, then take `limit`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub total_pages: u64,
    pub total: u64,
    pub has_more: bool,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|raw| raw.trim().parse::<u32>().ok())
        .filter(|value| *value > 0)
}

impl PageRequest {
    /// Zero values fall back to the defaults; the limit is capped.
    #[must_use]
    pub fn new(page: u32, limit: u32) -> Self {
        let page = if page == 0 { DEFAULT_PAGE } else { page };
        let limit = if limit == 0 {
            DEFAULT_PAGE_LIMIT
        } else {
            limit.min(MAX_PAGE_LIMIT)
        };
        Self { page, limit }
    }

    /// Parses raw query values, ignoring anything that is not a positive
    /// integer.
    #[must_use]
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        Self::new(
            parse_positive(page).unwrap_or(DEFAULT_PAGE),
            parse_positive(limit).unwrap_or(DEFAULT_PAGE_LIMIT),
        )
    }

    #[must_use]
    pub fn page(self) -> u32 {
        self.page
    }

    #[must_use]
    pub fn limit(self) -> u32 {
        self.limit
    }

    #[must_use]
    pub fn window(self) -> Window {
        Window {
            offset: u64::from(self.page - 1) * u64::from(self.limit),
            limit: u64::from(self.limit),
        }
    }
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        let limit = u64::from(request.limit());
        let offset = request.window().offset;
        let returned = items.len() as u64;

        Self {
            items,
            current_page: request.page(),
            total_pages: total.div_ceil(limit),
            total,
            has_more: offset + returned < total,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::pagination::{MAX_PAGE_LIMIT, Page, PageRequest, Window};

    #[test]
    fn defaults_for_missing_or_garbage_values() {
        assert_eq!(PageRequest::from_query(None, None), PageRequest::new(1, 10));
        assert_eq!(
            PageRequest::from_query(Some("abc"), Some("-3")),
            PageRequest::new(1, 10)
        );
        assert_eq!(
            PageRequest::from_query(Some("0"), Some("0")),
            PageRequest::new(1, 10)
        );
        assert_eq!(
            PageRequest::from_query(Some("3"), Some("5")).window(),
            Window {
                offset: 10,
                limit: 5
            }
        );
    }

    #[test]
    fn limit_is_capped() {
        assert_eq!(
            PageRequest::from_query(None, Some("5000")).limit(),
            MAX_PAGE_LIMIT
        );
    }

    #[test]
    fn page_metadata() {
        let second = Page::new(vec![0; 10], PageRequest::new(2, 10), 25);
        assert_eq!(second.current_page, 2);
        assert_eq!(second.total_pages, 3);
        assert!(second.has_more);

        let third = Page::new(vec![0; 5], PageRequest::new(3, 10), 25);
        assert_eq!(third.total_pages, 3);
        assert!(!third.has_more);

        let empty = Page::<u8>::new(Vec::new(), PageRequest::default(), 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_more);
    }

    #[test]
    fn deserialized_requests_are_normalized() {
        let zeroed: PageRequest = serde_json::from_str(r#"{"page":0,"limit":0}"#).unwrap();
        assert_eq!(zeroed, PageRequest::default());
        assert_eq!(zeroed.window(), Window { offset: 0, limit: 10 });

        let empty = Page::<u8>::new(Vec::new(), zeroed, 0);
        assert_eq!(empty.total_pages, 0);

        let huge: PageRequest = serde_json::from_str(r#"{"page":2,"limit":5000}"#).unwrap();
        assert_eq!(huge.limit(), MAX_PAGE_LIMIT);

        let missing: PageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(missing, PageRequest::default());
    }
}
