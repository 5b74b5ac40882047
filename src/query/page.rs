use serde::Serialize;

use crate::error::{CoreError, CoreResult};

/// Configured pagination limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBounds {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PageBounds {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_limit: 500,
        }
    }
}

/// Validated page request: `page >= 1`, `1 <= limit <= max_limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    page: u32,
    limit: u32,
}

impl Page {
    /// `page` below 1 is treated as 1; `limit` above the maximum is clamped;
    /// `limit` below 1 is rejected.
    pub fn new(page: Option<i64>, limit: Option<i64>, bounds: PageBounds) -> CoreResult<Self> {
        let limit = match limit {
            None => i64::from(bounds.default_limit.clamp(1, bounds.max_limit.max(1))),
            Some(l) if l < 1 => {
                return Err(CoreError::invalid(format!("limit must be at least 1 (got {l})")))
            }
            Some(l) => l.min(i64::from(bounds.max_limit.max(1))),
        };
        let page = page.unwrap_or(1).clamp(1, i64::from(u32::MAX));
        Ok(Self {
            page: page as u32,
            limit: limit as u32,
        })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }

    /// `ceil(total / limit)`; zero records means zero pages.
    pub fn total_pages(&self, total_records: i64) -> i64 {
        if total_records <= 0 {
            return 0;
        }
        let limit = i64::from(self.limit);
        (total_records + limit - 1) / limit
    }

    /// In-memory page slice, for result sets sorted outside SQL.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        items
            .into_iter()
            .skip(offset)
            .take(self.limit as usize)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_and_total_pages() {
        let page = Page::new(Some(3), Some(10), PageBounds::default()).unwrap();
        assert_eq!(page.offset(), 20);
        assert_eq!(page.total_pages(0), 0);
        assert_eq!(page.total_pages(1), 1);
        assert_eq!(page.total_pages(10), 1);
        assert_eq!(page.total_pages(11), 2);
        assert_eq!(page.total_pages(30), 3);
    }

    #[test]
    fn defaults_and_clamping() {
        let bounds = PageBounds {
            default_limit: 50,
            max_limit: 200,
        };
        let page = Page::new(None, None, bounds).unwrap();
        assert_eq!((page.page(), page.limit()), (1, 50));

        let page = Page::new(Some(0), Some(10_000), bounds).unwrap();
        assert_eq!((page.page(), page.limit()), (1, 200));
        assert_eq!(page.offset(), 0);

        assert!(Page::new(Some(1), Some(0), bounds).is_err());
    }

    #[test]
    fn slice_is_bounded_by_limit() {
        let page = Page::new(Some(2), Some(2), PageBounds::default()).unwrap();
        assert_eq!(page.slice(vec![1, 2, 3, 4, 5]), vec![3, 4]);
        let past_end = Page::new(Some(9), Some(2), PageBounds::default()).unwrap();
        assert!(past_end.slice(vec![1, 2, 3]).is_empty());
    }
}
