use serde::Serialize;

use crate::services::question_query::FilterError;

pub(crate) const DEFAULT_PAGE: i64 = 1;
pub(crate) const DEFAULT_LIMIT: i64 = 10;
pub(crate) const MAX_LIMIT: i64 = 100;

/// Validated `page`/`limit` pair. Out-of-range input is rejected, never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PageRequest {
    pub(crate) page: i64,
    pub(crate) limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: DEFAULT_PAGE, limit: DEFAULT_LIMIT }
    }
}

impl PageRequest {
    pub(crate) fn parse(page: Option<&str>, limit: Option<&str>) -> Result<Self, FilterError> {
        let page = match page {
            None => DEFAULT_PAGE,
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(value) if value >= 1 => value,
                _ => return Err(FilterError::Page),
            },
        };

        let limit = match limit {
            None => DEFAULT_LIMIT,
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(value) if (1..=MAX_LIMIT).contains(&value) => value,
                _ => return Err(FilterError::Limit),
            },
        };

        Ok(Self { page, limit })
    }

    pub(crate) fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct Pagination {
    pub(crate) total: i64,
    pub(crate) page: i64,
    pub(crate) limit: i64,
    pub(crate) pages: i64,
}

impl Pagination {
    pub(crate) fn new(request: PageRequest, total: i64) -> Self {
        let pages = if total <= 0 { 0 } else { (total + request.limit - 1) / request.limit };
        Self { total, page: request.page, limit: request.limit, pages }
    }

    pub(crate) fn empty(request: PageRequest) -> Self {
        Self::new(request, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_absent() {
        assert_eq!(PageRequest::parse(None, None), Ok(PageRequest { page: 1, limit: 10 }));
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert_eq!(PageRequest::parse(Some("0"), None), Err(FilterError::Page));
        assert_eq!(PageRequest::parse(Some("abc"), None), Err(FilterError::Page));
        assert_eq!(PageRequest::parse(None, Some("0")), Err(FilterError::Limit));
        assert_eq!(PageRequest::parse(None, Some("101")), Err(FilterError::Limit));
        assert_eq!(PageRequest::parse(None, Some("2.5")), Err(FilterError::Limit));
        assert_eq!(PageRequest::parse(Some("3"), Some("100")), Ok(PageRequest { page: 3, limit: 100 }));
    }

    #[test]
    fn pages_is_ceiling_of_total_over_limit() {
        let request = PageRequest { page: 1, limit: 10 };
        assert_eq!(Pagination::new(request, 0).pages, 0);
        assert_eq!(Pagination::new(request, 10).pages, 1);
        assert_eq!(Pagination::new(request, 11).pages, 2);
        assert_eq!(Pagination::new(PageRequest { page: 9, limit: 3 }, 7).pages, 3);
    }

    #[test]
    fn offset_skips_previous_pages() {
        assert_eq!(PageRequest { page: 1, limit: 10 }.offset(), 0);
        assert_eq!(PageRequest { page: 4, limit: 25 }.offset(), 75);
    }
}
