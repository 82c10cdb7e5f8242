use serde::{Deserialize, Serialize};

pub const DEFAULT_PER_PAGE: i64 = 10;
pub const MAX_PER_PAGE: i64 = 100;
/// Highest page number honoured; keeps `offset()` within `i64`.
pub const MAX_PAGE: i64 = i64::MAX / MAX_PER_PAGE;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageRequest {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageRequest {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
        }
    }

    pub fn page(&self) -> i64 {
        self.page.filter(|p| *p >= 1).unwrap_or(1).min(MAX_PAGE)
    }

    pub fn limit(&self) -> i64 {
        match self.per_page {
            Some(n) if n < 1 => DEFAULT_PER_PAGE,
            Some(n) => n.min(MAX_PER_PAGE),
            None => DEFAULT_PER_PAGE,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, request: &PageRequest, total: i64) -> Self {
        let per_page = request.limit();
        let total_pages = if total > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };

        Self {
            data,
            pagination: PaginationMeta {
                total,
                page: request.page(),
                per_page,
                total_pages,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req = PageRequest {
            page: None,
            per_page: None,
        };
        assert_eq!(req.page(), 1);
        assert_eq!(req.limit(), DEFAULT_PER_PAGE);
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_clamps_out_of_range_values() {
        let req = PageRequest::new(0, 500);
        assert_eq!(req.page(), 1);
        assert_eq!(req.limit(), MAX_PER_PAGE);

        let req = PageRequest::new(3, -2);
        assert_eq!(req.limit(), DEFAULT_PER_PAGE);
        assert_eq!(req.offset(), 20);
    }

    #[test]
    fn test_huge_page_is_clamped() {
        let req = PageRequest::new(i64::MAX, MAX_PER_PAGE);
        assert_eq!(req.page(), MAX_PAGE);
        assert_eq!(req.offset(), (MAX_PAGE - 1) * MAX_PER_PAGE);

        let page: Paginated<u8> = Paginated::new(vec![], &req, 3);
        assert_eq!(page.pagination.page, MAX_PAGE);
        assert_eq!(page.pagination.total_pages, 1);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page: Paginated<u8> = Paginated::new(vec![], &PageRequest::new(1, 10), 21);
        assert_eq!(page.pagination.total_pages, 3);

        let empty: Paginated<u8> = Paginated::new(vec![], &PageRequest::new(1, 10), 0);
        assert_eq!(empty.pagination.total_pages, 0);
    }
}
