use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;
use crate::domain::DomainError;

/// `page`/`limit` as they arrive in a query string.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Applies defaults, rejects non-positive values and caps `limit`.
    pub fn resolve(params: PageParams, config: &PaginationConfig) -> Result<Self, DomainError> {
        let page = params.page.unwrap_or(1);
        if page < 1 {
            return Err(DomainError::validation("El parámetro page debe ser mayor o igual a 1."));
        }
        let limit = params.limit.unwrap_or(config.default_limit);
        if limit < 1 {
            return Err(DomainError::validation("El parámetro limit debe ser mayor o igual a 1."));
        }
        Ok(Self {
            page,
            limit: limit.min(config.max_limit),
        })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

/// One page of rows plus the predicate-filtered total.
#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub data: Vec<T>,
    pub total: i64,
}

impl<T> Paged<T> {
    pub fn new(data: Vec<T>, total: i64) -> Self {
        Self { data, total }
    }
}

pub fn page_count(total: i64, limit: i64) -> i64 {
    if total <= 0 || limit <= 0 {
        0
    } else {
        (total + limit - 1) / limit
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T: Serialize> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

impl<T: Serialize> ListResponse<T> {
    pub fn new(paged: Paged<T>, request: PageRequest) -> Self {
        Self {
            pages: page_count(paged.total, request.limit),
            data: paged.data,
            total: paged.total,
            page: request.page,
            limit: request.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<i64>, limit: Option<i64>) -> PageParams {
        PageParams { page, limit }
    }

    #[test]
    fn defaults_to_first_page_of_ten() {
        let req = PageRequest::resolve(params(None, None), &PaginationConfig::default()).unwrap();
        assert_eq!(req, PageRequest { page: 1, limit: 10 });
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn limit_is_capped_and_offset_follows_page() {
        let req =
            PageRequest::resolve(params(Some(3), Some(500)), &PaginationConfig::default()).unwrap();
        assert_eq!(req.limit, 100);
        assert_eq!(req.offset(), 200);
    }

    #[test]
    fn zero_page_or_limit_is_rejected() {
        let config = PaginationConfig::default();
        assert!(PageRequest::resolve(params(Some(0), None), &config).is_err());
        assert!(PageRequest::resolve(params(None, Some(0)), &config).is_err());
    }

    #[test]
    fn page_count_is_ceiling_division() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(1, 100), 1);
    }

    #[test]
    fn page_past_the_end_serializes_empty_data() {
        let req = PageRequest { page: 5, limit: 10 };
        let body = serde_json::to_value(ListResponse::new(Paged::<i32>::new(vec![], 12), req)).unwrap();
        assert_eq!(body["data"], serde_json::json!([]));
        assert_eq!(body["total"], 12);
        assert_eq!(body["pages"], 2);
    }
}
