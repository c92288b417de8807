use rocket::{FromForm, UriDisplayQuery};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
/// Must match the bound on `page_size` below.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Which page of results the client wants. Pages are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromForm, UriDisplayQuery)]
pub struct PaginationRequest {
    #[field(default = 1)]
    #[field(validate = range(1..))]
    page_num: u32,
    #[field(default = DEFAULT_PAGE_SIZE)]
    #[field(validate = range(1..=100))]
    page_size: u32,
}

impl PaginationRequest {
    pub fn new(page_num: u32, page_size: u32) -> Self {
        Self {
            page_num,
            page_size,
        }
    }

    pub fn page_num(&self) -> u32 {
        self.page_num
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// How many items precede this page.
    pub fn skip(&self) -> u32 {
        (self.page_num - 1) * self.page_size
    }

    /// Wrap one page of items together with the pagination metadata.
    pub fn to_paginated<T>(&self, total: u64, items: Vec<T>) -> Paginated<T> {
        Paginated {
            items,
            pagination: PaginationResult {
                page_num: self.page_num,
                page_size: self.page_size,
                total,
            },
        }
    }
}

impl Default for PaginationRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// Pagination metadata returned alongside a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResult {
    pub page_num: u32,
    pub page_size: u32,
    pub total: u64,
}

/// One page of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: PaginationResult,
}

#[cfg(test)]
mod tests {
    use rocket::form::Form;

    use super::*;

    #[test]
    fn form_defaults_and_bounds() {
        assert_eq!(
            Form::<PaginationRequest>::parse("").unwrap(),
            PaginationRequest::default()
        );
        assert_eq!(
            Form::<PaginationRequest>::parse("page_num=3&page_size=100").unwrap(),
            PaginationRequest::new(3, MAX_PAGE_SIZE)
        );
        assert!(Form::<PaginationRequest>::parse("page_size=101").is_err());
        assert!(Form::<PaginationRequest>::parse("page_size=0").is_err());
        assert!(Form::<PaginationRequest>::parse("page_num=0").is_err());
    }

    #[test]
    fn skip_counts_previous_pages() {
        assert_eq!(PaginationRequest::new(1, 20).skip(), 0);
        assert_eq!(PaginationRequest::new(3, 20).skip(), 40);
    }

    #[test]
    fn paginated_carries_metadata() {
        let page = PaginationRequest::new(2, 2).to_paginated(5, vec!["c", "d"]);
        assert_eq!(page.items, vec!["c", "d"]);
        assert_eq!(
            page.pagination,
            PaginationResult {
                page_num: 2,
                page_size: 2,
                total: 5,
            }
        );
    }
}
