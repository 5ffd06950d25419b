use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_PAGE_NUMBER: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("page size must be at least 1")]
    InvalidPageSize,
    #[error("page numbers start at 1")]
    InvalidPageNumber,
}

/// One-based page request. Hashable so it can key a query cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page_size: u32,
    pub page_number: u32,
}

impl PageRequest {
    pub fn new(page_size: u32, page_number: u32) -> Result<Self, PageError> {
        if page_size == 0 {
            return Err(PageError::InvalidPageSize);
        }
        if page_number == 0 {
            return Err(PageError::InvalidPageNumber);
        }
        Ok(Self {
            page_size,
            page_number,
        })
    }

    pub fn first(page_size: u32) -> Result<Self, PageError> {
        Self::new(page_size, DEFAULT_PAGE_NUMBER)
    }

    /// The request for the following page with the same size.
    pub fn next(self) -> Self {
        Self {
            page_number: self.page_number.saturating_add(1),
            ..self
        }
    }

    /// Query pairs in wire order: `pageSize`, then `pageNumber`.
    pub fn query_pairs(&self) -> [(&'static str, String); 2] {
        [
            ("pageSize", self.page_size.to_string()),
            ("pageNumber", self.page_number.to_string()),
        ]
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_number: DEFAULT_PAGE_NUMBER,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub items_count: u64,
    pub page_count: u32,
    pub page_number: u32,
    pub page_size: u32,
}

impl PageMeta {
    pub fn has_next(&self) -> bool {
        self.page_number < self.page_count
    }
}

/// `{ "data": [...], "metaData": {...} }`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta_data: PageMeta,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, meta_data: PageMeta) -> Self {
        Self { data, meta_data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
