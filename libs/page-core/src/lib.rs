//! Page-number pagination: the request side (`PageRequest`) and the
//! response envelope (`Page<T>` with `PageMeta`).

mod page;

pub use page::{Page, PageError, PageMeta, PageRequest, DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE};
