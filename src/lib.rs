// Library module for testable functions

pub mod api;
pub mod config;
pub mod error;
pub mod query;

/// Largest page the data table will serve in one request
pub const MAX_PAGE_SIZE: i64 = 1000;

/// Row offset of a 1-based page
/// Formula: (page - 1) × page_size, saturating at `i64::MAX`
pub fn page_offset(page: i64, page_size: i64) -> i64 {
    page.saturating_sub(1).saturating_mul(page_size)
}

/// Number of pages needed to show `total` rows, `ceil(total / page_size)`
pub fn total_pages(total: i64, page_size: i64) -> i64 {
    if page_size <= 0 || total <= 0 {
        return 0;
    }
    (total + page_size - 1) / page_size
}
