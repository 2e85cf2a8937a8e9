//! Pagination arithmetic for the conversation list.
//!
//! Pure functions only; the view-model owns the current page and size.

use std::ops::Range;

#[cfg(test)]
#[path = "pagination_test.rs"]
mod pagination_test;

/// Page sizes offered by the size picker.
pub const PAGE_SIZES: [usize; 2] = [5, 10];

pub const DEFAULT_PAGE_SIZE: usize = PAGE_SIZES[0];

/// Maximum number of numbered page buttons shown at once.
pub const MAX_PAGE_BUTTONS: usize = 5;

/// Number of pages needed for `total_elements`; zero when there is nothing to show.
#[must_use]
pub fn total_pages(total_elements: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total_elements.div_ceil(page_size)
}

/// Index range of `page` within a collection of `total_elements`, clamped to
/// the collection. Pages past the end yield an empty range.
#[must_use]
pub fn page_bounds(total_elements: usize, page: usize, page_size: usize) -> Range<usize> {
    let start = page.saturating_mul(page_size).min(total_elements);
    let end = start.saturating_add(page_size).min(total_elements);
    start..end
}

/// Page indices to render as numbered buttons.
///
/// Shows every page when there are at most five. Otherwise the window is
/// pinned to the first five pages while `current_page < 3`, to the last five
/// once `current_page >= total_pages - 3`, and centered on the current page
/// in between.
#[must_use]
pub fn page_buttons(total_pages: usize, current_page: usize) -> Range<usize> {
    if total_pages <= MAX_PAGE_BUTTONS {
        return 0..total_pages;
    }
    let start = if current_page < 3 {
        0
    } else if current_page >= total_pages - 3 {
        total_pages - MAX_PAGE_BUTTONS
    } else {
        current_page - 2
    };
    start..start + MAX_PAGE_BUTTONS
}
