//! Page window over the filtered, ordered deployment sequence.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// One page of an ordered sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct PageWindow<'a, T> {
    pub items: &'a [T],
    pub total_items: usize,
    pub total_pages: usize,
    /// 1-based page actually shown, after clamping.
    pub page: usize,
}

/// Number of pages for `total_items`. Never less than one.
pub fn total_pages(total_items: usize, page_size: NonZeroUsize) -> usize {
    total_items.div_ceil(page_size.get()).max(1)
}

/// Slice `items` into the requested page, clamping out-of-range pages to
/// the nearest valid one.
pub fn paginate<T>(items: &[T], page: usize, page_size: NonZeroUsize) -> PageWindow<'_, T> {
    let total_items = items.len();
    let total_pages = total_pages(total_items, page_size);
    let page = page.clamp(1, total_pages);
    let page_size = page_size.get();

    let start = (page - 1).saturating_mul(page_size).min(total_items);
    let end = start.saturating_add(page_size).min(total_items);

    PageWindow {
        items: &items[start..end],
        total_items,
        total_pages,
        page,
    }
}

/// Current page and page size of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    current_page: usize,
    items_per_page: NonZeroUsize,
}

impl PageState {
    pub fn new(items_per_page: usize) -> Result<Self, SyncError> {
        Ok(Self {
            current_page: 1,
            items_per_page: non_zero(items_per_page)?,
        })
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page.get()
    }

    /// Navigate to `page`, clamped against `total_items`.
    pub fn set_page(&mut self, page: usize, total_items: usize) {
        self.current_page = page;
        self.clamp(total_items);
    }

    /// Change the page size. The old offset means nothing under the new
    /// divisor, so the view returns to page 1.
    pub fn set_page_size(&mut self, items_per_page: usize) -> Result<(), SyncError> {
        self.items_per_page = non_zero(items_per_page)?;
        self.current_page = 1;
        Ok(())
    }

    /// Back to the first page, used when the filter changes.
    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    /// Keep `current_page` inside `1..=total_pages` after the item count
    /// changed. Content-only changes leave the page alone.
    pub fn clamp(&mut self, total_items: usize) {
        let last = total_pages(total_items, self.items_per_page);
        self.current_page = self.current_page.clamp(1, last);
    }

    pub fn window<'a, T>(&self, items: &'a [T]) -> PageWindow<'a, T> {
        paginate(items, self.current_page, self.items_per_page)
    }
}

fn non_zero(items_per_page: usize) -> Result<NonZeroUsize, SyncError> {
    NonZeroUsize::new(items_per_page)
        .ok_or_else(|| SyncError::InvalidInput("items per page must be positive".into()))
}
