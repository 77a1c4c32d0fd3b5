use serde::{Deserialize, Serialize};

/// Hard cap applied to every page size.
pub const MAX_PAGE_LIMIT: i64 = 50;

/// Raw `limit`/`offset` query parameters as sent by the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageParams {
    pub fn window(&self, default_limit: i64) -> PageWindow {
        PageWindow::new(self.limit, self.offset, default_limit)
    }
}

/// A clamped `limit`/`offset` pair. Construct through [`PageWindow::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    limit: i64,
    offset: i64,
}

impl PageWindow {
    /// Missing or non-positive limit falls back to `default_limit`, anything
    /// above [`MAX_PAGE_LIMIT`] is capped. Missing or negative offset is 0.
    pub fn new(limit: Option<i64>, offset: Option<i64>, default_limit: i64) -> Self {
        let limit = match limit {
            Some(l) if l > 0 => l,
            _ => default_limit,
        }
        .clamp(1, MAX_PAGE_LIMIT);
        let offset = offset.unwrap_or(0).max(0);
        Self { limit, offset }
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// `items[offset .. min(offset + limit, len)]`; empty when offset is past the end.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(usize::try_from(self.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(self.limit).unwrap_or(usize::MAX))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationData {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

impl PaginationData {
    pub fn new(total: i64, window: PageWindow) -> Self {
        Self {
            total,
            limit: window.limit,
            offset: window.offset,
            has_more: window.offset.saturating_add(window.limit) < total,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub pagination: PaginationData,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, window: PageWindow) -> Self {
        Self {
            items,
            pagination: PaginationData::new(total, window),
        }
    }
}
