use contract_core_api::ContractFilter;

/// Offset-based pagination request
///
/// # Example
/// ```
/// use contract_core_db::repository::pagination::PageRequest;
///
/// let first = PageRequest::new(20, 0);
/// let second = PageRequest::for_page(20, 2);
/// assert_eq!(second.offset, 20);
/// assert_eq!(first.page_number(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    /// Maximum number of items to return
    pub limit: usize,
    /// Number of items to skip
    pub offset: usize,
}

impl PageRequest {
    /// Upper bound on a single page; larger requests are clamped.
    pub const MAX_LIMIT: usize = 500;

    pub fn new(limit: usize, offset: usize) -> Self {
        Self {
            limit: limit.min(Self::MAX_LIMIT),
            offset,
        }
    }

    /// Page request for a 1-based page number
    pub fn for_page(page_size: usize, page_number: usize) -> Self {
        let page_number = page_number.max(1);
        Self::new(page_size, (page_number - 1) * page_size)
    }

    /// The request for the page after this one
    pub fn next(&self) -> Self {
        Self::new(self.limit, self.offset + self.limit)
    }

    pub fn page_number(&self) -> usize {
        if self.limit == 0 {
            1
        } else {
            (self.offset / self.limit) + 1
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
        }
    }
}

impl From<&ContractFilter> for PageRequest {
    fn from(filter: &ContractFilter) -> Self {
        PageRequest::new(filter.limit, filter.offset)
    }
}

/// Paginated response containing items and metadata
///
/// # Example
/// ```
/// use contract_core_db::repository::pagination::Page;
///
/// let page = Page::new(vec![1, 2, 3], 100, 20, 0);
/// assert!(page.has_more());
/// assert_eq!(page.total_pages(), 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// The items in this page
    pub items: Vec<T>,
    /// Total number of matching items across all pages
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: usize, limit: usize, offset: usize) -> Self {
        Self {
            items,
            total,
            limit,
            offset,
        }
    }

    pub fn empty(page: PageRequest) -> Self {
        Self::new(Vec::new(), 0, page.limit, page.offset)
    }

    /// Check if there are more pages after this one
    pub fn has_more(&self) -> bool {
        self.offset + self.items.len() < self.total
    }

    pub fn total_pages(&self) -> usize {
        if self.limit == 0 {
            1
        } else {
            self.total.div_ceil(self.limit)
        }
    }

    /// Convert the items while keeping the page metadata
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}
