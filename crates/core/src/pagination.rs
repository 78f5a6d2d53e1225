//! Client-side pagination over already-fetched lists.
//!
//! The backend returns whole collections; list pages filter them and then
//! slice out one page. Pages are 1-based.

/// Number of pages needed for `total_items` at `per_page` items per page.
///
/// A `per_page` of zero is treated as one.
#[must_use]
pub const fn page_count(total_items: usize, per_page: usize) -> usize {
    let per_page = if per_page == 0 { 1 } else { per_page };
    total_items.div_ceil(per_page)
}

/// One page of a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Current page number (1-based).
    pub page: usize,
    /// Page size used for slicing.
    pub per_page: usize,
    /// Number of items before slicing.
    pub total_items: usize,
    /// Number of pages; zero for an empty list.
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Slice `items` down to the requested page.
    ///
    /// The page number is clamped into `1..=total_pages`, so a stale link to
    /// page 9 of a list that shrank to 3 pages shows page 3.
    #[must_use]
    pub fn paginate(items: Vec<T>, page: usize, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let total_items = items.len();
        let total_pages = page_count(total_items, per_page);
        let page = page.clamp(1, total_pages.max(1));

        let items = items
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .collect();

        Self {
            items,
            page,
            per_page,
            total_items,
            total_pages,
        }
    }

    /// Whether a previous page exists.
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Whether a next page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Previous page number (saturates at 1).
    #[must_use]
    pub const fn prev_page(&self) -> usize {
        if self.page > 1 { self.page - 1 } else { 1 }
    }

    /// Next page number (saturates at the last page).
    #[must_use]
    pub const fn next_page(&self) -> usize {
        if self.page < self.total_pages {
            self.page + 1
        } else {
            self.page
        }
    }

    /// Page numbers for pagination links.
    #[must_use]
    pub fn page_numbers(&self) -> Vec<usize> {
        (1..=self.total_pages).collect()
    }

    /// Whether the list has no items at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.total_items == 0
    }

    /// Map the items while keeping the page metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_is_ceiling() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(1, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(25, 12), 3);
        assert_eq!(page_count(5, 0), 5);
    }

    #[test]
    fn test_last_page_holds_remainder() {
        let page = Page::paginate((1..=25).collect::<Vec<_>>(), 3, 12);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items, vec![25]);
        assert_eq!(page.items.len(), 25 % 12);
    }

    #[test]
    fn test_last_page_full_when_divisible() {
        let page = Page::paginate((1..=24).collect::<Vec<_>>(), 2, 12);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 12);
        assert!(!page.has_next());
        assert!(page.has_prev());
    }

    #[test]
    fn test_page_is_clamped() {
        let page = Page::paginate((1..=5).collect::<Vec<_>>(), 9, 2);
        assert_eq!(page.page, 3);
        assert_eq!(page.items, vec![5]);

        let page = Page::paginate((1..=5).collect::<Vec<_>>(), 0, 2);
        assert_eq!(page.page, 1);
        assert_eq!(page.items, vec![1, 2]);
    }

    #[test]
    fn test_empty_list() {
        let page: Page<i32> = Page::paginate(Vec::new(), 4, 10);
        assert!(page.is_empty());
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next());
        assert!(!page.has_prev());
        assert!(page.page_numbers().is_empty());
    }

    #[test]
    fn test_prev_next_numbers() {
        let page = Page::paginate((1..=30).collect::<Vec<_>>(), 2, 10);
        assert_eq!(page.prev_page(), 1);
        assert_eq!(page.next_page(), 3);
        assert_eq!(page.page_numbers(), vec![1, 2, 3]);
    }
}
