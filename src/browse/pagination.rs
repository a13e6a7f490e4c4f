use std::ops::Range;

/// One entry of the pager strip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagerButton {
    pub number: usize,
    pub selected: bool,
}

/// Fixed-size pages over an owned result set.
///
/// Pages are 1-based. The current page is always kept within
/// `1..=total_pages()` (page 1 when empty). Every change to what the visible
/// page holds bumps `generation`, which renderers compare to decide whether
/// to redraw.
#[derive(Debug, Clone)]
pub struct Paginator<T> {
    items: Vec<T>,
    page_size: usize,
    current_page: usize,
    generation: u64,
}

impl<T> Paginator<T> {
    pub fn new(page_size: usize) -> Self {
        Self::with_items(Vec::new(), page_size)
    }

    pub fn with_items(items: Vec<T>, page_size: usize) -> Self {
        Self {
            items,
            page_size: page_size.max(1),
            current_page: 1,
            generation: 0,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn total_pages(&self) -> usize {
        self.items.len().div_ceil(self.page_size)
    }

    /// Index range of the current page within the full set
    pub fn page_range(&self) -> Range<usize> {
        let start = ((self.current_page - 1) * self.page_size).min(self.items.len());
        let end = (start + self.page_size).min(self.items.len());
        start..end
    }

    /// The visible slice
    pub fn page(&self) -> &[T] {
        &self.items[self.page_range()]
    }

    /// Mutate entries of the visible page in place. The page keeps its shape;
    /// the generation is bumped so the change gets rendered.
    pub fn update_page<F>(&mut self, f: F)
    where
        F: FnOnce(&mut [T]),
    {
        let range = self.page_range();
        f(&mut self.items[range]);
        self.generation += 1;
    }

    fn clamp_page(&self, page: usize) -> usize {
        page.clamp(1, self.total_pages().max(1))
    }

    /// Jump to page `page`. Requests outside `1..=total_pages()` land on the
    /// nearest valid page. Returns the page actually shown.
    pub fn set_page(&mut self, page: usize) -> usize {
        let clamped = self.clamp_page(page);
        if clamped != page {
            tracing::debug!(requested = page, shown = clamped, "page clamped");
        }
        if clamped != self.current_page {
            self.current_page = clamped;
            self.generation += 1;
        }
        self.current_page
    }

    pub fn next_page(&mut self) -> bool {
        let before = self.current_page;
        self.set_page(before + 1) != before
    }

    pub fn prev_page(&mut self) -> bool {
        let before = self.current_page;
        self.set_page(before.saturating_sub(1)) != before
    }

    /// Replace the result set and go back to page 1
    pub fn reset(&mut self, items: Vec<T>) {
        self.items = items;
        self.current_page = 1;
        self.generation += 1;
    }

    /// Replace the result set but stay on the current page when it still
    /// exists; otherwise clamp to the last page.
    pub fn replace_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.current_page = self.clamp_page(self.current_page);
        self.generation += 1;
    }

    /// Pager strip: one button per page, the current one selected. Empty when
    /// there is nothing to page through.
    pub fn pager(&self) -> Vec<PagerButton> {
        (1..=self.total_pages())
            .map(|number| PagerButton {
                number,
                selected: number == self.current_page,
            })
            .collect()
    }
}
