//! Pagination engine.
//!
//! Converts a `(page, page_size)` cursor plus the server's total item count
//! into display metadata and a compressed page-number window. Pages are
//! 1-indexed. An empty collection has `total_pages == 0` and renders as
//! "Showing 0 to 0 of 0".

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Maximum page size accepted by the backend.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size used to load dropdown options and assignment candidates.
pub const OPTIONS_PAGE_SIZE: u32 = 100;

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// A request position: which page, and how many rows per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageCursor {
    pub page: u32,
    pub page_size: u32,
}

impl PageCursor {
    /// Build a cursor, clamping `page` to at least 1 and `page_size` to
    /// `1..=MAX_PAGE_SIZE`.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// The first page at the given size.
    pub fn first(page_size: u32) -> Self {
        Self::new(1, page_size)
    }

    /// Cursor used for option lists.
    pub fn options() -> Self {
        Self::first(OPTIONS_PAGE_SIZE)
    }

    /// Zero-based index of the first row on this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

/// `ceil(total_items / page_size)`, or 0 for an empty collection.
pub fn total_pages(total_items: u64, page_size: u32) -> u32 {
    let size = u64::from(page_size.max(1));
    let pages = total_items.div_ceil(size);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Display metadata derived from a cursor and a total item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    /// Current page, clamped into `1..=max(total_pages, 1)`.
    pub page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u32,
    /// 1-based index of the first row shown, 0 when empty.
    pub start_item: u64,
    /// 1-based index of the last row shown, 0 when empty.
    pub end_item: u64,
}

impl PageMeta {
    pub fn compute(page: u32, page_size: u32, total_items: u64) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_pages(total_items, page_size);
        let page = page.clamp(1, total_pages.max(1));
        let size = u64::from(page_size);

        let (start_item, end_item) = if total_items == 0 {
            (0, 0)
        } else {
            let start = u64::from(page - 1) * size + 1;
            let end = (u64::from(page) * size).min(total_items);
            (start, end)
        };

        Self {
            page,
            page_size,
            total_items,
            total_pages,
            start_item,
            end_item,
        }
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Page links for the navigation bar.
    pub fn window(&self) -> Vec<PageLink> {
        page_window(self.page, self.total_pages)
    }

    /// e.g. `"Showing 1 to 5 of 12 departments"`.
    pub fn summary(&self, noun: &str) -> String {
        format!(
            "Showing {} to {} of {} {noun}",
            self.start_item, self.end_item, self.total_items
        )
    }
}

/// One entry of the page-number bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page { number: u32, current: bool },
    Ellipsis,
}

/// Compute the page-number window.
///
/// Always shows the first page, the last page, the current page, and its
/// immediate neighbours. A gap of exactly one page shows that page; a gap
/// of two or more pages collapses into a single [`PageLink::Ellipsis`]. The
/// rule is applied identically on both sides of the current page.
pub fn page_window(current: u32, total_pages: u32) -> Vec<PageLink> {
    if total_pages == 0 {
        return Vec::new();
    }
    let current = current.clamp(1, total_pages);

    let mut anchors = vec![1, current.saturating_sub(1), current, current + 1, total_pages];
    anchors.retain(|&p| p >= 1 && p <= total_pages);
    anchors.sort_unstable();
    anchors.dedup();

    let mut links = Vec::with_capacity(anchors.len() + 2);
    let mut previous: Option<u32> = None;
    for page in anchors {
        if let Some(prev) = previous {
            match page - prev - 1 {
                0 => {}
                1 => links.push(PageLink::Page {
                    number: prev + 1,
                    current: prev + 1 == current,
                }),
                _ => links.push(PageLink::Ellipsis),
            }
        }
        links.push(PageLink::Page {
            number: page,
            current: page == current,
        });
        previous = Some(page);
    }
    links
}

// ---------------------------------------------------------------------------
// Stateful paginator
// ---------------------------------------------------------------------------

/// Navigation state for one list.
///
/// Out-of-range moves are ignored here rather than left to callers, so a
/// request for a page past the end is never produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    page: u32,
    page_size: u32,
    total_items: u64,
}

impl Paginator {
    pub fn new(page_size: u32) -> Self {
        let cursor = PageCursor::first(page_size);
        Self {
            page: cursor.page,
            page_size: cursor.page_size,
            total_items: 0,
        }
    }

    pub fn cursor(&self) -> PageCursor {
        PageCursor::new(self.page, self.page_size)
    }

    pub fn meta(&self) -> PageMeta {
        PageMeta::compute(self.page, self.page_size, self.total_items)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Record the server's total. If the current page no longer exists
    /// (e.g. the last row of the last page was deleted) the page moves back
    /// to the new last page. Returns `true` when the page changed.
    pub fn set_total(&mut self, total_items: u64) -> bool {
        self.total_items = total_items;
        let last = total_pages(total_items, self.page_size).max(1);
        if self.page > last {
            self.page = last;
            return true;
        }
        false
    }

    /// Advance one page. No-op on the last page.
    pub fn next_page(&mut self) -> bool {
        if self.meta().has_next() {
            self.page += 1;
            true
        } else {
            false
        }
    }

    /// Go back one page. No-op on the first page.
    pub fn prev_page(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    /// Jump to `page`. Pages outside `1..=total_pages` are ignored.
    pub fn go_to(&mut self, page: u32) -> bool {
        let last = total_pages(self.total_items, self.page_size).max(1);
        if page == self.page || page < 1 || page > last {
            return false;
        }
        self.page = page;
        true
    }

    /// Change the page size and return to the first page.
    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self.page = 1;
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

// ---------------------------------------------------------------------------
// PagedCollection
// ---------------------------------------------------------------------------

/// One page of a larger list plus its pagination metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedCollection<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl<T> PagedCollection<T> {
    /// Build a page. Rows beyond `cursor.page_size` are dropped so the
    /// collection never holds more than one page.
    pub fn new(mut items: Vec<T>, cursor: PageCursor, total_items: u64) -> Self {
        items.truncate(cursor.page_size as usize);
        let total_items = total_items.max(items.len() as u64);
        Self {
            items,
            page: cursor.page,
            page_size: cursor.page_size,
            total_items,
            total_pages: total_pages(total_items, cursor.page_size),
        }
    }

    pub fn empty(cursor: PageCursor) -> Self {
        Self::new(Vec::new(), cursor, 0)
    }

    pub fn meta(&self) -> PageMeta {
        PageMeta::compute(self.page, self.page_size, self.total_items)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedCollection<U> {
        PagedCollection {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

/// Paginate an already-fetched list on the client (used after client-side
/// filtering).
pub fn paginate_local<T: Clone>(items: &[T], cursor: PageCursor) -> PagedCollection<T> {
    let meta = PageMeta::compute(cursor.page, cursor.page_size, items.len() as u64);
    let page_items = if meta.total_items == 0 {
        Vec::new()
    } else {
        items[(meta.start_item - 1) as usize..meta.end_item as usize].to_vec()
    };
    PagedCollection::new(
        page_items,
        PageCursor::new(meta.page, meta.page_size),
        meta.total_items,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(links: &[PageLink]) -> String {
        links
            .iter()
            .map(|l| match l {
                PageLink::Page {
                    number,
                    current: true,
                } => format!("[{number}]"),
                PageLink::Page { number, .. } => number.to_string(),
                PageLink::Ellipsis => "...".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    // -- metadata ------------------------------------------------------------

    #[test]
    fn twelve_items_five_per_page() {
        let first = PageMeta::compute(1, 5, 12);
        assert_eq!(first.total_pages, 3);
        assert_eq!((first.start_item, first.end_item), (1, 5));

        let last = PageMeta::compute(3, 5, 12);
        assert_eq!((last.start_item, last.end_item), (11, 12));
    }

    #[test]
    fn empty_collection_has_zero_pages_and_renders_zero_of_zero() {
        let meta = PageMeta::compute(1, 10, 0);
        assert_eq!(meta.total_pages, 0);
        assert_eq!((meta.start_item, meta.end_item), (0, 0));
        assert_eq!(meta.summary("departments"), "Showing 0 to 0 of 0 departments");
        assert!(meta.window().is_empty());
        assert!(!meta.has_next());
        assert!(!meta.has_prev());
    }

    #[test]
    fn start_and_end_stay_in_bounds_for_all_inputs() {
        for total in 0..=60u64 {
            for size in 1..=12u32 {
                for page in 0..=15u32 {
                    let m = PageMeta::compute(page, size, total);
                    assert!(m.start_item <= m.end_item, "{page}/{size}/{total}");
                    assert!(m.end_item <= total, "{page}/{size}/{total}");
                    if total > 0 {
                        assert!(m.start_item >= 1);
                        assert!(m.end_item - m.start_item < u64::from(size));
                    }
                    assert_eq!(u64::from(m.total_pages), total.div_ceil(u64::from(size)));
                }
            }
        }
    }

    #[test]
    fn out_of_range_page_is_clamped() {
        let m = PageMeta::compute(9, 5, 12);
        assert_eq!(m.page, 3);
        assert_eq!((m.start_item, m.end_item), (11, 12));
    }

    // -- window --------------------------------------------------------------

    #[test]
    fn window_small_ranges_show_every_page() {
        assert_eq!(pages(&page_window(1, 1)), "[1]");
        assert_eq!(pages(&page_window(2, 3)), "1 [2] 3");
        assert_eq!(pages(&page_window(1, 4)), "[1] 2 3 4");
    }

    #[test]
    fn window_single_page_gap_is_not_collapsed() {
        assert_eq!(pages(&page_window(4, 7)), "1 2 3 [4] 5 6 7");
    }

    #[test]
    fn window_collapses_gaps_of_two_or_more() {
        assert_eq!(pages(&page_window(1, 10)), "[1] 2 ... 10");
        assert_eq!(pages(&page_window(5, 10)), "1 ... 4 [5] 6 ... 10");
        assert_eq!(pages(&page_window(10, 10)), "1 ... 9 [10]");
    }

    #[test]
    fn window_is_symmetric() {
        for total in 1..=20u32 {
            for current in 1..=total {
                let forward = page_window(current, total);
                let mirrored: Vec<PageLink> = page_window(total + 1 - current, total)
                    .into_iter()
                    .rev()
                    .map(|l| match l {
                        PageLink::Page { number, current } => PageLink::Page {
                            number: total + 1 - number,
                            current,
                        },
                        PageLink::Ellipsis => PageLink::Ellipsis,
                    })
                    .collect();
                assert_eq!(forward, mirrored, "current {current} of {total}");
            }
        }
    }

    // -- paginator -----------------------------------------------------------

    #[test]
    fn next_and_prev_are_noops_at_the_edges() {
        let mut p = Paginator::new(5);
        p.set_total(12);
        assert!(!p.prev_page());
        assert_eq!(p.page(), 1);

        assert!(p.next_page());
        assert!(p.next_page());
        assert_eq!(p.page(), 3);
        assert!(!p.next_page());
        assert_eq!(p.page(), 3);
    }

    #[test]
    fn next_is_noop_before_any_total_is_known() {
        let mut p = Paginator::new(5);
        assert!(!p.next_page());
        assert_eq!(p.cursor(), PageCursor::new(1, 5));
    }

    #[test]
    fn go_to_ignores_out_of_range_pages() {
        let mut p = Paginator::new(5);
        p.set_total(12);
        assert!(!p.go_to(0));
        assert!(!p.go_to(4));
        assert!(p.go_to(3));
        assert_eq!(p.page(), 3);
    }

    #[test]
    fn shrinking_total_moves_back_to_last_page() {
        let mut p = Paginator::new(5);
        p.set_total(11);
        p.go_to(3);
        assert!(p.set_total(10));
        assert_eq!(p.page(), 2);
        assert!(p.set_total(0));
        assert_eq!(p.page(), 1);
    }

    #[test]
    fn page_size_change_resets_to_first_page() {
        let mut p = Paginator::new(5);
        p.set_total(30);
        p.go_to(4);
        p.set_page_size(500);
        assert_eq!(p.cursor(), PageCursor::new(1, MAX_PAGE_SIZE));
    }

    // -- collections ---------------------------------------------------------

    #[test]
    fn collection_truncates_to_page_size() {
        let c = PagedCollection::new((0..8).collect(), PageCursor::new(1, 5), 8);
        assert_eq!(c.items.len(), 5);
        assert_eq!(c.total_pages, 2);
    }

    #[test]
    fn local_pagination_slices_items() {
        let items: Vec<u32> = (1..=12).collect();
        let page = paginate_local(&items, PageCursor::new(3, 5));
        assert_eq!(page.items, vec![11, 12]);
        assert_eq!(page.total_items, 12);

        let empty = paginate_local::<u32>(&[], PageCursor::new(2, 5));
        assert!(empty.is_empty());
        assert_eq!(empty.total_pages, 0);
        assert_eq!(empty.page, 1);
    }
}
