use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;

/// Number of consecutive page buttons shown around the current page.
pub const DEFAULT_WINDOW: u32 = 5;
/// Page sizes offered by the list views.
pub const PAGE_SIZE_OPTIONS: [u32; 4] = [5, 10, 15, 20];
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// `pagination_info` block as returned by the upstream list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct PaginationInfo {
    pub total_records: u64,
    pub total_pages: u32,
    pub page_size: u32,
    pub current_page: u32,
    pub next_page: Option<u32>,
    pub prev_page: Option<u32>,
}

/// Pagination metadata after clamping.
///
/// `current_page` always lies in `[1, max(total_pages, 1)]`, `next_page` is `None` exactly on
/// the last page and `prev_page` is `None` exactly on the first page. `total_pages` is zero
/// only for an empty listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct PaginationState {
    pub total_records: u64,
    pub total_pages: u32,
    pub current_page: u32,
    pub page_size: u32,
    pub next_page: Option<u32>,
    pub prev_page: Option<u32>,
}

impl PaginationState {
    pub fn new(total_records: u64, total_pages: u32, current_page: u32, page_size: u32) -> Self {
        let last_page = total_pages.max(1);
        let current_page = current_page.clamp(1, last_page);
        let page_size = if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size };

        Self {
            total_records,
            total_pages,
            current_page,
            page_size,
            next_page: (current_page < total_pages).then_some(current_page + 1),
            prev_page: (current_page > 1).then_some(current_page - 1),
        }
    }

    /// Builds the state from upstream metadata. Out-of-range pages are clamped rather than
    /// rejected and the upstream `next_page`/`prev_page` values are recomputed.
    pub fn from_info(info: &PaginationInfo) -> Self {
        Self::new(info.total_records, info.total_pages, info.current_page, info.page_size)
    }

    pub fn is_first_page(&self) -> bool {
        self.prev_page.is_none()
    }

    pub fn is_last_page(&self) -> bool {
        self.next_page.is_none()
    }

    pub fn page_markers(&self) -> Vec<PageMarker> {
        page_window(self.current_page, self.total_pages, DEFAULT_WINDOW)
    }

    /// "Total: 25 records | Pages: 5"
    pub fn summary_label(&self) -> String {
        format!("Total: {} records | Pages: {}", self.total_records, self.total_pages)
    }

    /// "6 - 10 of 25" for the rows shown on the current page; "0 - 0 of N" when the page is empty.
    pub fn range_label(&self, rows_on_page: usize) -> String {
        if rows_on_page == 0 {
            return format!("0 - 0 of {}", self.total_records);
        }

        let start = u64::from(self.current_page - 1) * u64::from(self.page_size) + 1;
        let end = start + rows_on_page as u64 - 1;
        format!("{} - {} of {}", start, end, self.total_records)
    }

    /// The request that produced this page.
    pub fn request(&self) -> PageRequest {
        PageRequest {
            page: self.current_page,
            page_size: self.page_size,
        }
    }

    /// Request for `page` at the current page size, clamped to the known range.
    pub fn page_request(&self, page: u32) -> PageRequest {
        let mut request = self.request();
        request.set_page(page, self.total_pages);
        request
    }

    /// Request for the previous page, if there is one.
    pub fn prev_request(&self) -> Option<PageRequest> {
        self.prev_page.map(|page| self.page_request(page))
    }

    /// Request for the next page, if there is one.
    pub fn next_request(&self) -> Option<PageRequest> {
        self.next_page.map(|page| self.page_request(page))
    }

    /// One request per offered page size, each back on page 1.
    pub fn page_size_requests(&self) -> Vec<PageRequest> {
        PAGE_SIZE_OPTIONS
            .iter()
            .map(|&page_size| {
                let mut request = self.request();
                request.set_page_size(page_size);
                request
            })
            .collect()
    }
}

/// One entry of the page navigation bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(crate = "rocket::serde", tag = "kind", content = "number", rename_all = "snake_case")]
pub enum PageMarker {
    Page(u32),
    Ellipsis,
}

/// Computes the page navigation bar for `current_page` out of `total_pages`.
///
/// Shows every page when they fit in `window`. Otherwise shows `window` consecutive pages
/// centred on the current page, re-anchored at either end so the block keeps its size, plus
/// page 1 and the last page as anchors with a single ellipsis for each gap of two or more.
pub fn page_window(current_page: u32, total_pages: u32, window: u32) -> Vec<PageMarker> {
    if total_pages == 0 {
        return Vec::new();
    }

    let window = window.max(1);
    if total_pages <= window {
        return (1..=total_pages).map(PageMarker::Page).collect();
    }

    let current_page = current_page.clamp(1, total_pages);
    let mut start = current_page.saturating_sub(window / 2).max(1);
    let end = (start + window - 1).min(total_pages);
    if end - start < window - 1 {
        start = (end + 1).saturating_sub(window).max(1);
    }

    let mut markers = Vec::with_capacity(window as usize + 4);
    if start > 1 {
        markers.push(PageMarker::Page(1));
        if start > 2 {
            markers.push(PageMarker::Ellipsis);
        }
    }

    markers.extend((start..=end).map(PageMarker::Page));

    if end < total_pages {
        if end < total_pages - 1 {
            markers.push(PageMarker::Ellipsis);
        }
        markers.push(PageMarker::Page(total_pages));
    }

    markers
}

/// Page and page size the caller wants fetched next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Validates raw query parameters. A missing page means page 1 and page 0 is clamped to 1;
    /// a page size outside [`PAGE_SIZE_OPTIONS`] is rejected.
    pub fn from_query(page: Option<u32>, page_size: Option<u32>) -> Result<Self, String> {
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if !PAGE_SIZE_OPTIONS.contains(&page_size) {
            return Err(format!("page_size must be one of {:?}", PAGE_SIZE_OPTIONS));
        }

        Ok(Self {
            page: page.unwrap_or(1).max(1),
            page_size,
        })
    }

    /// Moves to `page`, clamped to the known page range.
    pub fn set_page(&mut self, page: u32, total_pages: u32) {
        self.page = page.clamp(1, total_pages.max(1));
    }

    /// Changes the page size. Always goes back to the first page.
    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = page_size;
        self.page = 1;
    }
}

/// A page of records ready for a list view.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct PaginatedView<T> {
    pub records: Vec<T>,
    pub pagination: PaginationState,
    pub pages: Vec<PageMarker>,
    pub summary: String,
    pub range: String,
    pub prev: Option<PageRequest>,
    pub next: Option<PageRequest>,
    pub page_size_options: Vec<PageRequest>,
}

impl<T> PaginatedView<T> {
    pub fn new(records: Vec<T>, info: &PaginationInfo) -> Self {
        let pagination = PaginationState::from_info(info);

        Self {
            pages: pagination.page_markers(),
            summary: pagination.summary_label(),
            range: pagination.range_label(records.len()),
            prev: pagination.prev_request(),
            next: pagination.next_request(),
            page_size_options: pagination.page_size_requests(),
            records,
            pagination,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedView<U> {
        PaginatedView {
            records: self.records.into_iter().map(f).collect(),
            pagination: self.pagination,
            pages: self.pages,
            summary: self.summary,
            range: self.range,
            prev: self.prev,
            next: self.next,
            page_size_options: self.page_size_options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PageMarker::{Ellipsis, Page};
    use super::*;
    use proptest::prelude::*;

    fn pages(numbers: &[u32]) -> Vec<PageMarker> {
        numbers.iter().copied().map(Page).collect()
    }

    #[test]
    fn small_totals_show_every_page() {
        for total in 1..=DEFAULT_WINDOW {
            for current in 1..=total {
                let expected: Vec<u32> = (1..=total).collect();
                assert_eq!(page_window(current, total, DEFAULT_WINDOW), pages(&expected));
            }
        }
    }

    #[test]
    fn zero_pages_is_empty() {
        assert!(page_window(1, 0, DEFAULT_WINDOW).is_empty());
    }

    #[test]
    fn middle_page_is_centred_between_anchors() {
        let markers = page_window(10, 20, 5);
        assert_eq!(markers, vec![Page(1), Ellipsis, Page(8), Page(9), Page(10), Page(11), Page(12), Ellipsis, Page(20)]);
    }

    #[test]
    fn first_page_has_no_leading_anchor() {
        assert_eq!(page_window(1, 20, 5), vec![Page(1), Page(2), Page(3), Page(4), Page(5), Ellipsis, Page(20)]);
    }

    #[test]
    fn last_page_is_reanchored() {
        assert_eq!(page_window(20, 20, 5), vec![Page(1), Ellipsis, Page(16), Page(17), Page(18), Page(19), Page(20)]);
    }

    #[test]
    fn adjacent_anchor_has_no_ellipsis() {
        assert_eq!(page_window(4, 7, 5), vec![Page(1), Page(2), Page(3), Page(4), Page(5), Page(6), Page(7)]);
        assert_eq!(page_window(5, 8, 5), vec![Page(1), Ellipsis, Page(3), Page(4), Page(5), Page(6), Page(7), Page(8)]);
    }

    #[test]
    fn out_of_range_current_page_is_clamped() {
        assert_eq!(page_window(0, 20, 5), page_window(1, 20, 5));
        assert_eq!(page_window(99, 20, 5), page_window(20, 20, 5));
    }

    #[test]
    fn state_clamps_and_recomputes_neighbours() {
        let info = PaginationInfo {
            total_records: 25,
            total_pages: 5,
            page_size: 5,
            current_page: 9,
            next_page: Some(10),
            prev_page: Some(8),
        };
        let state = PaginationState::from_info(&info);
        assert_eq!(state.current_page, 5);
        assert_eq!(state.next_page, None);
        assert_eq!(state.prev_page, Some(4));
        assert!(state.is_last_page());
    }

    #[test]
    fn empty_listing_state() {
        let state = PaginationState::new(0, 0, 1, 5);
        assert_eq!(state.current_page, 1);
        assert!(state.is_first_page());
        assert!(state.is_last_page());
        assert!(state.page_markers().is_empty());
        assert_eq!(state.summary_label(), "Total: 0 records | Pages: 0");
        assert_eq!(state.range_label(0), "0 - 0 of 0");
    }

    #[test]
    fn range_label_counts_rows_on_page() {
        let state = PaginationState::new(25, 5, 2, 5);
        assert_eq!(state.range_label(5), "6 - 10 of 25");

        let last = PaginationState::new(23, 5, 5, 5);
        assert_eq!(last.range_label(3), "21 - 23 of 23");
    }

    #[test]
    fn changing_page_size_resets_page() {
        let mut request = PageRequest { page: 4, page_size: 5 };
        request.set_page_size(20);
        assert_eq!(request, PageRequest { page: 1, page_size: 20 });
    }

    #[test]
    fn set_page_is_clamped() {
        let mut request = PageRequest::default();
        request.set_page(12, 4);
        assert_eq!(request.page, 4);
        request.set_page(0, 4);
        assert_eq!(request.page, 1);
    }

    #[test]
    fn from_query_rejects_unknown_page_size() {
        assert!(PageRequest::from_query(Some(1), Some(7)).is_err());
        assert_eq!(PageRequest::from_query(None, None), Ok(PageRequest::default()));
        assert_eq!(PageRequest::from_query(Some(0), Some(10)), Ok(PageRequest { page: 1, page_size: 10 }));
    }

    #[test]
    fn view_exposes_neighbour_requests() {
        let info = PaginationInfo {
            total_records: 12,
            total_pages: 3,
            page_size: 5,
            current_page: 2,
            next_page: Some(3),
            prev_page: Some(1),
        };
        let view = PaginatedView::new(vec!["a", "b", "c", "d", "e"], &info);
        assert_eq!(view.prev, Some(PageRequest { page: 1, page_size: 5 }));
        assert_eq!(view.next, Some(PageRequest { page: 3, page_size: 5 }));
        assert_eq!(view.summary, "Total: 12 records | Pages: 3");
        assert_eq!(view.range, "6 - 10 of 12");
        assert_eq!(view.pages, pages(&[1, 2, 3]));
    }

    #[test]
    fn page_size_options_go_back_to_first_page() {
        let state = PaginationState::new(60, 12, 7, 5);
        let options = state.page_size_requests();
        let sizes: Vec<u32> = options.iter().map(|request| request.page_size).collect();
        assert_eq!(sizes, PAGE_SIZE_OPTIONS.to_vec());
        assert!(options.iter().all(|request| request.page == 1));
    }

    #[test]
    fn page_request_keeps_size_and_clamps() {
        let state = PaginationState::new(60, 12, 7, 5);
        assert_eq!(state.page_request(3), PageRequest { page: 3, page_size: 5 });
        assert_eq!(state.page_request(40), PageRequest { page: 12, page_size: 5 });
    }

    #[test]
    fn markers_serialize_with_kind_tag() {
        let json = rocket::serde::json::serde_json::to_string(&vec![Page(1), Ellipsis]).unwrap();
        assert_eq!(json, r#"[{"kind":"page","number":1},{"kind":"ellipsis"}]"#);
    }

    proptest! {
        #[test]
        fn window_invariants(total in 1u32..500, current in 0u32..600) {
            let markers = page_window(current, total, DEFAULT_WINDOW);
            let numbers: Vec<u32> = markers.iter().filter_map(|m| match m {
                Page(n) => Some(*n),
                Ellipsis => None,
            }).collect();

            prop_assert_eq!(numbers.first().copied(), Some(1));
            prop_assert_eq!(numbers.last().copied(), Some(total));
            prop_assert!(numbers.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(numbers.contains(&current.clamp(1, total)));

            for pair in markers.windows(2) {
                prop_assert!(!(pair[0] == Ellipsis && pair[1] == Ellipsis));
            }

            if total > DEFAULT_WINDOW {
                // the centred block plus at most two anchors
                prop_assert!(numbers.len() >= DEFAULT_WINDOW as usize);
                prop_assert!(numbers.len() <= DEFAULT_WINDOW as usize + 2);
            }
        }

        #[test]
        fn ellipsis_only_for_real_gaps(total in 1u32..200, current in 1u32..200) {
            let markers = page_window(current, total, DEFAULT_WINDOW);
            for (i, marker) in markers.iter().enumerate() {
                if *marker == Ellipsis {
                    match (markers[i - 1], markers[i + 1]) {
                        (Page(before), Page(after)) => prop_assert!(after - before >= 2),
                        _ => prop_assert!(false, "ellipsis must sit between two pages"),
                    }
                }
            }
        }
    }
}
