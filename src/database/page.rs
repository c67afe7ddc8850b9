use serde::ser::SerializeMap;
use serde::Serialize;
use snafu::{ensure, Snafu};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum InvalidPage {
    #[snafu(display("page must be at least 1, got {page}"))]
    PageOutOfRange { page: u64 },
    #[snafu(display("limit must be at least 1, got {limit}"))]
    LimitOutOfRange { limit: u64 },
    #[snafu(display("page {page} is too far to reach with a limit of {limit}"))]
    PageTooLarge { page: u64, limit: u64 },
}

/// Largest number of skipped rows the database accepts.
const MAX_START: u64 = i64::MAX as u64;

/// Which slice of a listing to return. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    /// Validates a client supplied page and limit, filling in defaults. Limits above [MAX_LIMIT] are capped.
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Result<Self, InvalidPage> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);

        ensure!(page >= 1, PageOutOfRangeSnafu { page });
        ensure!(limit >= 1, LimitOutOfRangeSnafu { limit });

        let limit = limit.min(MAX_LIMIT);
        let reachable = (page - 1).checked_mul(limit).is_some_and(|start| start <= MAX_START);
        ensure!(reachable, PageTooLargeSnafu { page, limit });

        Ok(Self { page, limit })
    }

    /// Number of rows skipped before this page.
    pub fn start(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Field names a page is serialized under, e.g. `videos` / `totalVideos`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Labels {
    pub items: &'static str,
    pub total: &'static str,
}

impl Labels {
    pub const VIDEOS: Labels = Labels::new("videos", "totalVideos");
    pub const COMMENTS: Labels = Labels::new("comments", "totalComments");
    pub const TWEETS: Labels = Labels::new("tweets", "totalTweets");

    pub const fn new(items: &'static str, total: &'static str) -> Self {
        Self { items, total }
    }
}

/// One page of a listing together with the metadata needed to walk the rest of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of rows matching the filter, across all pages.
    pub total: u64,
    pub request: PageRequest,
    pub labels: Labels,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest, labels: Labels) -> Self {
        Self {
            items,
            total,
            request,
            labels,
        }
    }

    /// Always at least 1, an empty listing is a single empty page.
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.request.limit).max(1)
    }

    pub fn has_next(&self) -> bool {
        self.request.page < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.request.page > 1
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Serialize> Serialize for Page<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let page = self.request.page;
        let next = self.has_next().then_some(page + 1);
        let prev = self.has_prev().then_some(page - 1);

        let mut map = serializer.serialize_map(Some(10))?;
        map.serialize_entry(self.labels.items, &self.items)?;
        map.serialize_entry(self.labels.total, &self.total)?;
        map.serialize_entry("limit", &self.request.limit)?;
        map.serialize_entry("page", &page)?;
        map.serialize_entry("totalPages", &self.total_pages())?;
        map.serialize_entry("pagingCounter", &(self.request.start() + 1))?;
        map.serialize_entry("hasPrevPage", &self.has_prev())?;
        map.serialize_entry("hasNextPage", &self.has_next())?;
        map.serialize_entry("prevPage", &prev)?;
        map.serialize_entry("nextPage", &next)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn page(total: u64, page: u64, limit: u64) -> Page<u64> {
        let request = PageRequest::new(Some(page), Some(limit)).unwrap();
        let items = (request.start()..total.min(request.start() + limit)).collect();
        Page::new(items, total, request, Labels::VIDEOS)
    }

    #[test]
    fn defaults_and_validation() {
        assert_eq!(PageRequest::new(None, None).unwrap(), PageRequest::default());
        assert_eq!(
            PageRequest::new(Some(0), None).unwrap_err(),
            InvalidPage::PageOutOfRange { page: 0 }
        );
        assert_eq!(
            PageRequest::new(None, Some(0)).unwrap_err(),
            InvalidPage::LimitOutOfRange { limit: 0 }
        );
        assert_eq!(PageRequest::new(None, Some(5_000)).unwrap().limit, MAX_LIMIT);
    }

    #[test]
    fn start_skips_previous_pages() {
        assert_eq!(PageRequest::new(Some(1), Some(10)).unwrap().start(), 0);
        assert_eq!(PageRequest::new(Some(3), Some(10)).unwrap().start(), 20);
    }

    #[test]
    fn rejects_pages_past_the_largest_offset() {
        for page in [1_000_000_000_000_000_000, i64::MAX as u64, u64::MAX] {
            assert_eq!(
                PageRequest::new(Some(page), Some(10)).unwrap_err(),
                InvalidPage::PageTooLarge { page, limit: 10 }
            );
        }

        let furthest = MAX_START / MAX_LIMIT + 1;
        assert_eq!(PageRequest::new(Some(furthest), Some(500)).unwrap().start(), (furthest - 1) * MAX_LIMIT);
        assert!(PageRequest::new(Some(furthest + 1), Some(MAX_LIMIT)).is_err());
    }

    #[test]
    fn first_of_three_pages() {
        let page = page(25, 1, 10);
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());
        assert!(!page.has_prev());
    }

    #[test]
    fn last_partial_page() {
        let page = page(25, 3, 10);
        assert_eq!(page.items.len(), 5);
        assert!(!page.has_next());
        assert!(page.has_prev());
    }

    #[test]
    fn empty_listing_is_one_empty_page() {
        let page = page(0, 1, 10);
        assert!(page.is_empty());
        assert_eq!(page.total_pages(), 1);
        assert!(!page.has_next());
    }

    #[test]
    fn serializes_under_the_requested_labels() {
        let page = Page::new(vec!["a", "b"], 12, PageRequest::new(Some(2), Some(2)).unwrap(), Labels::COMMENTS);

        assert_eq!(
            serde_json::to_value(&page).unwrap(),
            json!({
                "comments": ["a", "b"],
                "totalComments": 12,
                "limit": 2,
                "page": 2,
                "totalPages": 6,
                "pagingCounter": 3,
                "hasPrevPage": true,
                "hasNextPage": true,
                "prevPage": 1,
                "nextPage": 3,
            })
        );
    }
}
