//! crates/dairy_track_core/src/notification_view.rs
//!
//! Search, type filter and pagination over the store's records for the
//! "view all" panel. Projection never mutates the records.

use std::str::FromStr;

use crate::domain::{NotificationRecord, NotificationType};
use crate::ports::PortError;

/// Rows per page in the "view all" panel.
pub const NOTIFICATION_PAGE_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationFilter {
    #[default]
    All,
    Unread,
    Low,
    High,
}

impl NotificationFilter {
    fn matches(self, record: &NotificationRecord) -> bool {
        match self {
            NotificationFilter::All => true,
            NotificationFilter::Unread => !record.is_read,
            NotificationFilter::Low => record.kind == NotificationType::LowProduction,
            NotificationFilter::High => record.kind == NotificationType::HighProduction,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NotificationFilter::All => "all",
            NotificationFilter::Unread => "unread",
            NotificationFilter::Low => "low",
            NotificationFilter::High => "high",
        }
    }
}

impl FromStr for NotificationFilter {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(NotificationFilter::All),
            "unread" => Ok(NotificationFilter::Unread),
            "low" => Ok(NotificationFilter::Low),
            "high" => Ok(NotificationFilter::High),
            other => Err(PortError::Validation(format!("Unknown notification filter '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationQuery {
    pub search_term: String,
    pub filter: NotificationFilter,
    pub page: usize,
    pub page_size: usize,
}

impl Default for NotificationQuery {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            filter: NotificationFilter::All,
            page: 1,
            page_size: NOTIFICATION_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationPage {
    pub items: Vec<NotificationRecord>,
    /// The page actually shown, after clamping.
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Number of pages for `count` items, never less than one.
pub fn page_count(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

/// Clamps `page` into `1..=total_pages` and returns it with the slice it selects.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> (usize, Vec<T>) {
    let page_size = page_size.max(1);
    let page = page.clamp(1, page_count(items.len(), page_size));
    let start = (page - 1) * page_size;
    let slice = items.iter().skip(start).take(page_size).cloned().collect();
    (page, slice)
}

pub fn project(records: &[NotificationRecord], query: &NotificationQuery) -> NotificationPage {
    let needle = query.search_term.trim().to_lowercase();

    let filtered: Vec<NotificationRecord> = records
        .iter()
        .filter(|n| needle.is_empty() || n.message.to_lowercase().contains(&needle))
        .filter(|n| query.filter.matches(n))
        .cloned()
        .collect();

    let total_items = filtered.len();
    let (page, items) = paginate(&filtered, query.page, query.page_size);
    NotificationPage {
        items,
        page,
        total_pages: page_count(total_items, query.page_size),
        total_items,
    }
}

/// The panel's view state. Any change to the records, the filter or the
/// search term sends the user back to page 1.
#[derive(Debug, Clone, Default)]
pub struct NotificationBrowser {
    query: NotificationQuery,
    seen_version: Option<u64>,
}

impl NotificationBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &NotificationQuery {
        &self.query
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        let term = term.into();
        if term != self.query.search_term {
            self.query.search_term = term;
            self.query.page = 1;
        }
    }

    pub fn set_filter(&mut self, filter: NotificationFilter) {
        if filter != self.query.filter {
            self.query.filter = filter;
            self.query.page = 1;
        }
    }

    /// Tells the browser which records version it is looking at.
    pub fn observe_records(&mut self, version: u64) {
        if self.seen_version != Some(version) {
            self.seen_version = Some(version);
            self.query.page = 1;
        }
    }

    /// Applies version, search term and filter at once. Returns true when
    /// any of them changed, in which case the page went back to 1.
    pub fn sync(&mut self, version: u64, search_term: &str, filter: NotificationFilter) -> bool {
        let changed = self.seen_version != Some(version)
            || self.query.search_term != search_term
            || self.query.filter != filter;
        self.observe_records(version);
        self.set_search_term(search_term);
        self.set_filter(filter);
        changed
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.query.page = page.max(1);
    }

    /// Projects and remembers the clamped page.
    pub fn view(&mut self, records: &[NotificationRecord]) -> NotificationPage {
        let page = project(records, &self.query);
        self.query.page = page.page;
        page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, message: &str, is_read: bool, kind: NotificationType) -> NotificationRecord {
        NotificationRecord {
            id,
            message: message.to_string(),
            kind,
            is_read,
            created_at: None,
            created_at_wib: None,
        }
    }

    fn inbox() -> Vec<NotificationRecord> {
        vec![
            record(1, "Produksi susu sapi Melati rendah", false, NotificationType::LowProduction),
            record(2, "Produksi susu sapi Mawar tinggi", true, NotificationType::HighProduction),
            record(3, "Batch B-12 akan kadaluarsa", false, NotificationType::MilkWarning),
            record(4, "Batch B-09 telah digunakan", true, NotificationType::MilkUsed),
            record(5, "Produksi MELATI turun lagi", true, NotificationType::LowProduction),
        ]
    }

    fn query(search: &str, filter: NotificationFilter) -> NotificationQuery {
        NotificationQuery {
            search_term: search.to_string(),
            filter,
            ..NotificationQuery::default()
        }
    }

    #[test]
    fn unread_filter_keeps_exactly_unread() {
        let page = project(&inbox(), &query("", NotificationFilter::Unread));
        let ids: Vec<_> = page.items.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 3]);

        let again = project(&page.items, &query("", NotificationFilter::Unread));
        assert_eq!(again.items, page.items);
    }

    #[test]
    fn search_is_case_insensitive_and_message_only() {
        let page = project(&inbox(), &query("melati", NotificationFilter::All));
        let ids: Vec<_> = page.items.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 5]);

        let none = project(&inbox(), &query("low_production", NotificationFilter::All));
        assert_eq!(none.total_items, 0);
    }

    #[test]
    fn search_and_type_filter_combine() {
        let page = project(&inbox(), &query("melati", NotificationFilter::Low));
        assert_eq!(page.total_items, 2);
        let page = project(&inbox(), &query("produksi", NotificationFilter::High));
        assert_eq!(page.items[0].id, 2);
        assert_eq!(page.total_items, 1);
    }

    #[test]
    fn empty_result_still_has_one_page() {
        let page = project(&[], &NotificationQuery::default());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.page, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn page_count_rounds_up() {
        let many: Vec<_> = (0..17)
            .map(|id| record(id, "x", false, NotificationType::Other))
            .collect();
        let q = NotificationQuery {
            page: 3,
            ..NotificationQuery::default()
        };
        let page = project(&many, &q);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 1);
    }

    #[test]
    fn out_of_range_page_clamps_to_last() {
        let many: Vec<_> = (0..10)
            .map(|id| record(id, "x", false, NotificationType::Other))
            .collect();
        let q = NotificationQuery {
            page: 9,
            ..NotificationQuery::default()
        };
        let page = project(&many, &q);
        assert_eq!(page.page, 2);
        assert_eq!(page.items.len(), 2);
    }

    #[test]
    fn browser_resets_page_on_changes() {
        let many: Vec<_> = (0..20)
            .map(|id| record(id, "Produksi", false, NotificationType::Other))
            .collect();
        let mut browser = NotificationBrowser::new();
        browser.observe_records(1);
        browser.go_to_page(3);
        assert_eq!(browser.view(&many).page, 3);

        browser.set_search_term("produksi");
        assert_eq!(browser.query().page, 1);

        browser.go_to_page(2);
        browser.set_filter(NotificationFilter::Unread);
        assert_eq!(browser.query().page, 1);

        browser.go_to_page(2);
        browser.observe_records(1);
        assert_eq!(browser.query().page, 2);
        browser.observe_records(2);
        assert_eq!(browser.query().page, 1);
    }

    #[test]
    fn sync_reports_whether_the_page_was_reset() {
        let mut browser = NotificationBrowser::new();
        assert!(browser.sync(1, "", NotificationFilter::All));
        browser.go_to_page(2);
        assert!(!browser.sync(1, "", NotificationFilter::All));
        assert_eq!(browser.query().page, 2);
        assert!(browser.sync(1, "batch", NotificationFilter::All));
        assert_eq!(browser.query().page, 1);
    }

    #[test]
    fn filter_parses_from_query_strings() {
        assert_eq!("unread".parse::<NotificationFilter>().unwrap(), NotificationFilter::Unread);
        assert_eq!("".parse::<NotificationFilter>().unwrap(), NotificationFilter::All);
        assert!("everything".parse::<NotificationFilter>().is_err());
    }
}
