//! Page requests and tail annotation for listings.

use serde::Serialize;
use uuid::Uuid;

use crate::storage::types::Entry;

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// A one-based page of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: usize,
    limit: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Page numbers below 1 become 1; a zero limit falls back to the default.
    pub fn new(page: usize, limit: usize) -> Self {
        Self::with_default_limit(page, limit, DEFAULT_PAGE_SIZE)
    }

    pub fn with_default_limit(page: usize, limit: usize, default_limit: usize) -> Self {
        let fallback = default_limit.max(1);
        Self {
            page: page.max(1),
            limit: if limit == 0 { fallback } else { limit },
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn skip(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// An entry in a listing, flagged when it is the one entry that may be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedEntry {
    #[serde(flatten)]
    pub entry: Entry,
    pub is_deletable: bool,
}

/// One page of a filtered listing.
#[derive(Debug, Clone, Serialize)]
pub struct EntryPage {
    pub entries: Vec<ListedEntry>,
    pub total_count: u64,
    pub total_pages: u64,
    pub page: usize,
    pub limit: usize,
}

/// Ledger size reported after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LedgerTotals {
    pub total_count: u64,
    pub total_pages: u64,
}

impl LedgerTotals {
    pub fn new(total_count: u64, page_size: usize) -> Self {
        Self {
            total_count,
            total_pages: total_pages(total_count, page_size),
        }
    }
}

/// Number of pages needed for `total` items.
pub fn total_pages(total: u64, limit: usize) -> u64 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(limit as u64)
}

/// Mark the tail entry of a page as deletable.
pub fn annotate_tail(entries: Vec<Entry>, tail_id: Option<Uuid>) -> Vec<ListedEntry> {
    entries
        .into_iter()
        .map(|entry| {
            let is_deletable = tail_id == Some(entry.id);
            ListedEntry {
                entry,
                is_deletable,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::{Counters, Gender, VisitDetails};
    use chrono::Utc;

    fn entry() -> Entry {
        let now = Utc::now();
        Entry {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            counters: Counters::FIRST,
            age: 30,
            details: VisitDetails::new("Patient", 1996, Gender::Male, "n/a"),
        }
    }

    #[test]
    fn test_page_request_clamps() {
        let request = PageRequest::new(0, 0);
        assert_eq!(request.page(), 1);
        assert_eq!(request.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(request.skip(), 0);

        let request = PageRequest::new(3, 15);
        assert_eq!(request.skip(), 30);

        let request = PageRequest::with_default_limit(2, 0, 50);
        assert_eq!(request.limit(), 50);
        assert_eq!(request.skip(), 50);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(1, 20), 1);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(LedgerTotals::new(41, 20).total_pages, 3);
    }

    #[test]
    fn test_only_tail_is_annotated() {
        let entries = vec![entry(), entry(), entry()];
        let tail_id = entries[0].id;
        let listed = annotate_tail(entries, Some(tail_id));
        let flags: Vec<bool> = listed.iter().map(|e| e.is_deletable).collect();
        assert_eq!(flags, vec![true, false, false]);
    }

    #[test]
    fn test_tail_outside_page_annotates_nothing() {
        let listed = annotate_tail(vec![entry(), entry()], Some(Uuid::new_v4()));
        assert!(listed.iter().all(|e| !e.is_deletable));
        assert!(annotate_tail(vec![entry()], None).iter().all(|e| !e.is_deletable));
    }
}
