//! Registration service: the operations the CLI drives.
//!
//! The service compiles criteria, delegates to a [`StorageEngine`], and
//! reports ledger totals after each mutation. It keeps no state of its own
//! beyond the store handle; all coordination between processes happens in
//! the store.

use uuid::Uuid;

use crate::calendar::BusinessCalendar;
use crate::error::{RegistryError, Result};
use crate::filter::{build, FilterCriteria, Predicate};
use crate::integrity::{verify, IntegrityReport};
use crate::pagination::{annotate_tail, total_pages, EntryPage, LedgerTotals, PageRequest, DEFAULT_PAGE_SIZE};
use crate::storage::{Entry, EntryPatch, NewEntry, SortOrder, StorageEngine};

pub struct RegistrationService<S: StorageEngine> {
    storage: S,
    calendar: BusinessCalendar,
    page_size: usize,
}

impl<S: StorageEngine> RegistrationService<S> {
    pub fn new(storage: S, calendar: BusinessCalendar) -> Self {
        Self {
            storage,
            calendar,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Page size used for defaults and for mutation totals.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn calendar(&self) -> &BusinessCalendar {
        &self.calendar
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Page request with the configured page size as the fallback limit.
    pub fn page_request(&self, page: Option<usize>, limit: Option<usize>) -> PageRequest {
        PageRequest::with_default_limit(page.unwrap_or(1), limit.unwrap_or(0), self.page_size)
    }

    pub fn predicate(&self, criteria: &FilterCriteria) -> Predicate {
        build(criteria, &self.calendar)
    }

    #[tracing::instrument(skip(self, criteria))]
    pub fn list_filtered(&self, criteria: &FilterCriteria, page: PageRequest) -> Result<EntryPage> {
        let predicate = self.predicate(criteria);
        let (entries, total_count, tail_id) = self.storage.list_page(&predicate, &page)?;
        tracing::debug!(total_count, returned = entries.len(), "listed entries");
        Ok(EntryPage {
            entries: annotate_tail(entries, tail_id),
            total_count,
            total_pages: total_pages(total_count, page.limit()),
            page: page.page(),
            limit: page.limit(),
        })
    }

    pub fn create(&mut self, entry: &NewEntry) -> Result<(Entry, LedgerTotals)> {
        let created = self.storage.insert_entry(entry, &self.calendar)?;
        Ok((created, self.totals()?))
    }

    pub fn update(&mut self, id: &Uuid, patch: &EntryPatch) -> Result<(Entry, LedgerTotals)> {
        let updated = self.storage.update_entry(id, patch, &self.calendar)?;
        Ok((updated, self.totals()?))
    }

    /// Delete the tail entry; any other entry is a `Conflict`.
    pub fn delete(&mut self, id: &Uuid) -> Result<LedgerTotals> {
        self.storage.delete_tail_entry(id)?;
        self.totals()
    }

    pub fn get(&self, id: &Uuid) -> Result<Entry> {
        self.storage
            .get_entry(id)?
            .ok_or_else(|| RegistryError::NotFound(format!("Entry {}", id)))
    }

    /// Every matching entry, oldest first, unpaginated.
    #[tracing::instrument(skip(self, criteria))]
    pub fn export_filtered(&self, criteria: &FilterCriteria) -> Result<Vec<Entry>> {
        let predicate = self.predicate(criteria);
        self.storage
            .query(&predicate, SortOrder::Ascending, 0, None)
    }

    /// Storage checks followed by a full counter and overlay walk.
    #[tracing::instrument(skip(self))]
    pub fn verify(&self) -> Result<IntegrityReport> {
        self.storage.check_integrity()?;
        let entries = self
            .storage
            .query(&Predicate::All, SortOrder::Ascending, 0, None)?;
        Ok(verify(&entries, &self.calendar))
    }

    pub fn totals(&self) -> Result<LedgerTotals> {
        let total = self.storage.count(&Predicate::All)?;
        Ok(LedgerTotals::new(total, self.page_size))
    }
}
