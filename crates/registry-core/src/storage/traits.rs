//! Storage engine trait definition.
//!
//! The `StorageEngine` trait is the interface every registry backend
//! implements. Counters are assigned and the deletion guard is applied
//! inside the backend, within the same transaction as the write they
//! protect.

use std::path::Path;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::types::{Entry, EntryPatch, LedgerMetadata, NewEntry, SortOrder};
use crate::calendar::BusinessCalendar;
use crate::counters::CounterSnapshot;
use crate::error::Result;
use crate::filter::Predicate;
use crate::pagination::PageRequest;

/// Storage engine interface for the visit ledger.
///
/// All implementations must ensure:
/// - Counters are assigned atomically with the insert
/// - Only the current tail can be deleted
/// - Updates never touch counters
/// - The tail is the entry with the greatest `created_at`, ties broken by
///   insertion order
pub trait StorageEngine: Send + Sync {
    /// Create a new ledger at the specified path.
    ///
    /// # Returns
    ///
    /// Returns the ledger ID.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Storage` if:
    /// - File already exists
    /// - Cannot write to path
    fn create(path: &Path) -> Result<Uuid>
    where
        Self: Sized;

    /// Open an existing ledger.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if the file does not exist and
    /// `RegistryError::Storage` if it is not a registry database.
    fn open(path: &Path) -> Result<Self>
    where
        Self: Sized;

    /// Get ledger metadata.
    fn metadata(&self) -> Result<LedgerMetadata>;

    // --- Entry operations ---

    /// Insert a new entry, assigning its counters.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Validation` for invalid details or a pinned
    /// timestamp that is in the future or older than the tail, and
    /// `RegistryError::DataIntegrity` if the tail's counters or timestamp
    /// cannot be trusted.
    fn insert_entry(&mut self, entry: &NewEntry, calendar: &BusinessCalendar) -> Result<Entry>;

    /// Get an entry by ID.
    fn get_entry(&self, id: &Uuid) -> Result<Option<Entry>>;

    /// The entry with the greatest creation timestamp.
    fn current_tail(&self) -> Result<Option<Entry>>;

    /// Ledger state the next insert at `now` would assign counters from.
    fn counter_snapshot(
        &self,
        now: DateTime<Utc>,
        calendar: &BusinessCalendar,
    ) -> Result<CounterSnapshot>;

    /// Count entries matching a predicate.
    fn count(&self, predicate: &Predicate) -> Result<u64>;

    /// Entries matching a predicate, sorted by creation time.
    fn query(
        &self,
        predicate: &Predicate,
        order: SortOrder,
        skip: usize,
        limit: Option<usize>,
    ) -> Result<Vec<Entry>>;

    /// One newest-first page with the total match count and the tail ID,
    /// read from a single consistent snapshot.
    fn list_page(
        &self,
        predicate: &Predicate,
        page: &PageRequest,
    ) -> Result<(Vec<Entry>, u64, Option<Uuid>)>;

    /// Apply a patch to an entry's descriptive fields.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if the entry does not exist.
    fn update_entry(
        &mut self,
        id: &Uuid,
        patch: &EntryPatch,
        calendar: &BusinessCalendar,
    ) -> Result<Entry>;

    /// Delete an entry, which must be the current tail.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if the entry does not exist and
    /// `RegistryError::Conflict` if it is not the tail.
    fn delete_tail_entry(&mut self, id: &Uuid) -> Result<()>;

    // --- Maintenance ---

    /// Run storage-level integrity checks.
    fn check_integrity(&self) -> Result<()>;

    /// Write a consistent copy of the ledger to `destination`.
    fn backup_to(&self, destination: &Path) -> Result<()>;
}
