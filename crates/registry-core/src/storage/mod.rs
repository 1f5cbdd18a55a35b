//! Storage abstraction and implementations.

pub mod sqlite;
pub mod traits;
pub mod types;
pub mod validation;

pub use sqlite::{SqliteStorage, StorageOptions};
pub use traits::StorageEngine;
pub use types::{
    CodedField, CodedPatch, Counters, Entry, EntryPatch, Gender, LedgerMetadata, NewEntry,
    SortOrder, VisitDetails, OTHER_SENTINEL,
};
