//! # Registry Core
//!
//! Core library for Registry, a ledger of radiology clinic visits.
//!
//! Every entry is numbered three ways when it is recorded: a yearly count, a
//! film stock number that wraps at 1000, and a daily count. Only the newest
//! entry may be deleted, so those sequences never develop gaps.
//!
//! ## Architecture
//!
//! - **calendar**: business timezone, day and year boundaries
//! - **counters**: counter assignment from a snapshot of the ledger
//! - **filter**: criteria and the predicate tree they compile to
//! - **guard**: tail-only deletion rule
//! - **pagination**: page requests and tail annotation
//! - **storage**: storage engine trait and the SQLite backend
//! - **service**: the operations exposed to the CLI
//! - **catalog**: display labels for coded values
//! - **integrity**: whole-ledger counter verification

pub mod calendar;
pub mod catalog;
pub mod counters;
pub mod error;
pub mod filter;
pub mod fs;
pub mod guard;
pub mod integrity;
pub mod pagination;
pub mod service;
pub mod storage;

pub use calendar::BusinessCalendar;
pub use error::{RegistryError, Result};
pub use filter::{FilterCriteria, Predicate};
pub use pagination::{EntryPage, LedgerTotals, ListedEntry, PageRequest};
pub use service::RegistrationService;
pub use storage::StorageEngine;

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
