//! SQLite storage backend.
//!
//! Entries live in a plain on-disk SQLite database in WAL mode, so several
//! registry processes can share one file. Every write that depends on the
//! tail runs inside `BEGIN IMMEDIATE`: the write lock is taken before the
//! tail is read, and a second writer waits on `busy_timeout` until the first
//! commits.

mod row;
mod schema;
mod sql;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Duration as ClockDuration, SubsecRound, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OpenFlags, OptionalExtension, TransactionBehavior,
};
use uuid::Uuid;

use crate::calendar::BusinessCalendar;
use crate::counters::{assign_counters, CounterSnapshot, TailCounters};
use crate::error::{RegistryError, Result};
use crate::filter::{contains_ignore_case, Predicate};
use crate::fs::rename_with_fallback;
use crate::guard::authorize_delete;
use crate::pagination::PageRequest;
use crate::storage::traits::StorageEngine;
use crate::storage::types::{Entry, EntryPatch, LedgerMetadata, NewEntry, SortOrder};
use crate::storage::validation::validate_details;

use row::{format_timestamp, parse_timestamp, EntryRow, ENTRY_COLUMNS};
use schema::{FORMAT_VERSION, REQUIRED_META_KEYS, SCHEMA};
use sql::{render_predicate, CONTAINS_FN};

pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Largest lead, in seconds, a tail timestamp may have over the local clock
/// before an unpinned insert refuses to adopt it.
pub const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Connection settings for [`SqliteStorage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageOptions {
    /// How long a writer waits for another connection's write lock
    pub busy_timeout: Duration,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

/// SQLite storage engine.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
    ledger_id: Uuid,
}

impl SqliteStorage {
    /// Lock the database connection, returning an error if the mutex is poisoned.
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| RegistryError::Storage("SQLite connection poisoned".to_string()))
    }

    /// Open an existing ledger with explicit connection settings.
    pub fn open_with_options(path: &Path, options: &StorageOptions) -> Result<Self> {
        if !path.exists() {
            return Err(RegistryError::NotFound(format!(
                "Registry database {}",
                path.display()
            )));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Self::configure(&conn, options)?;
        let ledger_id = Self::read_ledger_id(&conn)?;
        tracing::debug!(path = %path.display(), ledger = %ledger_id, "opened registry database");
        Ok(Self {
            conn: Mutex::new(conn),
            ledger_id,
        })
    }

    /// Create a fresh ledger held in memory.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn, &StorageOptions::default())?;
        let ledger_id = Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            ledger_id,
        })
    }

    fn configure(conn: &Connection, options: &StorageOptions) -> Result<()> {
        conn.busy_timeout(options.busy_timeout)?;
        conn.create_scalar_function(
            CONTAINS_FN,
            2,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| {
                let haystack: Option<String> = ctx.get(0)?;
                let needle: String = ctx.get(1)?;
                Ok(haystack.is_some_and(|value| contains_ignore_case(&value, &needle)))
            },
        )?;
        Ok(())
    }

    fn initialize(conn: &Connection) -> Result<Uuid> {
        conn.execute_batch(SCHEMA)?;

        let ledger_id = Uuid::new_v4();
        let ledger_id_str = ledger_id.to_string();
        let now = format_timestamp(&Utc::now());

        let tx = conn.unchecked_transaction()?;
        for (key, value) in [
            ("format_version", FORMAT_VERSION),
            ("ledger_id", ledger_id_str.as_str()),
            ("created_at", now.as_str()),
            ("last_modified", now.as_str()),
        ] {
            tx.execute("INSERT INTO meta (key, value) VALUES (?1, ?2)", (key, value))?;
        }
        tx.commit()?;
        Ok(ledger_id)
    }

    fn read_ledger_id(conn: &Connection) -> Result<Uuid> {
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'ledger_id'",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| RegistryError::Storage(format!("Not a registry database: {}", e)))?;
        let value = value.ok_or_else(|| {
            RegistryError::Storage("Registry metadata is missing ledger_id".to_string())
        })?;
        Uuid::parse_str(&value)
            .map_err(|e| RegistryError::Storage(format!("Invalid ledger_id: {}", e)))
    }

    fn meta_timestamp(conn: &Connection, key: &str) -> Result<DateTime<Utc>> {
        let value: String =
            conn.query_row("SELECT value FROM meta WHERE key = ?1", [key], |row| {
                row.get(0)
            })?;
        parse_timestamp(&value)
    }

    fn touch(conn: &Connection, now: &DateTime<Utc>) -> Result<()> {
        conn.execute(
            "UPDATE meta SET value = ?1 WHERE key = 'last_modified'",
            [format_timestamp(now)],
        )?;
        Ok(())
    }

    // --- Reads shared by plain calls and transactions ---

    fn get_in(conn: &Connection, id: &Uuid) -> Result<Option<Entry>> {
        let sql = format!("SELECT {} FROM entries WHERE id = ?1", ENTRY_COLUMNS);
        let row = conn
            .query_row(&sql, [id.to_string()], EntryRow::from_row)
            .optional()?;
        row.map(Entry::try_from).transpose()
    }

    /// The one tail query; listing annotation and the deletion guard both use it.
    fn tail_in(conn: &Connection) -> Result<Option<Entry>> {
        let sql = format!(
            "SELECT {} FROM entries ORDER BY created_at DESC, seq DESC LIMIT 1",
            ENTRY_COLUMNS
        );
        let row = conn.query_row(&sql, [], EntryRow::from_row).optional()?;
        row.map(Entry::try_from).transpose()
    }

    fn snapshot_in(
        conn: &Connection,
        now: DateTime<Utc>,
        calendar: &BusinessCalendar,
    ) -> Result<CounterSnapshot> {
        let ledger_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        let tail = Self::tail_in(conn)?.map(|entry| TailCounters {
            id: entry.id,
            created_at: entry.created_at,
            counters: entry.counters,
        });

        let (day_start, day_end) = calendar.day_bounds(now);
        let todays_max_daily: Option<i64> = conn.query_row(
            "SELECT MAX(daily_count) FROM entries WHERE created_at >= ?1 AND created_at <= ?2",
            (format_timestamp(&day_start), format_timestamp(&day_end)),
            |row| row.get(0),
        )?;

        Ok(CounterSnapshot {
            ledger_count: u64::try_from(ledger_count).unwrap_or(0),
            tail,
            todays_max_daily,
        })
    }

    fn count_in(conn: &Connection, predicate: &Predicate) -> Result<u64> {
        let (clause, params) = render_predicate(predicate);
        let sql = format!("SELECT COUNT(*) FROM entries WHERE {}", clause);
        let count: i64 = conn.query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn query_in(
        conn: &Connection,
        predicate: &Predicate,
        order: SortOrder,
        skip: usize,
        limit: Option<usize>,
    ) -> Result<Vec<Entry>> {
        let (clause, mut params) = render_predicate(predicate);
        let direction = match order {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        };
        let mut sql = format!(
            "SELECT {} FROM entries WHERE {} ORDER BY created_at {}, seq {}",
            ENTRY_COLUMNS, clause, direction, direction
        );
        if limit.is_some() || skip > 0 {
            sql.push_str(" LIMIT ? OFFSET ?");
            params.push(Value::Integer(
                limit.map_or(-1, |value| i64::try_from(value).unwrap_or(i64::MAX)),
            ));
            params.push(Value::Integer(i64::try_from(skip).unwrap_or(i64::MAX)));
        }

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), EntryRow::from_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(Entry::try_from(row?)?);
        }
        Ok(entries)
    }

    fn insert_row(conn: &Connection, entry: &Entry) -> Result<()> {
        let details = &entry.details;
        conn.execute(
            &format!(
                "INSERT INTO entries ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, \
                 ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
                ENTRY_COLUMNS
            ),
            params![
                entry.id.to_string(),
                format_timestamp(&entry.created_at),
                format_timestamp(&entry.updated_at),
                entry.counters.yearly_count,
                entry.counters.film_number,
                entry.counters.daily_count,
                details.full_name,
                details.address.code,
                details.address.other,
                details.job.code,
                details.job.other,
                details.visit_reason.code,
                details.visit_reason.other,
                details.radiology_report.code,
                details.radiology_report.other,
                details.birth_year,
                entry.age,
                details.gender.as_str(),
                details.phone,
                details.radiation_dose,
            ],
        )?;
        Ok(())
    }
}

impl StorageEngine for SqliteStorage {
    #[tracing::instrument]
    fn create(path: &Path) -> Result<Uuid> {
        if path.exists() {
            return Err(RegistryError::Storage(format!(
                "Registry database already exists at {}",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        let ledger_id = Self::initialize(&conn)?;
        tracing::info!(ledger = %ledger_id, journal_mode = %mode, "created registry database");
        Ok(ledger_id)
    }

    fn open(path: &Path) -> Result<Self> {
        Self::open_with_options(path, &StorageOptions::default())
    }

    fn metadata(&self) -> Result<LedgerMetadata> {
        let conn = self.lock_conn()?;

        let format_version: String = conn.query_row(
            "SELECT value FROM meta WHERE key = 'format_version'",
            [],
            |row| row.get(0),
        )?;
        let created_at = Self::meta_timestamp(&conn, "created_at")?;
        let last_modified = Self::meta_timestamp(&conn, "last_modified")?;

        Ok(LedgerMetadata {
            format_version,
            ledger_id: self.ledger_id,
            created_at,
            last_modified,
        })
    }

    #[tracing::instrument(skip(self, entry, calendar))]
    fn insert_entry(&mut self, entry: &NewEntry, calendar: &BusinessCalendar) -> Result<Entry> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let wall_clock = Utc::now().trunc_subsecs(3);
        let pinned = entry.created_at.map(|instant| instant.trunc_subsecs(3));
        if let Some(pinned) = pinned {
            if pinned > wall_clock {
                return Err(RegistryError::Validation(format!(
                    "Entry timestamp {} is in the future",
                    format_timestamp(&pinned)
                )));
            }
        }

        let mut now = pinned.unwrap_or(wall_clock);
        if let Some(tail) = Self::tail_in(&tx)? {
            if now < tail.created_at {
                if pinned.is_some() {
                    return Err(RegistryError::Validation(format!(
                        "Entry timestamp {} is earlier than the current tail ({})",
                        format_timestamp(&now),
                        format_timestamp(&tail.created_at)
                    )));
                }
                if tail.created_at - now > ClockDuration::seconds(MAX_CLOCK_SKEW_SECS) {
                    return Err(RegistryError::DataIntegrity(format!(
                        "tail entry {} is dated {}, ahead of the local clock",
                        tail.id,
                        format_timestamp(&tail.created_at)
                    )));
                }
                // Another writer's clock is slightly ahead; never sort before the tail.
                tracing::debug!(tail = %tail.id, "local clock behind tail, using tail timestamp");
                now = tail.created_at;
            }
        }

        let details = validate_details(&entry.details, now, calendar)?;
        let snapshot = Self::snapshot_in(&tx, now, calendar)?;
        let counters = assign_counters(&snapshot, now, calendar)?;

        let created = Entry {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            counters,
            age: calendar.age_at(details.birth_year, now),
            details,
        };
        Self::insert_row(&tx, &created)?;
        Self::touch(&tx, &now)?;
        tx.commit()?;

        tracing::info!(
            entry = %created.id,
            yearly_count = counters.yearly_count,
            film_number = counters.film_number,
            daily_count = counters.daily_count,
            "entry created"
        );
        Ok(created)
    }

    fn get_entry(&self, id: &Uuid) -> Result<Option<Entry>> {
        let conn = self.lock_conn()?;
        Self::get_in(&conn, id)
    }

    fn current_tail(&self) -> Result<Option<Entry>> {
        let conn = self.lock_conn()?;
        Self::tail_in(&conn)
    }

    fn counter_snapshot(
        &self,
        now: DateTime<Utc>,
        calendar: &BusinessCalendar,
    ) -> Result<CounterSnapshot> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        let snapshot = Self::snapshot_in(&tx, now, calendar)?;
        tx.commit()?;
        Ok(snapshot)
    }

    fn count(&self, predicate: &Predicate) -> Result<u64> {
        let conn = self.lock_conn()?;
        Self::count_in(&conn, predicate)
    }

    #[tracing::instrument(skip(self, predicate))]
    fn query(
        &self,
        predicate: &Predicate,
        order: SortOrder,
        skip: usize,
        limit: Option<usize>,
    ) -> Result<Vec<Entry>> {
        let conn = self.lock_conn()?;
        Self::query_in(&conn, predicate, order, skip, limit)
    }

    #[tracing::instrument(skip(self, predicate))]
    fn list_page(
        &self,
        predicate: &Predicate,
        page: &PageRequest,
    ) -> Result<(Vec<Entry>, u64, Option<Uuid>)> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        let total = Self::count_in(&tx, predicate)?;
        let entries = Self::query_in(
            &tx,
            predicate,
            SortOrder::Descending,
            page.skip(),
            Some(page.limit()),
        )?;
        let tail_id = Self::tail_in(&tx)?.map(|entry| entry.id);
        tx.commit()?;
        Ok((entries, total, tail_id))
    }

    #[tracing::instrument(skip(self, patch, calendar))]
    fn update_entry(
        &mut self,
        id: &Uuid,
        patch: &EntryPatch,
        calendar: &BusinessCalendar,
    ) -> Result<Entry> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = Self::get_in(&tx, id)?
            .ok_or_else(|| RegistryError::NotFound(format!("Entry {}", id)))?;
        let now = Utc::now().trunc_subsecs(3);
        let details = validate_details(&patch.apply(&existing.details), now, calendar)?;
        let age = match patch.birth_year {
            Some(_) => calendar.age_at(details.birth_year, now),
            None => existing.age,
        };

        // Counter columns are never written on update.
        tx.execute(
            "UPDATE entries SET full_name = ?1, address = ?2, other_address = ?3, job = ?4, \
             other_job = ?5, visit_reason = ?6, other_visit_reason = ?7, radiology_report = ?8, \
             other_radiology_report = ?9, birth_year = ?10, age = ?11, gender = ?12, \
             phone = ?13, radiation_dose = ?14, updated_at = ?15 WHERE id = ?16",
            params![
                details.full_name,
                details.address.code,
                details.address.other,
                details.job.code,
                details.job.other,
                details.visit_reason.code,
                details.visit_reason.other,
                details.radiology_report.code,
                details.radiology_report.other,
                details.birth_year,
                age,
                details.gender.as_str(),
                details.phone,
                details.radiation_dose,
                format_timestamp(&now),
                id.to_string(),
            ],
        )?;
        Self::touch(&tx, &now)?;
        tx.commit()?;

        tracing::info!(entry = %id, "entry updated");
        Ok(Entry {
            updated_at: now,
            age,
            details,
            ..existing
        })
    }

    #[tracing::instrument(skip(self))]
    fn delete_tail_entry(&mut self, id: &Uuid) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let target = Self::get_in(&tx, id)?;
        let tail = Self::tail_in(&tx)?;
        authorize_delete(id, target.as_ref(), tail.as_ref())?;

        tx.execute("DELETE FROM entries WHERE id = ?1", [id.to_string()])?;
        Self::touch(&tx, &Utc::now())?;
        tx.commit()?;

        tracing::info!(entry = %id, "tail entry deleted");
        Ok(())
    }

    fn check_integrity(&self) -> Result<()> {
        let conn = self.lock_conn()?;

        let result: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        if result != "ok" {
            return Err(RegistryError::Storage(format!(
                "SQLite integrity check failed: {}",
                result
            )));
        }

        let placeholders = vec!["?"; REQUIRED_META_KEYS.len()].join(", ");
        let metadata_count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM meta WHERE key IN ({})", placeholders),
            params_from_iter(REQUIRED_META_KEYS.iter()),
            |row| row.get(0),
        )?;
        if metadata_count < REQUIRED_META_KEYS.len() as i64 {
            return Err(RegistryError::Storage(
                "Metadata table missing required keys".to_string(),
            ));
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn backup_to(&self, destination: &Path) -> Result<()> {
        let parent = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| RegistryError::Storage(format!("System time error: {}", e)))?
            .as_nanos();
        let temp_path = parent.join(format!(".registry-backup-{}.tmp", nanos));

        {
            let conn = self.lock_conn()?;
            conn.execute(
                "VACUUM INTO ?1",
                [temp_path.to_string_lossy().into_owned()],
            )?;
        }
        rename_with_fallback(&temp_path, destination)?;

        tracing::info!("backup written");
        Ok(())
    }
}
