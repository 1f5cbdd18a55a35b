//! Database schema for registry files.

pub const FORMAT_VERSION: &str = "1";

/// Metadata keys every registry database must carry.
pub const REQUIRED_META_KEYS: &[&str] = &["format_version", "ledger_id", "created_at", "last_modified"];

/// `seq` records insertion order and breaks ties between equal timestamps.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS entries (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    yearly_count INTEGER NOT NULL,
    film_number INTEGER NOT NULL,
    daily_count INTEGER NOT NULL,
    full_name TEXT NOT NULL,
    address TEXT,
    other_address TEXT,
    job TEXT,
    other_job TEXT,
    visit_reason TEXT,
    other_visit_reason TEXT,
    radiology_report TEXT,
    other_radiology_report TEXT,
    birth_year INTEGER NOT NULL,
    age INTEGER NOT NULL,
    gender TEXT NOT NULL CHECK (gender IN ('male', 'female')),
    phone TEXT,
    radiation_dose TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_entries_tail ON entries (created_at, seq);
CREATE INDEX IF NOT EXISTS idx_entries_birth_year ON entries (birth_year);
CREATE INDEX IF NOT EXISTS idx_entries_age ON entries (age);
CREATE INDEX IF NOT EXISTS idx_entries_gender ON entries (gender);
CREATE INDEX IF NOT EXISTS idx_entries_visit_reason ON entries (visit_reason, other_visit_reason);
CREATE INDEX IF NOT EXISTS idx_entries_job ON entries (job, other_job);
"#;
