//! Deletion guard: only the tail entry may be removed.
//!
//! Removing any older entry would leave the counters of every later entry
//! pointing at a sequence that no longer exists.

use uuid::Uuid;

use crate::error::{RegistryError, Result};
use crate::storage::types::Entry;

/// Authorize deleting `target_id`.
///
/// `target` is the entry looked up by that id and `tail` is the ledger's
/// current tail; both must come from the same read.
pub fn authorize_delete(target_id: &Uuid, target: Option<&Entry>, tail: Option<&Entry>) -> Result<()> {
    let target = target.ok_or_else(|| RegistryError::NotFound(format!("Entry {}", target_id)))?;
    match tail {
        Some(tail) if tail.id == target.id => Ok(()),
        _ => {
            tracing::warn!(entry = %target.id, "delete rejected: entry is not the tail");
            Err(RegistryError::Conflict("not the tail".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::{Counters, Gender, VisitDetails};
    use chrono::{DateTime, Duration, Utc};

    fn entry_at(created_at: DateTime<Utc>, film: i64) -> Entry {
        Entry {
            id: Uuid::new_v4(),
            created_at,
            updated_at: created_at,
            counters: Counters::new(film, film, film),
            age: 40,
            details: VisitDetails::new("Patient", 1986, Gender::Female, "n/a"),
        }
    }

    #[test]
    fn test_only_tail_is_deletable() {
        let now = Utc::now();
        let older = entry_at(now - Duration::minutes(5), 1);
        let tail = entry_at(now, 2);

        let rejected = authorize_delete(&older.id, Some(&older), Some(&tail));
        match rejected {
            Err(RegistryError::Conflict(reason)) => assert_eq!(reason, "not the tail"),
            other => panic!("expected conflict, got {:?}", other),
        }
        assert!(authorize_delete(&tail.id, Some(&tail), Some(&tail)).is_ok());
    }

    #[test]
    fn test_missing_target_is_not_found() {
        let tail = entry_at(Utc::now(), 1);
        let missing = Uuid::new_v4();
        let result = authorize_delete(&missing, None, Some(&tail));
        assert!(matches!(result, Err(RegistryError::NotFound(_))));
    }

    #[test]
    fn test_every_non_tail_entry_is_rejected() {
        let start = Utc::now();
        let entries: Vec<Entry> = (0..6)
            .map(|i| entry_at(start + Duration::seconds(i), i + 1))
            .collect();
        let tail = entries.last().unwrap();
        for entry in &entries {
            let result = authorize_delete(&entry.id, Some(entry), Some(tail));
            assert_eq!(result.is_ok(), entry.id == tail.id);
        }
    }
}
