use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::thread;

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use rusqlite::Connection;
use tempfile::TempDir;
use uuid::Uuid;

use registry_core::counters::{assign_counters, CounterSnapshot, FILM_STOCK_SIZE};
use registry_core::filter::build;
use registry_core::storage::{
    CodedField, Counters, EntryPatch, Gender, NewEntry, SortOrder, SqliteStorage, StorageEngine,
    VisitDetails,
};
use registry_core::{
    BusinessCalendar, FilterCriteria, PageRequest, Predicate, RegistrationService, RegistryError,
};

fn utc(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn details(name: &str) -> VisitDetails {
    VisitDetails::new(name, 1985, Gender::Male, "0.03 mSv")
}

fn pinned(name: &str, at: &str) -> NewEntry {
    NewEntry::new(details(name)).with_created_at(utc(at))
}

fn file_ledger() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.db");
    SqliteStorage::create(&path).unwrap();
    (dir, path)
}

fn set_counters(path: &Path, id: &Uuid, counters: Counters) {
    let conn = Connection::open(path).unwrap();
    conn.execute(
        "UPDATE entries SET yearly_count = ?1, film_number = ?2, daily_count = ?3 WHERE id = ?4",
        (
            counters.yearly_count,
            counters.film_number,
            counters.daily_count,
            id.to_string(),
        ),
    )
    .unwrap();
}

fn execute_raw(path: &Path, sql: &str, id: &Uuid, value: impl rusqlite::ToSql) {
    let conn = Connection::open(path).unwrap();
    conn.execute(sql, rusqlite::params![value, id.to_string()])
        .unwrap();
}

#[test]
fn first_entry_gets_all_ones() {
    let mut storage = SqliteStorage::open_in_memory().unwrap();
    let entry = storage
        .insert_entry(&NewEntry::new(details("First")), &BusinessCalendar::default())
        .unwrap();
    assert_eq!(entry.counters, Counters::FIRST);
    assert_eq!(storage.current_tail().unwrap().map(|e| e.id), Some(entry.id));
}

#[test]
fn new_year_resets_yearly_and_daily_but_not_film() {
    let (_dir, path) = file_ledger();
    let calendar = BusinessCalendar::default();
    let mut storage = SqliteStorage::open(&path).unwrap();

    let old = storage
        .insert_entry(&pinned("Last year", "2025-06-01T08:00:00Z"), &calendar)
        .unwrap();
    set_counters(&path, &old.id, Counters::new(5, 7, 3));

    let next = storage
        .insert_entry(&pinned("This year", "2026-02-01T08:00:00Z"), &calendar)
        .unwrap();
    assert_eq!(next.counters, Counters::new(1, 8, 1));
}

#[test]
fn film_number_wraps_after_full_stock() {
    let (_dir, path) = file_ledger();
    let calendar = BusinessCalendar::default();
    let mut storage = SqliteStorage::open(&path).unwrap();

    let last = storage
        .insert_entry(&pinned("Frame 1000", "2026-03-01T05:00:00Z"), &calendar)
        .unwrap();
    set_counters(&path, &last.id, Counters::new(1000, FILM_STOCK_SIZE, 1));

    let next = storage
        .insert_entry(&pinned("Frame 1", "2026-03-01T05:01:00Z"), &calendar)
        .unwrap();
    assert_eq!(next.counters, Counters::new(1001, 1, 2));
}

#[test]
fn only_the_tail_can_be_deleted() {
    let calendar = BusinessCalendar::default();
    let mut storage = SqliteStorage::open_in_memory().unwrap();
    let a = storage
        .insert_entry(&pinned("A", "2026-04-01T05:00:00Z"), &calendar)
        .unwrap();
    let b = storage
        .insert_entry(&pinned("B", "2026-04-01T05:05:00Z"), &calendar)
        .unwrap();

    match storage.delete_tail_entry(&a.id) {
        Err(RegistryError::Conflict(reason)) => assert_eq!(reason, "not the tail"),
        other => panic!("expected conflict, got {:?}", other),
    }
    storage.delete_tail_entry(&b.id).unwrap();
    assert!(storage.get_entry(&b.id).unwrap().is_none());

    // A is the tail now.
    storage.delete_tail_entry(&a.id).unwrap();
    assert_eq!(storage.count(&Predicate::All).unwrap(), 0);

    let missing = storage.delete_tail_entry(&Uuid::new_v4());
    assert!(matches!(missing, Err(RegistryError::NotFound(_))));
}

#[test]
fn other_address_filter_requires_both_fields() {
    let calendar = BusinessCalendar::default();
    let mut storage = SqliteStorage::open_in_memory().unwrap();
    let riverside = storage
        .insert_entry(
            &NewEntry::new(details("One").with_address(CodedField::other("Old RIVERSIDE lane"))),
            &calendar,
        )
        .unwrap();
    storage
        .insert_entry(
            &NewEntry::new(details("Two").with_address(CodedField::other("Hillside"))),
            &calendar,
        )
        .unwrap();
    storage
        .insert_entry(
            &NewEntry::new(details("Three").with_address(CodedField::coded("riverside"))),
            &calendar,
        )
        .unwrap();

    let criteria = FilterCriteria {
        address: Some("other".into()),
        other_address: Some("Riverside".into()),
        ..FilterCriteria::default()
    };
    let predicate = build(&criteria, &calendar);
    let found = storage
        .query(&predicate, SortOrder::Ascending, 0, None)
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, riverside.id);
}

#[test]
fn concurrent_creates_produce_gapless_counters() {
    let (_dir, path) = file_ledger();
    let writers = 4;
    let per_writer = 10;

    let handles: Vec<_> = (0..writers)
        .map(|w| {
            let path = path.clone();
            thread::spawn(move || {
                let calendar = BusinessCalendar::default();
                let mut storage = SqliteStorage::open(&path).unwrap();
                for i in 0..per_writer {
                    storage
                        .insert_entry(
                            &NewEntry::new(details(&format!("Writer {} #{}", w, i))),
                            &calendar,
                        )
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let storage = SqliteStorage::open(&path).unwrap();
    let entries = storage
        .query(&Predicate::All, SortOrder::Ascending, 0, None)
        .unwrap();
    let total = (writers * per_writer) as i64;
    assert_eq!(entries.len() as i64, total);

    let films: HashSet<i64> = entries.iter().map(|e| e.counters.film_number).collect();
    assert_eq!(films.len() as i64, total, "duplicate film numbers");

    // Unless the run straddled local midnight, every sequence is 1..=N in order.
    let calendar = BusinessCalendar::default();
    let first_day = calendar.local_date(entries[0].created_at);
    let last_day = calendar.local_date(entries[entries.len() - 1].created_at);
    if first_day == last_day {
        for (idx, entry) in entries.iter().enumerate() {
            let expected = idx as i64 + 1;
            assert_eq!(entry.counters.daily_count, expected);
            assert_eq!(entry.counters.film_number, expected);
        }
    }
    let report = registry_core::integrity::verify(&entries, &calendar);
    assert!(report.is_clean(), "{:?}", report.violations);
}

#[test]
fn identical_timestamps_break_ties_by_insertion() {
    let calendar = BusinessCalendar::default();
    let mut storage = SqliteStorage::open_in_memory().unwrap();
    let at = "2026-05-05T07:00:00Z";
    let first = storage.insert_entry(&pinned("First", at), &calendar).unwrap();
    let second = storage.insert_entry(&pinned("Second", at), &calendar).unwrap();

    assert_eq!(second.counters.daily_count, 2);
    assert_eq!(storage.current_tail().unwrap().map(|e| e.id), Some(second.id));
    assert!(matches!(
        storage.delete_tail_entry(&first.id),
        Err(RegistryError::Conflict(_))
    ));
}

#[test]
fn backdated_entry_is_rejected() {
    let calendar = BusinessCalendar::default();
    let mut storage = SqliteStorage::open_in_memory().unwrap();
    storage
        .insert_entry(&pinned("Now", "2026-05-05T07:00:00Z"), &calendar)
        .unwrap();
    let result = storage.insert_entry(&pinned("Earlier", "2026-05-05T06:00:00Z"), &calendar);
    assert!(matches!(result, Err(RegistryError::Validation(_))));
    assert_eq!(storage.count(&Predicate::All).unwrap(), 1);
}

#[test]
fn corrupted_tail_counters_abort_the_insert() {
    let (_dir, path) = file_ledger();
    let calendar = BusinessCalendar::default();
    let mut storage = SqliteStorage::open(&path).unwrap();
    let tail = storage
        .insert_entry(&pinned("Tail", "2026-05-05T07:00:00Z"), &calendar)
        .unwrap();
    set_counters(&path, &tail.id, Counters::new(4, 0, 2));

    let result = storage.insert_entry(&pinned("Next", "2026-05-05T07:05:00Z"), &calendar);
    assert!(matches!(result, Err(RegistryError::DataIntegrity(_))));
    assert_eq!(storage.count(&Predicate::All).unwrap(), 1);
}

#[test]
fn update_never_changes_counters() {
    let calendar = BusinessCalendar::default();
    let mut storage = SqliteStorage::open_in_memory().unwrap();
    let original = storage
        .insert_entry(&pinned("Before", "2026-05-05T07:00:00Z"), &calendar)
        .unwrap();

    let patch = EntryPatch::new().full_name("After").birth_year(2000);
    let updated = storage.update_entry(&original.id, &patch, &calendar).unwrap();
    assert_eq!(updated.counters, original.counters);
    assert_eq!(updated.created_at, original.created_at);
    assert_eq!(updated.details.full_name, "After");
    assert_eq!(updated.age, calendar.year_of(updated.updated_at) - 2000);

    let reloaded = storage.get_entry(&original.id).unwrap().unwrap();
    assert_eq!(reloaded, updated);

    let missing = storage.update_entry(&Uuid::new_v4(), &patch, &calendar);
    assert!(matches!(missing, Err(RegistryError::NotFound(_))));
}

#[test]
fn list_page_marks_only_the_tail() {
    let calendar = BusinessCalendar::default();
    let mut storage = SqliteStorage::open_in_memory().unwrap();
    let start = utc("2026-05-05T03:00:00Z");
    let mut last = None;
    for i in 0..25 {
        let entry = NewEntry::new(details(&format!("Patient {}", i)))
            .with_created_at(start + Duration::minutes(i));
        last = Some(storage.insert_entry(&entry, &calendar).unwrap());
    }
    let last = last.unwrap();

    let service = RegistrationService::new(storage, calendar);
    let page = service
        .list_filtered(&FilterCriteria::new(), PageRequest::new(1, 10))
        .unwrap();
    assert_eq!(page.total_count, 25);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.entries.len(), 10);
    assert_eq!(page.entries[0].entry.id, last.id);
    assert!(page.entries[0].is_deletable);
    assert!(page.entries[1..].iter().all(|e| !e.is_deletable));

    let page = service
        .list_filtered(&FilterCriteria::new(), PageRequest::new(3, 10))
        .unwrap();
    assert_eq!(page.entries.len(), 5);
    assert!(page.entries.iter().all(|e| !e.is_deletable));
    assert_eq!(page.entries[4].entry.counters.yearly_count, 1);
}

#[test]
fn sql_and_in_memory_filters_agree() {
    let calendar = BusinessCalendar::default();
    let mut storage = SqliteStorage::open_in_memory().unwrap();

    let start = utc("2026-05-09T15:00:00Z");
    let names = ["Шахзода Алиева", "John Carter", "Johan Mirzo", "Malika", "Sardor"];
    let jobs = [
        CodedField::coded("teacher"),
        CodedField::other("Johnson & Co driver"),
        CodedField::coded("doctor"),
        CodedField::default(),
        CodedField::other("Farmer"),
    ];
    for (i, (name, job)) in names.iter().zip(jobs.iter()).enumerate() {
        let mut entry = details(name).with_job(job.clone());
        entry.birth_year = 1970 + (i as i32) * 10;
        entry.gender = if i % 2 == 0 { Gender::Female } else { Gender::Male };
        if i == 1 {
            entry.phone = Some("+998 90 555 00 11".into());
        }
        storage
            .insert_entry(
                &NewEntry::new(entry).with_created_at(start + Duration::hours(i as i64 * 2)),
                &calendar,
            )
            .unwrap();
    }
    let all = storage
        .query(&Predicate::All, SortOrder::Ascending, 0, None)
        .unwrap();

    let cases = vec![
        FilterCriteria {
            search: Some("JOH".into()),
            ..FilterCriteria::default()
        },
        FilterCriteria {
            search: Some("шах".into()),
            ..FilterCriteria::default()
        },
        FilterCriteria {
            search: Some("555".into()),
            ..FilterCriteria::default()
        },
        FilterCriteria {
            created_from: NaiveDate::from_ymd_opt(2026, 5, 10),
            created_to: NaiveDate::from_ymd_opt(2026, 5, 10),
            ..FilterCriteria::default()
        },
        FilterCriteria {
            birth_year_from: Some(1980),
            birth_year_to: Some(2000),
            gender: Some(Gender::Female),
            ..FilterCriteria::default()
        },
        FilterCriteria {
            job: Some("other".into()),
            other_job: Some("farm".into()),
            ..FilterCriteria::default()
        },
        FilterCriteria {
            age_to: Some(40),
            ..FilterCriteria::default()
        },
    ];

    for criteria in cases {
        let predicate = build(&criteria, &calendar);
        let from_sql: Vec<Uuid> = storage
            .query(&predicate, SortOrder::Ascending, 0, None)
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        let in_memory: Vec<Uuid> = all
            .iter()
            .filter(|e| predicate.matches(e))
            .map(|e| e.id)
            .collect();
        assert_eq!(from_sql, in_memory, "criteria {:?}", criteria);
        assert_eq!(storage.count(&predicate).unwrap() as usize, in_memory.len());
    }
}

#[test]
fn search_matches_are_case_insensitive_and_literal() {
    let calendar = BusinessCalendar::default();
    let mut storage = SqliteStorage::open_in_memory().unwrap();
    storage
        .insert_entry(&NewEntry::new(details("JOHN doe")), &calendar)
        .unwrap();
    storage
        .insert_entry(&NewEntry::new(details("Jo.n")), &calendar)
        .unwrap();

    let john = build(
        &FilterCriteria {
            search: Some("john".into()),
            ..FilterCriteria::default()
        },
        &calendar,
    );
    assert_eq!(storage.count(&john).unwrap(), 1);

    let dotted = build(
        &FilterCriteria {
            search: Some("jo.n".into()),
            ..FilterCriteria::default()
        },
        &calendar,
    );
    assert_eq!(storage.count(&dotted).unwrap(), 1);
}

#[test]
fn export_is_oldest_first_and_unpaginated() {
    let calendar = BusinessCalendar::default();
    let mut service = RegistrationService::new(SqliteStorage::open_in_memory().unwrap(), calendar)
        .with_page_size(2);
    let start = utc("2026-07-01T05:00:00Z");
    for i in 0..5 {
        let (_, totals) = service
            .create(
                &NewEntry::new(details(&format!("P{}", i)))
                    .with_created_at(start + Duration::minutes(i)),
            )
            .unwrap();
        assert_eq!(totals.total_count, i as u64 + 1);
    }
    assert_eq!(service.totals().unwrap().total_pages, 3);

    let exported = service.export_filtered(&FilterCriteria::new()).unwrap();
    let yearly: Vec<i64> = exported.iter().map(|e| e.counters.yearly_count).collect();
    assert_eq!(yearly, vec![1, 2, 3, 4, 5]);
}

#[test]
fn service_delete_reports_totals() {
    let calendar = BusinessCalendar::default();
    let mut service = RegistrationService::new(SqliteStorage::open_in_memory().unwrap(), calendar);
    let (first, _) = service.create(&NewEntry::new(details("First"))).unwrap();
    let (second, totals) = service.create(&NewEntry::new(details("Second"))).unwrap();
    assert_eq!(totals.total_count, 2);
    assert_eq!(totals.total_pages, 1);

    assert!(matches!(
        service.delete(&first.id),
        Err(RegistryError::Conflict(_))
    ));
    let totals = service.delete(&second.id).unwrap();
    assert_eq!(totals.total_count, 1);
    assert!(matches!(
        service.get(&second.id),
        Err(RegistryError::NotFound(_))
    ));
}

#[test]
fn backup_is_a_readable_copy() {
    let (dir, path) = file_ledger();
    let calendar = BusinessCalendar::default();
    let mut storage = SqliteStorage::open(&path).unwrap();
    storage
        .insert_entry(&NewEntry::new(details("Backed up")), &calendar)
        .unwrap();

    let backup_path = dir.path().join("backups").join("registry.bak.db");
    storage.backup_to(&backup_path).unwrap();

    let copy = SqliteStorage::open(&backup_path).unwrap();
    assert_eq!(copy.count(&Predicate::All).unwrap(), 1);
    assert_eq!(
        copy.metadata().unwrap().ledger_id,
        storage.metadata().unwrap().ledger_id
    );
    copy.check_integrity().unwrap();
}

#[test]
fn create_refuses_existing_file_and_open_requires_one() {
    let (dir, path) = file_ledger();
    assert!(matches!(
        SqliteStorage::create(&path),
        Err(RegistryError::Storage(_))
    ));
    assert!(matches!(
        SqliteStorage::open(&dir.path().join("missing.db")),
        Err(RegistryError::NotFound(_))
    ));
}

#[test]
fn verify_reports_tampered_counters() {
    let (_dir, path) = file_ledger();
    let calendar = BusinessCalendar::default();
    let mut storage = SqliteStorage::open(&path).unwrap();
    storage
        .insert_entry(&pinned("One", "2026-08-01T05:00:00Z"), &calendar)
        .unwrap();
    let second = storage
        .insert_entry(&pinned("Two", "2026-08-01T05:10:00Z"), &calendar)
        .unwrap();

    let service = RegistrationService::new(storage, calendar);
    assert!(service.verify().unwrap().is_clean());

    set_counters(&path, &second.id, Counters::new(7, 2, 2));
    let report = service.verify().unwrap();
    assert_eq!(report.checked, 2);
    assert_eq!(report.violations.len(), 1);
}

#[test]
fn future_pinned_timestamp_is_rejected() {
    let calendar = BusinessCalendar::default();
    let mut storage = SqliteStorage::open_in_memory().unwrap();

    let later = NewEntry::new(details("Later")).with_created_at(Utc::now() + Duration::days(400));
    let result = storage.insert_entry(&later, &calendar);
    assert!(matches!(result, Err(RegistryError::Validation(_))));
    assert_eq!(storage.count(&Predicate::All).unwrap(), 0);

    let a = storage
        .insert_entry(&NewEntry::new(details("A")), &calendar)
        .unwrap();
    let b = storage
        .insert_entry(&NewEntry::new(details("B")), &calendar)
        .unwrap();
    let now = Utc::now();
    assert!(a.created_at <= now && b.created_at <= now);
    assert_eq!(a.counters, Counters::FIRST);
    assert_eq!(b.counters.film_number, 2);
}

#[test]
fn tail_far_ahead_of_the_clock_blocks_inserts() {
    let (_dir, path) = file_ledger();
    let calendar = BusinessCalendar::default();
    let mut storage = SqliteStorage::open(&path).unwrap();
    let tail = storage
        .insert_entry(&NewEntry::new(details("Tail")), &calendar)
        .unwrap();
    let ahead = (Utc::now() + Duration::days(1)).to_rfc3339_opts(SecondsFormat::Millis, true);
    execute_raw(
        &path,
        "UPDATE entries SET created_at = ?1 WHERE id = ?2",
        &tail.id,
        ahead,
    );

    let result = storage.insert_entry(&NewEntry::new(details("Next")), &calendar);
    assert!(matches!(result, Err(RegistryError::DataIntegrity(_))));
    assert_eq!(storage.count(&Predicate::All).unwrap(), 1);
}

#[test]
fn supplied_birth_year_refreshes_age() {
    let (_dir, path) = file_ledger();
    let calendar = BusinessCalendar::default();
    let mut storage = SqliteStorage::open(&path).unwrap();
    let entry = storage
        .insert_entry(&pinned("Patient", "2026-05-05T07:00:00Z"), &calendar)
        .unwrap();
    execute_raw(&path, "UPDATE entries SET age = ?1 WHERE id = ?2", &entry.id, 1);

    let renamed = storage
        .update_entry(&entry.id, &EntryPatch::new().full_name("Renamed"), &calendar)
        .unwrap();
    assert_eq!(renamed.age, 1);

    let refreshed = storage
        .update_entry(&entry.id, &EntryPatch::new().birth_year(1985), &calendar)
        .unwrap();
    assert_eq!(refreshed.age, calendar.year_of(refreshed.updated_at) - 1985);
    assert_eq!(storage.get_entry(&entry.id).unwrap().unwrap().age, refreshed.age);
}

#[test]
fn counter_snapshot_predicts_the_next_insert() {
    let calendar = BusinessCalendar::default();
    let mut storage = SqliteStorage::open_in_memory().unwrap();
    let empty = storage
        .counter_snapshot(utc("2026-06-01T05:00:00Z"), &calendar)
        .unwrap();
    assert_eq!(empty, CounterSnapshot::default());

    storage
        .insert_entry(&pinned("A", "2026-06-01T05:00:00Z"), &calendar)
        .unwrap();
    let b = storage
        .insert_entry(&pinned("B", "2026-06-01T05:30:00Z"), &calendar)
        .unwrap();

    let next_at = utc("2026-06-01T06:00:00Z");
    let snapshot = storage.counter_snapshot(next_at, &calendar).unwrap();
    assert_eq!(snapshot.ledger_count, 2);
    assert_eq!(snapshot.tail.map(|tail| tail.id), Some(b.id));
    assert_eq!(snapshot.todays_max_daily, Some(2));

    let predicted = assign_counters(&snapshot, next_at, &calendar).unwrap();
    let c = storage
        .insert_entry(&pinned("C", "2026-06-01T06:00:00Z"), &calendar)
        .unwrap();
    assert_eq!(c.counters, predicted);

    let tomorrow = storage
        .counter_snapshot(utc("2026-06-02T05:00:00Z"), &calendar)
        .unwrap();
    assert_eq!(tomorrow.todays_max_daily, None);
}

#[test]
fn tail_deletes_serialise_with_concurrent_creates() {
    let (_dir, path) = file_ledger();
    let creates = 30;
    let delete_attempts = 30;

    let creator = {
        let path = path.clone();
        thread::spawn(move || {
            let calendar = BusinessCalendar::default();
            let mut storage = SqliteStorage::open(&path).unwrap();
            for i in 0..creates {
                storage
                    .insert_entry(&NewEntry::new(details(&format!("Visit {}", i))), &calendar)
                    .unwrap();
            }
        })
    };
    let deleter = {
        let path = path.clone();
        thread::spawn(move || {
            let mut storage = SqliteStorage::open(&path).unwrap();
            let mut deleted = Vec::new();
            for _ in 0..delete_attempts {
                let tail = match storage.current_tail().unwrap() {
                    Some(tail) => tail,
                    None => {
                        thread::yield_now();
                        continue;
                    }
                };
                // A create may land between reading the tail and deleting it.
                match storage.delete_tail_entry(&tail.id) {
                    Ok(()) => deleted.push(tail.id),
                    Err(RegistryError::Conflict(_)) => {}
                    Err(other) => panic!("unexpected delete error: {:?}", other),
                }
            }
            deleted
        })
    };
    creator.join().unwrap();
    let deleted = deleter.join().unwrap();

    let storage = SqliteStorage::open(&path).unwrap();
    let entries = storage
        .query(&Predicate::All, SortOrder::Ascending, 0, None)
        .unwrap();
    assert_eq!(entries.len(), creates - deleted.len());
    for id in &deleted {
        assert!(storage.get_entry(id).unwrap().is_none());
    }

    let films: HashSet<i64> = entries.iter().map(|e| e.counters.film_number).collect();
    assert_eq!(films.len(), entries.len(), "duplicate film numbers");

    // Removing anything but the tail would leave a gap in the walk.
    let report = registry_core::integrity::verify(&entries, &BusinessCalendar::default());
    assert!(report.is_clean(), "{:?}", report.violations);
}
