//! Tests for purge compaction
//!
//! These tests verify:
//! - Space reclamation and file truncation
//! - The alive record multiset is preserved
//! - Idempotence (second purge is a no-op)
//! - Index consistency after rows are relocated
//! - The spec'd end-to-end scenario

use std::path::PathBuf;

use chrono::NaiveDate;
use tempfile::TempDir;

use filecab::storage::row::ROW_LEN;
use filecab::validation::AcceptAll;
use filecab::{CabinetService, FileStorage, Money, Record};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_cabinet() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cabinet.db");
    (temp_dir, path)
}

fn open(path: &PathBuf) -> FileStorage {
    FileStorage::open(path, Box::new(AcceptAll)).unwrap()
}

fn record(id: i32) -> Record {
    Record {
        id,
        first_name: format!("First{}", id),
        last_name: format!("Last{}", id),
        date_of_birth: NaiveDate::from_ymd_opt(1980 + id % 30, 1 + (id as u32 % 12), 1).unwrap(),
        height: 150 + (id % 50) as i16,
        money: Money::from_major(id as i64 * 10),
        gender: 'F',
    }
}

fn file_len(path: &PathBuf) -> u64 {
    std::fs::metadata(path).unwrap().len()
}

fn sorted_by_id(mut records: Vec<Record>) -> Vec<Record> {
    records.sort_by_key(|r| r.id);
    records
}

// =============================================================================
// Basic Reclamation
// =============================================================================

#[test]
fn purge_truncates_one_row_per_tombstone() {
    let (_temp, path) = setup_cabinet();
    let mut cabinet = open(&path);
    for id in 1..=5 {
        cabinet.add_record(&record(id)).unwrap();
    }
    cabinet.remove_record(2).unwrap();
    cabinet.remove_record(4).unwrap();

    let summary = cabinet.purge().unwrap();

    assert_eq!(summary.purged, 2);
    assert_eq!(summary.total, 5);
    assert_eq!(file_len(&path), 3 * ROW_LEN as u64);
}

#[test]
fn purge_on_a_clean_file_does_nothing() {
    let (_temp, path) = setup_cabinet();
    let mut cabinet = open(&path);
    for id in 1..=3 {
        cabinet.add_record(&record(id)).unwrap();
    }

    let summary = cabinet.purge().unwrap();

    assert_eq!(summary.purged, 0);
    assert_eq!(summary.total, 3);
    assert_eq!(file_len(&path), 3 * ROW_LEN as u64);
}

#[test]
fn purge_empties_a_fully_deleted_file() {
    let (_temp, path) = setup_cabinet();
    let mut cabinet = open(&path);
    for id in 1..=4 {
        cabinet.add_record(&record(id)).unwrap();
    }
    for id in 1..=4 {
        cabinet.remove_record(id).unwrap();
    }

    let summary = cabinet.purge().unwrap();

    assert_eq!(summary.purged, 4);
    assert_eq!(file_len(&path), 0);
    assert!(cabinet.list().unwrap().is_empty());
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn purge_preserves_the_alive_record_multiset() {
    let (_temp, path) = setup_cabinet();
    let mut cabinet = open(&path);
    for id in 1..=10 {
        cabinet.add_record(&record(id)).unwrap();
    }
    // Interleave deletions at both ends and the middle
    for id in [1, 5, 6, 10] {
        cabinet.remove_record(id).unwrap();
    }

    let before = sorted_by_id(cabinet.list().unwrap());
    cabinet.purge().unwrap();
    let after = sorted_by_id(cabinet.list().unwrap());

    assert_eq!(before, after);
}

#[test]
fn purge_is_idempotent() {
    let (_temp, path) = setup_cabinet();
    let mut cabinet = open(&path);
    for id in 1..=6 {
        cabinet.add_record(&record(id)).unwrap();
    }
    for id in [2, 3] {
        cabinet.remove_record(id).unwrap();
    }

    let first = cabinet.purge().unwrap();
    assert_eq!(first.purged, 2);

    let second = cabinet.purge().unwrap();
    assert_eq!(second.purged, 0);
    assert_eq!(second.total, 4);
    assert_eq!(file_len(&path), 4 * ROW_LEN as u64);
}

#[test]
fn indexes_follow_relocated_rows() {
    let (_temp, path) = setup_cabinet();
    let mut cabinet = open(&path);
    for id in 1..=5 {
        cabinet.add_record(&record(id)).unwrap();
    }
    // Delete the first rows so trailing rows must move down
    cabinet.remove_record(1).unwrap();
    cabinet.remove_record(2).unwrap();

    cabinet.purge().unwrap();

    // Relocated records must still resolve through every index
    for id in [3, 4, 5] {
        let expected = record(id);
        assert_eq!(
            cabinet.find_by_first_name(&expected.first_name).unwrap(),
            vec![expected.clone()],
            "first-name index lost record {}",
            id
        );
        assert_eq!(
            cabinet.find_by_last_name(&expected.last_name).unwrap(),
            vec![expected.clone()],
            "last-name index lost record {}",
            id
        );
        assert_eq!(
            cabinet
                .find_by_date_of_birth(expected.date_of_birth)
                .unwrap(),
            vec![expected],
            "date index lost record {}",
            id
        );
    }
}

#[test]
fn purged_file_survives_a_reopen() {
    let (_temp, path) = setup_cabinet();
    {
        let mut cabinet = open(&path);
        for id in 1..=5 {
            cabinet.add_record(&record(id)).unwrap();
        }
        cabinet.remove_record(3).unwrap();
        cabinet.purge().unwrap();
    }

    let mut reopened = open(&path);
    assert_eq!(
        sorted_by_id(reopened.list().unwrap()),
        vec![record(1), record(2), record(4), record(5)]
    );
    let stat = reopened.stat().unwrap();
    assert_eq!((stat.alive, stat.deleted), (4, 0));
}

#[test]
fn stat_tracks_deletes_before_and_after_purge() {
    let (_temp, path) = setup_cabinet();
    let mut cabinet = open(&path);
    for id in 1..=7 {
        cabinet.add_record(&record(id)).unwrap();
    }
    for id in [1, 4, 7] {
        cabinet.remove_record(id).unwrap();
    }

    let stat = cabinet.stat().unwrap();
    assert_eq!((stat.alive, stat.deleted), (4, 3));

    cabinet.purge().unwrap();

    let stat = cabinet.stat().unwrap();
    assert_eq!((stat.alive, stat.deleted), (4, 0));
}

// =============================================================================
// End-to-End Scenario
// =============================================================================

#[test]
fn scenario_add_delete_purge() {
    let (_temp, path) = setup_cabinet();
    let mut cabinet = open(&path);

    let ann = Record {
        id: 1,
        first_name: "Ann".to_string(),
        last_name: "Smith".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        height: 170,
        money: Money::from_major(100),
        gender: 'F',
    };
    let bob = Record {
        id: 2,
        first_name: "Bob".to_string(),
        last_name: "Jones".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1985, 5, 5).unwrap(),
        height: 180,
        money: Money::from_major(200),
        gender: 'M',
    };
    let cid = Record {
        id: 3,
        first_name: "Cid".to_string(),
        last_name: "Lee".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1992, 3, 3).unwrap(),
        height: 160,
        money: Money::from_major(50),
        gender: 'M',
    };

    cabinet.add_record(&ann).unwrap();
    cabinet.add_record(&bob).unwrap();
    cabinet.add_record(&cid).unwrap();

    cabinet.remove_record(2).unwrap();

    let stat = cabinet.stat().unwrap();
    assert_eq!((stat.alive, stat.deleted), (2, 1));
    assert!(cabinet.find_by_last_name("Jones").unwrap().is_empty());

    let summary = cabinet.purge().unwrap();
    assert_eq!(summary.to_string(), "1 of 3 records were purged");

    assert_eq!(
        sorted_by_id(cabinet.list().unwrap()),
        vec![ann.clone(), cid.clone()]
    );

    let stat = cabinet.stat().unwrap();
    assert_eq!((stat.alive, stat.deleted), (2, 0));
}
