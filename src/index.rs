//! Index Set
//!
//! In-memory secondary indexes mapping record keys to row offsets in the
//! backing file. Pure cache: never persisted, rebuilt by a full file scan
//! at engine startup and maintained incrementally afterwards.
//!
//! ## Invariant
//! Every offset held by any index points at an alive row whose decoded
//! fields match the index key. Deleted rows have no index entries.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::record::Record;

/// The four secondary indexes over the backing file
///
/// Name keys are case-folded, so lookups are case-insensitive. Absent
/// keys yield empty results rather than errors.
#[derive(Debug, Default)]
pub struct IndexSet {
    /// id → offset (unique among alive records)
    by_id: HashMap<i32, u64>,

    /// case-folded first name → offsets
    by_first_name: HashMap<String, Vec<u64>>,

    /// case-folded last name → offsets
    by_last_name: HashMap<String, Vec<u64>>,

    /// date of birth → offsets
    by_date_of_birth: HashMap<NaiveDate, Vec<u64>>,
}

impl IndexSet {
    /// Create an empty index set
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed (alive) records
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// True when nothing is indexed
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Drop every entry (used before a rebuild scan)
    pub fn clear(&mut self) {
        self.by_id.clear();
        self.by_first_name.clear();
        self.by_last_name.clear();
        self.by_date_of_birth.clear();
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Index a record at the given offset
    ///
    /// Multi-value buckets are appended to, never overwritten, so records
    /// sharing a name or birth date coexist.
    pub fn add(&mut self, record: &Record, offset: u64) {
        self.by_id.insert(record.id, offset);
        self.by_first_name
            .entry(fold(&record.first_name))
            .or_default()
            .push(offset);
        self.by_last_name
            .entry(fold(&record.last_name))
            .or_default()
            .push(offset);
        self.by_date_of_birth
            .entry(record.date_of_birth)
            .or_default()
            .push(offset);
    }

    /// Remove the entries pointing at exactly this offset
    ///
    /// Other offsets under the same key stay: a record that shares a name
    /// with the removed one is unaffected.
    pub fn remove(&mut self, record: &Record, offset: u64) {
        if self.by_id.get(&record.id) == Some(&offset) {
            self.by_id.remove(&record.id);
        }
        remove_from_bucket(&mut self.by_first_name, &fold(&record.first_name), offset);
        remove_from_bucket(&mut self.by_last_name, &fold(&record.last_name), offset);
        remove_from_bucket(&mut self.by_date_of_birth, &record.date_of_birth, offset);
    }

    /// Re-point a record from one offset to another (remove + add)
    pub fn reindex(&mut self, record: &Record, old_offset: u64, new_offset: u64) {
        self.remove(record, old_offset);
        self.add(record, new_offset);
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Offset of the alive record with this id, if any
    pub fn offset_by_id(&self, id: i32) -> Option<u64> {
        self.by_id.get(&id).copied()
    }

    /// Offsets of alive records with this first name (case-insensitive)
    pub fn offsets_by_first_name(&self, name: &str) -> Vec<u64> {
        bucket(&self.by_first_name, &fold(name))
    }

    /// Offsets of alive records with this last name (case-insensitive)
    pub fn offsets_by_last_name(&self, name: &str) -> Vec<u64> {
        bucket(&self.by_last_name, &fold(name))
    }

    /// Offsets of alive records born on this date
    pub fn offsets_by_date_of_birth(&self, date: NaiveDate) -> Vec<u64> {
        bucket(&self.by_date_of_birth, &date)
    }
}

/// Case-fold a name key
fn fold(name: &str) -> String {
    name.to_lowercase()
}

/// Copy a bucket out; absent key is an empty vector, never an error
fn bucket<K: std::hash::Hash + Eq>(map: &HashMap<K, Vec<u64>>, key: &K) -> Vec<u64> {
    map.get(key).cloned().unwrap_or_default()
}

/// Drop one exact offset from a bucket, removing the bucket when emptied
fn remove_from_bucket<K: std::hash::Hash + Eq>(
    map: &mut HashMap<K, Vec<u64>>,
    key: &K,
    offset: u64,
) {
    if let Some(offsets) = map.get_mut(key) {
        offsets.retain(|&o| o != offset);
        if offsets.is_empty() {
            map.remove(key);
        }
    }
}
