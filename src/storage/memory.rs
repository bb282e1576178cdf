//! In-memory storage engine
//!
//! Volatile alternative to [`super::FileStorage`]: same service
//! contract, no binary format, no tombstones. Useful for tests and for
//! running the CLI without touching disk.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::error::{CabinetError, Result};
use crate::record::Record;
use crate::snapshot::Snapshot;
use crate::validation::RecordValidator;

use super::{CabinetService, CabinetStat, PurgeSummary};

/// Map-backed cabinet engine, ordered by record id
pub struct MemoryStorage {
    records: BTreeMap<i32, Record>,
    validator: Box<dyn RecordValidator>,
}

impl MemoryStorage {
    /// Create an empty in-memory cabinet
    pub fn new(validator: Box<dyn RecordValidator>) -> Self {
        Self {
            records: BTreeMap::new(),
            validator,
        }
    }

    fn find_by<P>(&self, predicate: P) -> Vec<Record>
    where
        P: Fn(&Record) -> bool,
    {
        self.records
            .values()
            .filter(|r| predicate(r))
            .cloned()
            .collect()
    }
}

impl CabinetService for MemoryStorage {
    fn add_record(&mut self, record: &Record) -> Result<()> {
        self.validator.validate(record)?;
        if self.records.contains_key(&record.id) {
            return Err(CabinetError::DuplicateId(record.id));
        }
        self.records.insert(record.id, record.clone());
        Ok(())
    }

    fn edit_record(&mut self, record: &Record) -> Result<()> {
        self.validator.validate(record)?;
        if !self.records.contains_key(&record.id) {
            return Err(CabinetError::NotFound(record.id));
        }
        self.records.insert(record.id, record.clone());
        Ok(())
    }

    fn remove_record(&mut self, id: i32) -> Result<()> {
        // No tombstones here: removal frees the slot immediately
        self.records
            .remove(&id)
            .map(|_| ())
            .ok_or(CabinetError::NotFound(id))
    }

    fn find_by_first_name(&mut self, name: &str) -> Result<Vec<Record>> {
        let needle = name.to_lowercase();
        Ok(self.find_by(|r| r.first_name.to_lowercase() == needle))
    }

    fn find_by_last_name(&mut self, name: &str) -> Result<Vec<Record>> {
        let needle = name.to_lowercase();
        Ok(self.find_by(|r| r.last_name.to_lowercase() == needle))
    }

    fn find_by_date_of_birth(&mut self, date: NaiveDate) -> Result<Vec<Record>> {
        Ok(self.find_by(|r| r.date_of_birth == date))
    }

    fn list(&mut self) -> Result<Vec<Record>> {
        Ok(self.records.values().cloned().collect())
    }

    fn stat(&mut self) -> Result<CabinetStat> {
        Ok(CabinetStat {
            alive: self.records.len(),
            deleted: 0,
        })
    }

    fn purge(&mut self) -> Result<PurgeSummary> {
        // Nothing is ever tombstoned, so there is nothing to reclaim
        Ok(PurgeSummary {
            purged: 0,
            total: self.records.len(),
        })
    }

    fn make_snapshot(&mut self) -> Result<Snapshot> {
        Ok(Snapshot::new(self.records.values().cloned().collect()))
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<usize> {
        // Trusts the snapshot: no validation, overwrite by id
        for record in snapshot.records() {
            self.records.insert(record.id, record.clone());
        }
        Ok(snapshot.len())
    }
}
