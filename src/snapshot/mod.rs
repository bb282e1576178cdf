//! Snapshot Module
//!
//! Bulk import/export: a snapshot is an ordered sequence of records,
//! produced by `make_snapshot` and consumed by `restore`. Two textual
//! codecs are provided, CSV and a small attribute-based XML dialect.

mod csv;
mod xml;

use crate::record::Record;

/// An ordered set of exported records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    records: Vec<Record>,
}

impl Snapshot {
    /// Wrap records into a snapshot, preserving their order
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// The records, in export order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Consume the snapshot, yielding its records
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the snapshot holds nothing
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
