//! Call logging wrapper
//!
//! Wraps any [`CabinetService`] in an identical contract that logs each
//! call's outcome and elapsed time through `tracing`. One explicit
//! delegation layer; composing `Metered::new(Metered::new(..))` stacks
//! it like any other middleware.

use std::time::Instant;

use chrono::NaiveDate;

use crate::error::Result;
use crate::record::Record;
use crate::snapshot::Snapshot;

use super::{CabinetService, CabinetStat, PurgeSummary};

/// Service wrapper logging every call with its duration
pub struct Metered<S> {
    inner: S,
}

impl<S: CabinetService> Metered<S> {
    /// Wrap a service; the returned value has the identical contract
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Unwrap, returning the inner service
    pub fn into_inner(self) -> S {
        self.inner
    }

    fn timed<T>(&mut self, op: &'static str, call: impl FnOnce(&mut S) -> Result<T>) -> Result<T> {
        let start = Instant::now();
        let result = call(&mut self.inner);
        let elapsed_us = start.elapsed().as_micros() as u64;
        match &result {
            Ok(_) => tracing::debug!(op, elapsed_us, "call completed"),
            Err(e) => tracing::warn!(op, elapsed_us, error = %e, "call failed"),
        }
        result
    }
}

impl<S: CabinetService> CabinetService for Metered<S> {
    fn add_record(&mut self, record: &Record) -> Result<()> {
        self.timed("add_record", |s| s.add_record(record))
    }

    fn edit_record(&mut self, record: &Record) -> Result<()> {
        self.timed("edit_record", |s| s.edit_record(record))
    }

    fn remove_record(&mut self, id: i32) -> Result<()> {
        self.timed("remove_record", |s| s.remove_record(id))
    }

    fn find_by_first_name(&mut self, name: &str) -> Result<Vec<Record>> {
        self.timed("find_by_first_name", |s| s.find_by_first_name(name))
    }

    fn find_by_last_name(&mut self, name: &str) -> Result<Vec<Record>> {
        self.timed("find_by_last_name", |s| s.find_by_last_name(name))
    }

    fn find_by_date_of_birth(&mut self, date: NaiveDate) -> Result<Vec<Record>> {
        self.timed("find_by_date_of_birth", |s| s.find_by_date_of_birth(date))
    }

    fn list(&mut self) -> Result<Vec<Record>> {
        self.timed("list", |s| s.list())
    }

    fn stat(&mut self) -> Result<CabinetStat> {
        self.timed("stat", |s| s.stat())
    }

    fn purge(&mut self) -> Result<PurgeSummary> {
        self.timed("purge", |s| s.purge())
    }

    fn make_snapshot(&mut self) -> Result<Snapshot> {
        self.timed("make_snapshot", |s| s.make_snapshot())
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<usize> {
        self.timed("restore", |s| s.restore(snapshot))
    }
}
