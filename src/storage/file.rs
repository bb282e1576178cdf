//! File-backed storage engine
//!
//! The core of the crate: persists records as fixed-width binary rows in
//! a single file, keeps the [`IndexSet`] as a pure in-memory cache over
//! that file, and reclaims tombstone space with an offline purge pass.
//!
//! ## Concurrency Model
//! Single-threaded and synchronous. The engine assumes exclusive
//! ownership of the backing file for its lifetime; every operation takes
//! `&mut self`, so the borrow checker rules out iterating a scan while a
//! mutation runs. The file handle is released when the engine drops, on
//! every exit path.
//!
//! ## Failure Model
//! A row that fails to decode aborts the operation in progress with
//! `MalformedFile`; there is no partial-row recovery and no retry. Bulk
//! operations (purge, restore) do not roll back partial progress.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::{CabinetError, Result};
use crate::index::IndexSet;
use crate::record::Record;
use crate::snapshot::Snapshot;
use crate::validation::RecordValidator;

use super::row::{self, RowState, ROW_LEN};
use super::{CabinetService, CabinetStat, PurgeSummary};

/// The file-backed cabinet engine
pub struct FileStorage {
    /// Path of the backing file (kept for diagnostics)
    path: PathBuf,

    /// Backing file, owned exclusively for the engine's lifetime
    file: File,

    /// In-memory indexes over alive rows
    index: IndexSet,

    /// Rule set applied before add/edit (restore bypasses it)
    validator: Box<dyn RecordValidator>,
}

impl FileStorage {
    /// Open or create a cabinet file and rebuild the indexes
    ///
    /// The file length must be a whole number of rows; anything else is
    /// a `MalformedFile` error. An empty path is a `Config` error.
    pub fn open(path: impl AsRef<Path>, validator: Box<dyn RecordValidator>) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(CabinetError::Config(
                "cabinet file path must not be empty".to_string(),
            ));
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;

        let mut engine = Self {
            path: path.to_path_buf(),
            file,
            index: IndexSet::new(),
            validator,
        };
        engine.rebuild_index()?;

        Ok(engine)
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Lazy Scans
    // =========================================================================

    /// Sequential scan over every row (alive and deleted) in file order
    ///
    /// Lazy: rows are read as the iterator advances. The `&mut self`
    /// borrow keeps mutations out until the scan is dropped.
    pub fn scan(&mut self) -> Result<RecordScan<'_>> {
        let len = self.aligned_len()?;
        Ok(RecordScan {
            file: &mut self.file,
            offset: 0,
            len,
        })
    }

    /// Lazy sequence of alive records satisfying a predicate
    ///
    /// This is the fallback path for arbitrary queries no index covers.
    pub fn records<'a, P>(
        &'a mut self,
        mut predicate: P,
    ) -> Result<impl Iterator<Item = Result<Record>> + 'a>
    where
        P: FnMut(&Record) -> bool + 'a,
    {
        let scan = self.scan()?;
        Ok(scan.filter_map(move |item| match item {
            Ok((_, record, RowState::Alive)) => {
                if predicate(&record) {
                    Some(Ok(record))
                } else {
                    None
                }
            }
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        }))
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Rebuild every index with one sequential pass over the file
    fn rebuild_index(&mut self) -> Result<()> {
        self.index.clear();

        let len = self.aligned_len()?;
        let mut rows = 0u64;
        let mut offset = 0u64;
        let mut buf = [0u8; ROW_LEN];

        self.file.seek(SeekFrom::Start(0))?;
        while offset < len {
            self.file.read_exact(&mut buf)?;
            let (record, state) = row::decode(&buf)?;
            if state == RowState::Alive {
                self.index.add(&record, offset);
            }
            rows += 1;
            offset += ROW_LEN as u64;
        }

        tracing::info!(
            path = %self.path.display(),
            rows,
            alive = self.index.len(),
            "indexes rebuilt"
        );
        Ok(())
    }

    /// File length, verified to be a whole number of rows
    fn aligned_len(&self) -> Result<u64> {
        let len = self.file.metadata()?.len();
        if len % ROW_LEN as u64 != 0 {
            return Err(CabinetError::MalformedFile(format!(
                "file length {} is not a multiple of the row size {}",
                len, ROW_LEN
            )));
        }
        Ok(len)
    }

    /// Seek and decode the row at an offset
    fn read_row_at(&mut self, offset: u64) -> Result<(Record, RowState)> {
        let mut buf = [0u8; ROW_LEN];
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(&mut buf)?;
        row::decode(&buf)
    }

    /// Overwrite the row at an offset (fixed width keeps neighbors safe)
    fn write_row_at(&mut self, offset: u64, bytes: &[u8; ROW_LEN]) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(bytes)?;
        Ok(())
    }

    /// Flip only the liveness byte of the row at an offset
    fn set_row_state(&mut self, offset: u64, state: RowState) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(offset + ROW_LEN as u64 - 1))?;
        self.file.write_all(&[state.as_byte()])?;
        Ok(())
    }

    /// Full linear scan for any row carrying this id, alive or not
    ///
    /// Defensive fallback for operations that bypass the id index (a
    /// restore can overwrite rows the index has not seen). Prefers an
    /// alive match when both an alive and a tombstoned row share the id.
    fn scan_by_id(&mut self, id: i32) -> Result<Option<(u64, Record, RowState)>> {
        let mut fallback: Option<(u64, Record, RowState)> = None;
        for item in self.scan()? {
            let (offset, record, state) = item?;
            if record.id != id {
                continue;
            }
            if state == RowState::Alive {
                return Ok(Some((offset, record, state)));
            }
            if fallback.is_none() {
                fallback = Some((offset, record, state));
            }
        }
        Ok(fallback)
    }

    /// Append an encoded row at end-of-file, returning its offset
    fn append_row(&mut self, record: &Record) -> Result<u64> {
        let offset = self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(&row::encode(record))?;
        Ok(offset)
    }

    /// Read the records stored at the given offsets
    fn read_records_at(&mut self, offsets: Vec<u64>) -> Result<Vec<Record>> {
        let mut out = Vec::with_capacity(offsets.len());
        for offset in offsets {
            let (record, _) = self.read_row_at(offset)?;
            out.push(record);
        }
        Ok(out)
    }
}

impl CabinetService for FileStorage {
    fn add_record(&mut self, record: &Record) -> Result<()> {
        self.validator.validate(record)?;

        if self.index.offset_by_id(record.id).is_some() {
            return Err(CabinetError::DuplicateId(record.id));
        }

        // Grows the file by exactly one row
        let offset = self.append_row(record)?;
        self.index.add(record, offset);

        tracing::debug!(id = record.id, offset, "record added");
        Ok(())
    }

    fn edit_record(&mut self, record: &Record) -> Result<()> {
        self.validator.validate(record)?;

        // Id index first; full linear scan as the index-miss fallback
        let offset = match self.index.offset_by_id(record.id) {
            Some(offset) => offset,
            None => match self.scan_by_id(record.id)? {
                Some((offset, _, _)) => offset,
                None => return Err(CabinetError::NotFound(record.id)),
            },
        };

        // Full remove+reindex so the name/date indexes never go stale
        let (old, old_state) = self.read_row_at(offset)?;
        self.write_row_at(offset, &row::encode(record))?;
        if old_state == RowState::Alive {
            self.index.remove(&old, offset);
        }
        self.index.add(record, offset);

        tracing::debug!(id = record.id, offset, "record edited");
        Ok(())
    }

    fn remove_record(&mut self, id: i32) -> Result<()> {
        // The id index only tracks alive rows, so a repeated delete of
        // the same id fails here instead of flipping the flag twice.
        let offset = self
            .index
            .offset_by_id(id)
            .ok_or(CabinetError::NotFound(id))?;

        let (record, _) = self.read_row_at(offset)?;
        self.set_row_state(offset, RowState::Deleted)?;
        self.index.remove(&record, offset);

        tracing::debug!(id, offset, "record soft-deleted");
        Ok(())
    }

    fn find_by_first_name(&mut self, name: &str) -> Result<Vec<Record>> {
        let offsets = self.index.offsets_by_first_name(name);
        self.read_records_at(offsets)
    }

    fn find_by_last_name(&mut self, name: &str) -> Result<Vec<Record>> {
        let offsets = self.index.offsets_by_last_name(name);
        self.read_records_at(offsets)
    }

    fn find_by_date_of_birth(&mut self, date: NaiveDate) -> Result<Vec<Record>> {
        let offsets = self.index.offsets_by_date_of_birth(date);
        self.read_records_at(offsets)
    }

    fn list(&mut self) -> Result<Vec<Record>> {
        self.records(|_| true)?.collect()
    }

    fn stat(&mut self) -> Result<CabinetStat> {
        // One sequential pass over the file contents. The indexes only
        // track alive rows, so the tombstone count must come from here.
        let mut alive = 0;
        let mut deleted = 0;
        for item in self.scan()? {
            let (_, _, state) = item?;
            match state {
                RowState::Alive => alive += 1,
                RowState::Deleted => deleted += 1,
            }
        }
        Ok(CabinetStat { alive, deleted })
    }

    fn purge(&mut self) -> Result<PurgeSummary> {
        let total = (self.aligned_len()? / ROW_LEN as u64) as usize;
        let mut purged = 0;

        // Each iteration eliminates exactly one tombstone, so the loop
        // is bounded by the initial tombstone count.
        loop {
            // Locate the first tombstone and the last alive row
            let mut hole: Option<u64> = None;
            let mut tail: Option<(u64, Record)> = None;
            for item in self.scan()? {
                let (offset, record, state) = item?;
                match state {
                    RowState::Deleted => {
                        if hole.is_none() {
                            hole = Some(offset);
                        }
                    }
                    RowState::Alive => tail = Some((offset, record)),
                }
            }

            let Some(hole) = hole else { break };
            let len = self.aligned_len()?;

            match tail {
                Some((tail_offset, record)) if tail_offset > hole => {
                    // Relocate the last alive row into the vacated slot.
                    // Never moves an alive row to a higher offset.
                    let mut buf = [0u8; ROW_LEN];
                    self.file.seek(SeekFrom::Start(tail_offset))?;
                    self.file.read_exact(&mut buf)?;
                    self.write_row_at(hole, &buf)?;
                    self.index.reindex(&record, tail_offset, hole);

                    // The vacated slot becomes a tombstone; the file's
                    // final row is one and gets truncated away.
                    self.set_row_state(tail_offset, RowState::Deleted)?;
                    self.file.set_len(len - ROW_LEN as u64)?;
                }
                _ => {
                    // Every row past the last alive one is a tombstone;
                    // nothing to move, drop the trailing row.
                    self.file.set_len(len - ROW_LEN as u64)?;
                }
            }
            purged += 1;
        }

        let summary = PurgeSummary { purged, total };
        tracing::info!(purged, total, "purge finished");
        Ok(summary)
    }

    fn make_snapshot(&mut self) -> Result<Snapshot> {
        Ok(Snapshot::new(self.list()?))
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<usize> {
        let mut affected = 0;

        for record in snapshot.records() {
            // Overwrite any row carrying the id (alive or not), found by
            // full scan; append when the id is new to the file.
            match self.scan_by_id(record.id)? {
                Some((offset, old, old_state)) => {
                    self.write_row_at(offset, &row::encode(record))?;
                    if old_state == RowState::Alive {
                        self.index.remove(&old, offset);
                    }
                    self.index.add(record, offset);
                }
                None => {
                    let offset = self.append_row(record)?;
                    self.index.add(record, offset);
                }
            }
            affected += 1;
        }

        tracing::info!(affected, "snapshot restored");
        Ok(affected)
    }
}

/// Lazy sequential cursor over the rows of the backing file
///
/// Yields `(offset, record, state)` for every row. Holds the engine's
/// file borrow, so the engine cannot mutate until the scan is dropped.
pub struct RecordScan<'a> {
    file: &'a mut File,
    offset: u64,
    len: u64,
}

impl Iterator for RecordScan<'_> {
    type Item = Result<(u64, Record, RowState)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.len {
            return None;
        }

        let mut buf = [0u8; ROW_LEN];
        if let Err(e) = self.file.seek(SeekFrom::Start(self.offset)) {
            return Some(Err(e.into()));
        }
        if let Err(e) = self.file.read_exact(&mut buf) {
            return Some(Err(e.into()));
        }

        let offset = self.offset;
        self.offset += ROW_LEN as u64;

        match row::decode(&buf) {
            Ok((record, state)) => Some(Ok((offset, record, state))),
            Err(e) => Some(Err(e)),
        }
    }
}
