//! Storage Module
//!
//! Persistent storage layer: fixed-width binary rows in a single file.
//!
//! ## Responsibilities
//! - Persist records as constant-size rows (in-place rewrite, no shifting)
//! - Soft-delete via a trailing liveness flag
//! - Offline compaction ("purge") that reclaims tombstone space
//! - In-memory secondary indexes rebuilt by full scan at startup
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Row 0                                                        │
//! │ ┌────────┬───────────┬───────────┬───────────────┬─────────┐ │
//! │ │ id (4) │ first 120 │ last 120  │ day/month/year│ ...     │ │
//! │ └────────┴───────────┴───────────┴───────────────┴─────────┘ │
//! │ │ height (2) │ money (16) │ gender (1) │ deleted flag (1) │  │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Row 1  (every row is exactly ROW_LEN = 276 bytes)            │
//! ├──────────────────────────────────────────────────────────────┤
//! │ ...                                                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no header, no checksum, and no write-ahead log: a crash in
//! the middle of a row write can leave that row's tail corrupt. This is
//! a deliberate trade of crash-safety for simplicity.

pub mod row;

mod file;
mod memory;
mod metered;

pub use file::{FileStorage, RecordScan};
pub use memory::MemoryStorage;
pub use metered::Metered;

use std::fmt;

use chrono::NaiveDate;

use crate::config::{Config, StorageKind};
use crate::error::Result;
use crate::record::Record;
use crate::snapshot::Snapshot;

/// Alive/deleted row counts from one sequential file pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CabinetStat {
    /// Rows holding current records
    pub alive: usize,

    /// Soft-deleted rows awaiting purge
    pub deleted: usize,
}

impl fmt::Display for CabinetStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} alive, {} deleted", self.alive, self.deleted)
    }
}

/// Outcome of a purge pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeSummary {
    /// Tombstone rows physically removed
    pub purged: usize,

    /// Rows in the file before the pass
    pub total: usize,
}

impl fmt::Display for PurgeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} records were purged", self.purged, self.total)
    }
}

/// The cabinet service contract
///
/// Implemented by [`FileStorage`] (the binary-file engine),
/// [`MemoryStorage`] (volatile alternative), and [`Metered`] (logging
/// wrapper delegating to either). Object-safe so callers can hold a
/// `Box<dyn CabinetService>` chosen at runtime.
pub trait CabinetService {
    /// Validate and store a new record; `DuplicateId` if an alive record
    /// with the same id exists
    fn add_record(&mut self, record: &Record) -> Result<()>;

    /// Validate and rewrite the record with this id in place; `NotFound`
    /// when no row carries the id
    fn edit_record(&mut self, record: &Record) -> Result<()>;

    /// Soft-delete the alive record with this id; `NotFound` when absent
    /// (including a second delete of the same id)
    fn remove_record(&mut self, id: i32) -> Result<()>;

    /// Alive records with this first name (case-insensitive); absent name
    /// yields an empty vector
    fn find_by_first_name(&mut self, name: &str) -> Result<Vec<Record>>;

    /// Alive records with this last name (case-insensitive)
    fn find_by_last_name(&mut self, name: &str) -> Result<Vec<Record>>;

    /// Alive records born on this exact date
    fn find_by_date_of_birth(&mut self, date: NaiveDate) -> Result<Vec<Record>>;

    /// All alive records in storage order
    fn list(&mut self) -> Result<Vec<Record>>;

    /// Alive/deleted counts from storage contents
    fn stat(&mut self) -> Result<CabinetStat>;

    /// Reclaim tombstone space; see [`PurgeSummary`]
    fn purge(&mut self) -> Result<PurgeSummary>;

    /// Export all alive records
    fn make_snapshot(&mut self) -> Result<Snapshot>;

    /// Bulk-load records: overwrite rows whose id already exists (alive
    /// or not), append the rest; returns the affected count.
    ///
    /// Trust boundary: restore skips the validator. Snapshots are taken
    /// at face value, exactly like the import files they come from.
    fn restore(&mut self, snapshot: &Snapshot) -> Result<usize>;
}

/// Open the service described by a [`Config`]
///
/// Picks the storage backend and validation preset, and wraps the result
/// in [`Metered`] when call logging is enabled.
pub fn open(config: &Config) -> Result<Box<dyn CabinetService>> {
    let validator = config.validation.validator();

    match config.storage {
        StorageKind::File => {
            let engine = FileStorage::open(&config.db_path, validator)?;
            if config.log_calls {
                Ok(Box::new(Metered::new(engine)))
            } else {
                Ok(Box::new(engine))
            }
        }
        StorageKind::Memory => {
            let engine = MemoryStorage::new(validator);
            if config.log_calls {
                Ok(Box::new(Metered::new(engine)))
            } else {
                Ok(Box::new(engine))
            }
        }
    }
}
