//! # filecab
//!
//! A file-cabinet record store with:
//! - Fixed-width binary rows in a single backing file
//! - In-memory secondary indexes (id, first name, last name, birth date)
//! - Soft-delete tombstones plus an offline compaction pass ("purge")
//! - Pluggable validation rule sets and CSV/XML snapshot codecs
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CLI / caller                            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  CabinetService trait
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │        Metered (optional logging/timing wrapper)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────┐
//!   │ FileStorage │          │MemoryStorage │
//!   │  (core)     │          │ (volatile)   │
//!   └──────┬──────┘          └──────────────┘
//!          │
//!   ┌──────▼──────┐   ┌───────────┐
//!   │  Row Codec  │   │ Index Set │
//!   │ (276 bytes) │   │ (4 maps)  │
//!   └─────────────┘   └───────────┘
//! ```
//!
//! The storage engine is single-threaded and synchronous; it assumes
//! exclusive ownership of the backing file. There is no write-ahead log:
//! a crash in the middle of a row write can leave that row's tail
//! corrupt. Soft delete plus offline purge is the deliberate trade of
//! crash-safety for simplicity.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod index;
pub mod storage;
pub mod validation;
pub mod snapshot;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CabinetError, Result};
pub use config::{Config, StorageKind, ValidationPreset};
pub use record::{Money, Record};
pub use snapshot::Snapshot;
pub use storage::{
    open, CabinetService, CabinetStat, FileStorage, MemoryStorage, Metered, PurgeSummary,
};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of filecab
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
