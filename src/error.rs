//! Error types for filecab
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using CabinetError
pub type Result<T> = std::result::Result<T, CabinetError>;

/// Unified error type for filecab operations
#[derive(Debug, Error)]
pub enum CabinetError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("record #{0} already exists")]
    DuplicateId(i32),

    #[error("record #{0} not found")]
    NotFound(i32),

    #[error("malformed cabinet file: {0}")]
    MalformedFile(String),

    // -------------------------------------------------------------------------
    // Validation Errors
    // -------------------------------------------------------------------------
    #[error("validation failed: {0}")]
    Validation(String),

    // -------------------------------------------------------------------------
    // Snapshot Errors
    // -------------------------------------------------------------------------
    #[error("snapshot error: {0}")]
    Snapshot(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),
}
