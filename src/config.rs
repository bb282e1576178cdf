//! Configuration for filecab
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::validation::{RecordValidator, RuleSet};

/// Main configuration for a cabinet instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path of the binary cabinet file (ignored by the memory backend)
    pub db_path: PathBuf,

    /// Which backend to run on
    pub storage: StorageKind,

    // -------------------------------------------------------------------------
    // Validation Configuration
    // -------------------------------------------------------------------------
    /// Rule-set preset applied before add/edit
    pub validation: ValidationPreset,

    // -------------------------------------------------------------------------
    // Observability Configuration
    // -------------------------------------------------------------------------
    /// Wrap the service so every call is logged with its duration
    pub log_calls: bool,
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// Fixed-width binary rows in a single file
    File,

    /// Volatile in-memory map
    Memory,
}

/// Validation rule-set presets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPreset {
    /// Strict profile (see [`RuleSet::default_rules`])
    Default,

    /// Relaxed profile (see [`RuleSet::custom_rules`])
    Custom,
}

impl ValidationPreset {
    /// Build the validator for this preset
    pub fn validator(self) -> Box<dyn RecordValidator> {
        match self {
            ValidationPreset::Default => Box::new(RuleSet::default_rules()),
            ValidationPreset::Custom => Box::new(RuleSet::custom_rules()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./cabinet-records.db"),
            storage: StorageKind::File,
            validation: ValidationPreset::Default,
            log_calls: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the cabinet file path
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.db_path = path.into();
        self
    }

    /// Set the storage backend
    pub fn storage(mut self, kind: StorageKind) -> Self {
        self.config.storage = kind;
        self
    }

    /// Set the validation preset
    pub fn validation(mut self, preset: ValidationPreset) -> Self {
        self.config.validation = preset;
        self
    }

    /// Enable or disable per-call logging
    pub fn log_calls(mut self, enabled: bool) -> Self {
        self.config.log_calls = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
