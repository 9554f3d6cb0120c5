//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::domain::config::EfsmlConfig;

// ── Configuration Port ────────────────────────────────────────────────────────

/// Abstracts persistence of the user configuration file.
pub trait ConfigStore {
    /// Load the configuration, falling back to defaults when no file exists.
    fn load(&self) -> Result<EfsmlConfig>;
    /// Persist the configuration.
    fn save(&self, config: &EfsmlConfig) -> Result<()>;
    /// Location of the configuration file.
    fn path(&self) -> Result<PathBuf>;
}

// ── Template Port ─────────────────────────────────────────────────────────────

/// Abstracts reading and writing rendered templates.
pub trait TemplateStore {
    /// Write `contents` to `dir/file_name`, creating `dir` if needed.
    ///
    /// Readers never observe a partially written file.
    fn write(&self, dir: &Path, file_name: &str, contents: &str) -> Result<PathBuf>;
    /// Read a template file as text.
    fn read(&self, path: &Path) -> Result<String>;
}

// ── Code Asset Port ───────────────────────────────────────────────────────────

/// Abstracts fingerprinting of the function code directory.
pub trait CodeFingerprinter {
    /// SHA-256 over the sorted relative paths and contents of every file
    /// under `dir`, or `None` if `dir` does not exist.
    fn fingerprint(&self, dir: &Path) -> Result<Option<String>>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
