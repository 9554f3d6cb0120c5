//! Shared mock infrastructure for unit tests.
//!
//! In-memory implementations of the application ports so service tests run
//! without touching the filesystem or the home directory.

#![allow(clippy::expect_used, dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use efsml_cli::application::ports::{
    CodeFingerprinter, ConfigStore, ProgressReporter, TemplateStore,
};
use efsml_cli::domain::config::EfsmlConfig;

// ── Config store ──────────────────────────────────────────────────────────────

/// Config store backed by a `RefCell`; counts saves.
#[derive(Default)]
pub struct MemoryConfigStore {
    pub config: RefCell<EfsmlConfig>,
    pub saves: RefCell<usize>,
}

impl MemoryConfigStore {
    pub fn with(config: EfsmlConfig) -> Self {
        Self {
            config: RefCell::new(config),
            saves: RefCell::new(0),
        }
    }

    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Result<EfsmlConfig> {
        Ok(self.config.borrow().clone())
    }

    fn save(&self, config: &EfsmlConfig) -> Result<()> {
        *self.config.borrow_mut() = config.clone();
        *self.saves.borrow_mut() += 1;
        Ok(())
    }

    fn path(&self) -> Result<PathBuf> {
        Ok(PathBuf::from("/mem/config.yaml"))
    }
}

/// Config store whose file cannot be parsed.
pub struct BrokenConfigStore;

impl ConfigStore for BrokenConfigStore {
    fn load(&self) -> Result<EfsmlConfig> {
        anyhow::bail!("cannot parse /mem/config.yaml")
    }

    fn save(&self, _: &EfsmlConfig) -> Result<()> {
        anyhow::bail!("not expected in this test")
    }

    fn path(&self) -> Result<PathBuf> {
        Ok(PathBuf::from("/mem/config.yaml"))
    }
}

// ── Template store + fingerprinter ────────────────────────────────────────────

/// In-memory files plus a canned fingerprint.
#[derive(Default)]
pub struct MemoryFs {
    pub files: RefCell<BTreeMap<PathBuf, String>>,
    pub fingerprint: Option<String>,
    pub fail_fingerprint: bool,
}

impl MemoryFs {
    pub fn with_fingerprint(fingerprint: &str) -> Self {
        Self {
            fingerprint: Some(fingerprint.to_string()),
            ..Self::default()
        }
    }

    pub fn insert(&self, path: &str, contents: &str) {
        self.files
            .borrow_mut()
            .insert(PathBuf::from(path), contents.to_string());
    }

    pub fn get(&self, path: &Path) -> Option<String> {
        self.files.borrow().get(path).cloned()
    }
}

impl TemplateStore for MemoryFs {
    fn write(&self, dir: &Path, file_name: &str, contents: &str) -> Result<PathBuf> {
        let path = dir.join(file_name);
        self.files
            .borrow_mut()
            .insert(path.clone(), contents.to_string());
        Ok(path)
    }

    fn read(&self, path: &Path) -> Result<String> {
        self.get(path)
            .ok_or_else(|| anyhow::anyhow!("reading file {}: not found", path.display()))
    }
}

impl CodeFingerprinter for MemoryFs {
    fn fingerprint(&self, _dir: &Path) -> Result<Option<String>> {
        if self.fail_fingerprint {
            anyhow::bail!("permission denied");
        }
        Ok(self.fingerprint.clone())
    }
}

// ── Reporter ──────────────────────────────────────────────────────────────────

/// Records every progress event as `(kind, message)`.
#[derive(Default)]
pub struct RecordingReporter {
    pub events: RefCell<Vec<(&'static str, String)>>,
}

impl RecordingReporter {
    pub fn messages(&self, kind: &str) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.events.borrow_mut().push(("step", message.to_string()));
    }

    fn success(&self, message: &str) {
        self.events
            .borrow_mut()
            .push(("success", message.to_string()));
    }

    fn warn(&self, message: &str) {
        self.events.borrow_mut().push(("warn", message.to_string()));
    }
}
