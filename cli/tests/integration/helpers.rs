//! Shared helpers: every test runs the binary inside its own temp directory
//! with an isolated config file and no inherited stack overrides.

#![allow(clippy::expect_used, dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// A temp working directory with its own config path.
pub struct Sandbox {
    pub dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("config").join("config.yaml")
    }

    /// Create `lambda/` with a handler so synth can fingerprint it.
    pub fn with_code_dir(self) -> Self {
        let code = self.path().join("lambda");
        std::fs::create_dir_all(&code).expect("mkdir lambda");
        std::fs::write(code.join("main.py"), "def lambda_handler(event, context):\n    return {}\n")
            .expect("write handler");
        self
    }

    /// `efsml` with colors off, `EFSML_CONFIG` pointed into the sandbox and
    /// the sandbox as working directory.
    pub fn efsml(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("efsml"));
        cmd.current_dir(self.path())
            .env("NO_COLOR", "1")
            .env("EFSML_CONFIG", self.config_path())
            .env_remove("EFSML_PREFIX")
            .env_remove("EFSML_STAGE")
            .env_remove("EFSML_INSTALL_PACKAGES")
            .env_remove("EFSML_LOG");
        cmd
    }

    /// Parse the stdout of a successful run as JSON.
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.efsml().args(args).output().expect("run efsml");
        assert!(
            output.status.success(),
            "efsml {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("stdout is JSON")
    }
}
