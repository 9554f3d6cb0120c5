//! Build script that populates the shared file system.
//!
//! CodeBuild mounts the file system at `$CODEBUILD_EFS1` (identifier
//! `efs1`). The script downloads the model, creates a virtualenv and
//! installs the ML packages into it, then hands ownership to the POSIX
//! identity the access point uses.

use serde::Serialize;

/// Packages installed when no override is configured.
pub const DEFAULT_INSTALL_PACKAGES: &str = "tensorflow";

/// Model artifact unpacked into `lambda/model`.
pub const MODEL_URL: &str =
    "https://storage.googleapis.com/tfhub-modules/google/openimages_v4/ssd/mobilenet_v2/1.tar.gz";

/// Environment variable CodeBuild sets to the `efs1` mount point.
pub const MOUNT_ENV: &str = "$CODEBUILD_EFS1";

/// Owner of everything written under `lambda/`.
pub const POSIX_ID: u32 = 1000;

/// `buildspec.yml` document, serialised as JSON.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BuildSpec {
    pub version: String,
    pub phases: Phases,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Phases {
    pub build: Phase,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Phase {
    pub commands: Vec<String>,
}

impl BuildSpec {
    /// The install script for the given package override.
    #[must_use]
    pub fn install(install_packages: Option<&str>) -> Self {
        let packages = install_packages
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map_or_else(|| DEFAULT_INSTALL_PACKAGES.to_string(), quote_packages);
        let root = format!("{MOUNT_ENV}/lambda");

        let commands = vec![
            "echo 'Downloading and copying model...'".to_string(),
            format!("mkdir -p {root}/model"),
            format!("curl {MODEL_URL} --output /tmp/1.tar.gz"),
            format!("tar zxf /tmp/1.tar.gz -C {root}/model"),
            "echo 'Installing virtual environment...'".to_string(),
            format!("mkdir -p {root}"),
            format!("python3 -m venv {root}/tensorflow"),
            "echo 'Installing Tensorflow...'".to_string(),
            format!("source {root}/tensorflow/bin/activate && pip3 install {packages}"),
            "echo 'Changing folder permissions...'".to_string(),
            format!("chown -R {POSIX_ID}:{POSIX_ID} {root}/"),
        ];

        Self {
            version: "0.2".to_string(),
            phases: Phases {
                build: Phase { commands },
            },
        }
    }

    /// The `pip3 install` command line.
    #[must_use]
    pub fn install_command(&self) -> Option<&str> {
        self.phases
            .build
            .commands
            .iter()
            .map(String::as_str)
            .find(|c| c.contains("pip3 install"))
    }

    /// Pretty JSON with two-space indentation, as CodeBuild receives it.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn to_source(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Shell-quote each whitespace-separated requirement so specifiers such as
/// `tensorflow>=2.3` reach pip as one argument.
fn quote_packages(list: &str) -> String {
    list.split_whitespace()
        .map(shell_words::quote)
        .collect::<Vec<_>>()
        .join(" ")
}
