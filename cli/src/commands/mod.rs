//! Command implementations

pub mod config;
pub mod plan;
pub mod synth;
pub mod validate;
pub mod version;

use clap::Args;

use crate::domain::config::StackOverrides;

/// Stack inputs shared by every command that declares the stack.
///
/// Flags win over environment variables, which win over the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct StackArgs {
    /// Resource name prefix
    #[arg(long, env = "EFSML_PREFIX")]
    pub prefix: Option<String>,

    /// Deployment stage (e.g. dev, prod)
    #[arg(long, env = "EFSML_STAGE")]
    pub stage: Option<String>,

    /// Packages installed onto the file system, passed to `pip3 install`
    #[arg(long, env = "EFSML_INSTALL_PACKAGES")]
    pub install_packages: Option<String>,
}

impl StackArgs {
    /// Convert to domain overrides.
    #[must_use]
    pub fn overrides(&self) -> StackOverrides {
        StackOverrides {
            prefix: self.prefix.clone(),
            stage: self.stage.clone(),
            install_packages: self.install_packages.clone(),
        }
    }
}
